//! Editing session: the one value a UI or automation client talks to.
//!
//! Composes the command stack, the selection, and the lock registry.
//! Every document change goes through the stack, so manual edits and
//! applied patches share one linear history. Selection and locks are not
//! history.

use crate::commands::{Command, CommandStack};
use crate::intent::{EditIntent, apply_intents};
use crate::inventory::{InventoryEntry, build_inventory};
use crate::patch::{PatchOp, PatchResult, RevisionScope, apply_patch};
use crate::registry::{LockRegistry, Selection};
use ds_core::document::{Document, DocumentConfig, ReorderDirection, create_document};
use ds_core::id::LayerId;
use ds_core::model::{Layer, LayerPatch};

/// Session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Maximum undo depth (0 = unlimited).
    pub max_history: usize,
    /// Used by [`EditSession::new`] for the initial document.
    pub document: DocumentConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: 0,
            document: DocumentConfig::default(),
        }
    }
}

pub struct EditSession {
    stack: CommandStack,
    selection: Selection,
    locks: LockRegistry,
    config: SessionConfig,
}

impl EditSession {
    /// Start from an empty document built from `config.document`.
    pub fn new(config: SessionConfig) -> Self {
        let doc = create_document(&config.document);
        Self::from_document(doc, config)
    }

    /// Start from an existing document. Its selection is adopted.
    pub fn from_document(doc: Document, config: SessionConfig) -> Self {
        let mut selection = Selection::default();
        selection.select(doc.selection());
        Self {
            stack: CommandStack::with_max_depth(doc, config.max_history),
            selection,
            locks: LockRegistry::new(),
            config,
        }
    }

    pub fn document(&self) -> &Document {
        self.stack.document()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &CommandStack {
        &self.stack
    }

    // ── history ──

    /// Run a command as one history entry.
    pub fn execute(&mut self, cmd: Command) {
        self.stack.execute(cmd);
        self.sync_selection();
    }

    fn execute_if(&mut self, cmd: Option<Command>) -> bool {
        match cmd {
            Some(cmd) => {
                self.execute(cmd);
                true
            }
            None => false,
        }
    }

    /// Append a layer under `parent` (default: root). Returns `false`
    /// when the add was a no-op.
    pub fn add_layer(&mut self, layer: Layer, parent: Option<LayerId>) -> bool {
        let cmd = Command::add_layer(self.document(), layer, parent);
        self.execute_if(cmd)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let cmd = Command::remove_layer(self.document(), id);
        self.execute_if(cmd)
    }

    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        let cmd = Command::update_layer(self.document(), id, patch);
        self.execute_if(cmd)
    }

    pub fn reorder_layer(&mut self, id: LayerId, direction: ReorderDirection) -> bool {
        let cmd = Command::reorder_layer(self.document(), id, direction);
        self.execute_if(cmd)
    }

    /// Duplicate a subtree. Returns the id of the new top layer.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        let cmd = Command::duplicate_layer(self.document(), id)?;
        self.execute(cmd);
        let (parent, index) = self.document().position_of(id)?;
        self.document().children_of(parent).get(index + 1).copied()
    }

    pub fn undo(&mut self) -> Option<String> {
        let desc = self.stack.undo()?;
        self.sync_selection();
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        let desc = self.stack.redo()?;
        self.sync_selection();
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        self.stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stack.can_redo()
    }

    // ── selection ──

    pub fn selection(&self) -> &[LayerId] {
        self.selection.ids()
    }

    pub fn select(&mut self, ids: &[LayerId]) {
        self.selection.select(ids);
        self.write_selection();
    }

    pub fn extend_selection(&mut self, ids: &[LayerId]) {
        self.selection.extend(ids);
        self.write_selection();
    }

    pub fn toggle_selection(&mut self, id: LayerId) {
        self.selection.toggle(id);
        self.write_selection();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.write_selection();
    }

    /// Push the registry's selection into the document, without history.
    fn write_selection(&mut self) {
        self.selection.prune(self.stack.document());
        self.stack.set_selection(self.selection.ids());
    }

    /// Pull the document's selection after a history transition
    /// (removal prunes it, undo of a removal restores it).
    fn sync_selection(&mut self) {
        self.selection.select(self.stack.document().selection());
    }

    // ── locks ──

    /// Lock a property path on a layer. Locks on layers that are later
    /// removed are kept, so they still apply if the removal is undone.
    pub fn lock(&mut self, id: LayerId, path: &str) -> bool {
        self.locks.lock(id, path)
    }

    pub fn unlock(&mut self, id: LayerId, path: &str) -> bool {
        self.locks.unlock(id, path)
    }

    pub fn unlock_all(&mut self, id: LayerId) {
        self.locks.unlock_all(id);
    }

    pub fn locked_paths(&self, id: LayerId) -> &[String] {
        self.locks.locked_paths(id)
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    // ── revision edits ──

    /// Validate `ops` against the current document and, if anything
    /// changes, push the resulting command as one history entry.
    pub fn apply_patch(&mut self, ops: &[PatchOp], scope: &RevisionScope, description: &str) -> PatchResult {
        let result = apply_patch(self.document(), ops, &self.locks, scope, description);
        if let Some(cmd) = &result.command {
            self.execute(cmd.clone());
        }
        result
    }

    /// Lower `intents` against the current document and apply them as
    /// one patch.
    pub fn apply_intents(
        &mut self,
        intents: &[EditIntent],
        scope: &RevisionScope,
        description: &str,
    ) -> PatchResult {
        let result = apply_intents(self.document(), intents, &self.locks, scope, description);
        if let Some(cmd) = &result.command {
            self.execute(cmd.clone());
        }
        result
    }

    /// Editable values of every tagged layer, minus locked paths.
    pub fn inventory(&self) -> Vec<InventoryEntry> {
        build_inventory(self.document(), &self.locks)
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
