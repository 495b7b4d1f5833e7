//! Undo/Redo command stack.
//!
//! Every document transition is wrapped in a reversible [`Command`].
//! A command is built against the document it will run on and captures
//! whatever prior state its inverse needs: removed subtrees, the old
//! layer values of an update, the old sibling index of a reorder. Running
//! the inverse never recomputes anything from the current document, so
//! undo and redo are exact.
//!
//! Commands that mint ids (duplicate) mint them at construction, which
//! makes redo reproduce the same ids.

use ds_core::document::{
    self, Document, ReorderDirection, clone_subtree, detach_layer, insert_subtree, move_layer_to,
    replace_layer, with_selection,
};
use ds_core::id::LayerId;
use ds_core::model::{Layer, LayerPatch};
use std::sync::Arc;

/// One primitive, exactly invertible step.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Insert a subtree (top node first) at `index` in `parent`.
    Insert {
        parent: LayerId,
        index: usize,
        layers: Vec<Layer>,
    },
    /// Remove a subtree regardless of lock flags.
    Detach { id: LayerId },
    /// Swap in a whole layer value, keeping its stored children.
    Replace { layer: Arc<Layer> },
    /// Move a layer to `index` among its siblings.
    Move { id: LayerId, index: usize },
    /// Put ids back into whatever is selected now, each at its old
    /// position in the selection.
    Reselect { entries: Vec<(usize, LayerId)> },
}

impl Edit {
    fn apply(&self, doc: &Document) -> Document {
        match self {
            Edit::Insert {
                parent,
                index,
                layers,
            } => insert_subtree(doc, *parent, *index, layers.clone()),
            Edit::Detach { id } => detach_layer(doc, *id),
            Edit::Replace { layer } => replace_layer(doc, Arc::clone(layer)),
            Edit::Move { id, index } => move_layer_to(doc, *id, *index),
            Edit::Reselect { entries } => {
                let mut ids = doc.selection().to_vec();
                for &(position, id) in entries {
                    if !ids.contains(&id) {
                        ids.insert(position.min(ids.len()), id);
                    }
                }
                with_selection(doc, &ids)
            }
        }
    }
}

/// A reversible document transition: forward edits plus the edits that
/// undo them, in the order they must run.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    description: String,
    forward: Vec<Edit>,
    inverse: Vec<Edit>,
}

impl Command {
    /// Build from raw edit lists. `inverse` must restore exactly the
    /// document `forward` was applied to.
    pub fn from_edits(description: impl Into<String>, forward: Vec<Edit>, inverse: Vec<Edit>) -> Self {
        Self {
            description: description.into(),
            forward,
            inverse,
        }
    }

    /// Append `layer` under `parent` (default: root). `None` when the
    /// mutator would no-op.
    pub fn add_layer(doc: &Document, layer: Layer, parent: Option<LayerId>) -> Option<Self> {
        let id = layer.id;
        let parent = parent.unwrap_or(doc.root_id());
        let index = doc.children_of(parent).len();
        let next = document::add_layer(doc, layer.clone(), Some(parent));
        if !next.contains(id) || doc.contains(id) {
            return None;
        }
        let description = format!("Add {}", layer.name);
        Some(Self::from_edits(
            description,
            vec![Edit::Insert {
                parent,
                index,
                layers: vec![layer],
            }],
            vec![Edit::Detach { id }],
        ))
    }

    /// Remove a subtree. Captures the subtree, its position and the
    /// selected ids inside it so undo restores all three. Selection made
    /// after the removal is kept on undo.
    pub fn remove_layer(doc: &Document, id: LayerId) -> Option<Self> {
        let (parent, index) = doc.position_of(id)?;
        let next = document::remove_layer(doc, id);
        if next.contains(id) {
            return None;
        }
        let subtree = doc.subtree_ids(id);
        let layers: Vec<Layer> = subtree
            .iter()
            .filter_map(|i| doc.get(*i).cloned())
            .collect();
        let pruned: Vec<(usize, LayerId)> = doc
            .selection()
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, sel)| subtree.contains(sel))
            .collect();
        let name = doc.get(id).map(|l| l.name.clone()).unwrap_or_default();
        Some(Self::from_edits(
            format!("Remove {name}"),
            vec![Edit::Detach { id }],
            vec![
                Edit::Insert {
                    parent,
                    index,
                    layers,
                },
                Edit::Reselect { entries: pruned },
            ],
        ))
    }

    /// Merge `patch` onto a layer. `None` when nothing would change.
    pub fn update_layer(doc: &Document, id: LayerId, patch: &LayerPatch) -> Option<Self> {
        let before = doc.get_shared(id)?;
        let next = document::update_layer(doc, id, patch);
        let after = next.get_shared(id)?;
        if Arc::ptr_eq(&before, &after) || before == after {
            return None;
        }
        Some(Self::from_edits(
            format!("Update {}", before.name),
            vec![Edit::Replace { layer: after }],
            vec![Edit::Replace { layer: before }],
        ))
    }

    /// Move a layer among its siblings. `None` at either end of the order
    /// or for locked layers.
    pub fn reorder_layer(doc: &Document, id: LayerId, direction: ReorderDirection) -> Option<Self> {
        let (_, from) = doc.position_of(id)?;
        let next = document::reorder_layer(doc, id, direction);
        let (_, to) = next.position_of(id)?;
        if from == to {
            return None;
        }
        let name = doc.get(id).map(|l| l.name.clone()).unwrap_or_default();
        Some(Self::from_edits(
            format!("Reorder {name}"),
            vec![Edit::Move { id, index: to }],
            vec![Edit::Move { id, index: from }],
        ))
    }

    /// Deep-duplicate a subtree directly after the source. Fresh ids are
    /// minted here, once.
    pub fn duplicate_layer(doc: &Document, id: LayerId) -> Option<Self> {
        let (parent, index) = doc.position_of(id)?;
        let clones = clone_subtree(doc, id)?;
        let top = clones.first()?.id;
        let name = doc.get(id).map(|l| l.name.clone()).unwrap_or_default();
        Some(Self::from_edits(
            format!("Duplicate {name}"),
            vec![Edit::Insert {
                parent,
                index: index + 1,
                layers: clones,
            }],
            vec![Edit::Detach { id: top }],
        ))
    }

    /// Fold commands into one history entry. Each command must have been
    /// built against the document left by the one before it.
    pub fn batch(description: impl Into<String>, commands: Vec<Command>) -> Self {
        let mut forward = Vec::new();
        let mut inverse = Vec::new();
        for cmd in &commands {
            forward.extend(cmd.forward.iter().cloned());
        }
        for cmd in commands.into_iter().rev() {
            inverse.extend(cmd.inverse);
        }
        Self::from_edits(description, forward, inverse)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn forward(&self) -> &[Edit] {
        &self.forward
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Run the forward edits.
    #[must_use]
    pub fn execute(&self, doc: &Document) -> Document {
        self.forward.iter().fold(doc.clone(), |d, e| e.apply(&d))
    }

    /// Run the inverse edits.
    #[must_use]
    pub fn revert(&self, doc: &Document) -> Document {
        self.inverse.iter().fold(doc.clone(), |d, e| e.apply(&d))
    }
}

/// Manages the current document plus undo/redo stacks.
#[derive(Debug, Clone)]
pub struct CommandStack {
    document: Document,
    /// The document `past` replays from. Advances when the oldest entry
    /// is dropped past `max_depth`.
    origin: Document,
    past: Vec<Command>,
    future: Vec<Command>,
    /// Maximum undo depth (0 = unlimited).
    max_depth: usize,
}

impl CommandStack {
    pub fn new(document: Document) -> Self {
        Self::with_max_depth(document, 0)
    }

    pub fn with_max_depth(document: Document, max_depth: usize) -> Self {
        Self {
            origin: document.clone(),
            document,
            past: Vec::new(),
            future: Vec::new(),
            max_depth,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn origin(&self) -> &Document {
        &self.origin
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn past(&self) -> &[Command] {
        &self.past
    }

    pub fn future(&self) -> &[Command] {
        &self.future
    }

    /// Apply `cmd`, push it onto the undo stack, and clear redo.
    pub fn execute(&mut self, cmd: Command) {
        self.document = cmd.execute(&self.document);
        log::debug!("execute: {}", cmd.description());
        self.past.push(cmd);
        if self.max_depth > 0 && self.past.len() > self.max_depth {
            let oldest = self.past.remove(0);
            self.origin = oldest.execute(&self.origin);
        }

        // Clear redo stack on new action
        self.future.clear();
    }

    /// Undo the last command. Returns its description, or `None` at the
    /// bottom of history.
    pub fn undo(&mut self) -> Option<String> {
        let cmd = self.past.pop()?;
        self.document = cmd.revert(&self.document);
        let desc = cmd.description().to_string();
        log::debug!("undo: {desc}");
        self.future.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command.
    pub fn redo(&mut self) -> Option<String> {
        let cmd = self.future.pop()?;
        self.document = cmd.execute(&self.document);
        let desc = cmd.description().to_string();
        log::debug!("redo: {desc}");
        self.past.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Replace the selection without recording history. Selection is
    /// view state, so it is carried onto the origin too.
    pub fn set_selection(&mut self, ids: &[LayerId]) {
        self.document = with_selection(&self.document, ids);
        self.origin = with_selection(&self.origin, ids);
    }

    /// Re-run `past` from the origin. Equals the current document.
    pub fn replay(&self) -> Document {
        let replayed = self
            .past
            .iter()
            .fold(self.origin.clone(), |d, cmd| cmd.execute(&d));
        with_selection(&replayed, self.document.selection())
    }
}
