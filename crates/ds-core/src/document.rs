//! The design document and its pure mutators.
//!
//! A [`Document`] is an immutable value: every mutator takes `&Document`
//! and returns a new one. Layers are stored behind `Arc`, so the new
//! document shares every untouched layer with the old one and cloning a
//! document never deep-copies layer data.
//!
//! Tree structure lives only in the containers' ordered `children` lists
//! inside `layers_by_id`. There are no parent back-pointers; parents are
//! found by lookup.
//!
//! The mutators never fail. Bad ids or structurally invalid requests
//! return the input document unchanged.

use crate::id::{DocumentId, LayerId};
use crate::model::{Color, Layer, LayerPatch, Paint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

// ─── Config ───────────────────────────────────────────────────────────────

/// Settings for a new document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub dpi: f32,
    pub bleed_margin: Option<f32>,
    pub safe_area_margin: Option<f32>,
    /// Name given to the root frame.
    pub root_name: String,
    /// Root frame background. `None` leaves the frame without fills.
    pub background: Option<Color>,
    /// Tool-specific record copied onto the document.
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1080.0,
            canvas_height: 1080.0,
            dpi: 72.0,
            bleed_margin: None,
            safe_area_margin: None,
            root_name: "Canvas".into(),
            background: Some(Color::WHITE),
            meta: BTreeMap::new(),
        }
    }
}

// ─── Document ─────────────────────────────────────────────────────────────

/// Ordered list of selected layer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSelection {
    pub ids: Vec<LayerId>,
}

/// Direction for [`reorder_layer`]. Sibling order is back-to-front:
/// index 0 is the bottom of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// One step toward the front.
    Up,
    /// One step toward the back.
    Down,
    /// To the front (last sibling).
    Top,
    /// To the back (first sibling).
    Bottom,
}

/// The full editable design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub dpi: f32,
    pub bleed_margin: Option<f32>,
    pub safe_area_margin: Option<f32>,
    layers_by_id: HashMap<LayerId, Arc<Layer>>,
    root_frame_id: LayerId,
    selection: DocumentSelection,
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl Document {
    /// Look up a layer by id.
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers_by_id.get(&id).map(Arc::as_ref)
    }

    /// The shared handle of a layer, for callers that keep it around.
    pub fn get_shared(&self, id: LayerId) -> Option<Arc<Layer>> {
        self.layers_by_id.get(&id).cloned()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers_by_id.contains_key(&id)
    }

    pub fn root_id(&self) -> LayerId {
        self.root_frame_id
    }

    /// The root frame. Every well-formed document has one.
    pub fn root(&self) -> Option<&Layer> {
        self.get(self.root_frame_id)
    }

    /// Number of layers, root included.
    pub fn len(&self) -> usize {
        self.layers_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers_by_id.len() <= 1
    }

    /// All layers in unspecified order. Use [`Document::walk`] for
    /// document order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers_by_id.values().map(Arc::as_ref)
    }

    pub fn layers_by_id(&self) -> &HashMap<LayerId, Arc<Layer>> {
        &self.layers_by_id
    }

    pub fn selection(&self) -> &[LayerId] {
        &self.selection.ids
    }

    /// Ordered children of a container, or an empty slice.
    pub fn children_of(&self, id: LayerId) -> &[LayerId] {
        self.get(id).and_then(Layer::children).unwrap_or(&[])
    }

    /// The container listing `id` as a child.
    pub fn parent_of(&self, id: LayerId) -> Option<LayerId> {
        self.layers_by_id
            .values()
            .find(|l| l.children().is_some_and(|c| c.contains(&id)))
            .map(|l| l.id)
    }

    /// Parent id and position among its siblings.
    pub fn position_of(&self, id: LayerId) -> Option<(LayerId, usize)> {
        let parent = self.parent_of(id)?;
        let index = self.children_of(parent).iter().position(|c| *c == id)?;
        Some((parent, index))
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: LayerId, descendant: LayerId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut seen = HashSet::new();
        let mut current = descendant;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor {
                return true;
            }
            if !seen.insert(parent) {
                break;
            }
            current = parent;
        }
        false
    }

    /// Ids of the subtree rooted at `id`, pre-order, `id` first.
    /// Empty if `id` does not resolve.
    pub fn subtree_ids(&self, id: LayerId) -> Vec<LayerId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        let mut seen = HashSet::new();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children_of(next).iter().rev().copied());
        }
        out
    }

    /// Every layer reachable from the root, pre-order, back-to-front
    /// within each container. The root comes first.
    pub fn walk(&self) -> impl Iterator<Item = &Layer> {
        self.subtree_ids(self.root_frame_id)
            .into_iter()
            .filter_map(move |id| self.get(id))
    }

    // ── private helpers used by the mutators ──

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers_by_id.get_mut(&id).map(Arc::make_mut)
    }

    fn prune_selection(&mut self) {
        let layers = &self.layers_by_id;
        self.selection.ids.retain(|id| layers.contains_key(id));
    }
}

// ─── Factories ───────────────────────────────────────────────────────────

/// Build an empty document with one root frame sized to the canvas.
#[must_use]
pub fn create_document(config: &DocumentConfig) -> Document {
    let mut root = Layer::frame(config.canvas_width, config.canvas_height).named(&config.root_name);
    if let Some(fills) = root.fills_mut() {
        *fills = config.background.map(Paint::solid).into_iter().collect();
    }
    let root_id = root.id;

    let mut layers_by_id = HashMap::new();
    layers_by_id.insert(root_id, Arc::new(root));

    Document {
        id: DocumentId::fresh(),
        canvas_width: config.canvas_width,
        canvas_height: config.canvas_height,
        dpi: config.dpi,
        bleed_margin: config.bleed_margin,
        safe_area_margin: config.safe_area_margin,
        layers_by_id,
        root_frame_id: root_id,
        selection: DocumentSelection::default(),
        meta: config.meta.clone(),
    }
}

// ─── Mutators ────────────────────────────────────────────────────────────

/// Append `layer` at the end of `parent`'s children (default: root).
///
/// No-op if the parent does not resolve to a container, if the id is
/// already taken, or if `layer` itself lists children (use
/// [`insert_subtree`] for whole subtrees). Ignores `locked` on the parent.
#[must_use]
pub fn add_layer(doc: &Document, layer: Layer, parent: Option<LayerId>) -> Document {
    if layer.children().is_some_and(|c| !c.is_empty()) {
        log::debug!("add_layer: {} carries children, ignored", layer.id);
        return doc.clone();
    }
    let parent = parent.unwrap_or(doc.root_frame_id);
    let index = doc.children_of(parent).len();
    insert_subtree(doc, parent, index, vec![layer])
}

/// Remove a layer and every descendant.
///
/// No-op if `id` is the root, does not resolve, or the subtree holds a
/// `locked` layer. Removed ids are dropped from the selection.
#[must_use]
pub fn remove_layer(doc: &Document, id: LayerId) -> Document {
    if id == doc.root_frame_id || !doc.contains(id) {
        return doc.clone();
    }
    let doomed = doc.subtree_ids(id);
    if doomed.iter().any(|d| doc.get(*d).is_some_and(|l| l.locked)) {
        log::debug!("remove_layer: subtree of {id} holds a locked layer");
        return doc.clone();
    }
    detach_subtree(doc, id, &doomed)
}

/// Shallow-merge `patch` onto a layer. No-op if `id` does not resolve.
///
/// Enforces the lock flag: on a `locked` layer the structural fields
/// (`transform`) are dropped and only cosmetic fields apply. The `locked`
/// flag itself is cosmetic, so a layer can always be unlocked.
#[must_use]
pub fn update_layer(doc: &Document, id: LayerId, patch: &LayerPatch) -> Document {
    let Some(layer) = doc.get(id) else {
        return doc.clone();
    };
    let effective = if layer.locked && patch.is_structural() {
        log::debug!("update_layer: {id} is locked, structural fields dropped");
        patch.clone().cosmetic_only()
    } else {
        patch.clone()
    };
    if effective.is_empty() {
        return doc.clone();
    }

    let mut next = doc.clone();
    if let Some(layer) = next.layer_mut(id) {
        effective.merge_into(layer);
    }
    next
}

/// Move a layer among its siblings. No-op at either end of the order,
/// for the root, and for `locked` layers.
#[must_use]
pub fn reorder_layer(doc: &Document, id: LayerId, direction: ReorderDirection) -> Document {
    if doc.get(id).is_none_or(|l| l.locked) {
        return doc.clone();
    }
    let Some((parent, from)) = doc.position_of(id) else {
        return doc.clone();
    };
    let last = doc.children_of(parent).len() - 1;
    let to = match direction {
        ReorderDirection::Up => (from + 1).min(last),
        ReorderDirection::Down => from.saturating_sub(1),
        ReorderDirection::Top => last,
        ReorderDirection::Bottom => 0,
    };
    move_layer_to(doc, id, to)
}

/// Deep-clone the subtree at `id`, giving every cloned node a fresh id,
/// and insert the clone directly after the source.
///
/// The top clone is renamed `"<name> copy"`. No-op for the root or an
/// unresolved id.
#[must_use]
pub fn duplicate_layer(doc: &Document, id: LayerId) -> Document {
    let Some((parent, index)) = doc.position_of(id) else {
        return doc.clone();
    };
    match clone_subtree(doc, id) {
        Some(clones) => insert_subtree(doc, parent, index + 1, clones),
        None => doc.clone(),
    }
}

/// The subtree at `id`, re-id'd, top node first, ready for
/// [`insert_subtree`]. Every node (not just the top one) gets a fresh
/// id, so duplicated groups never alias the originals.
pub fn clone_subtree(doc: &Document, id: LayerId) -> Option<Vec<Layer>> {
    if id == doc.root_frame_id {
        return None;
    }
    let ids = doc.subtree_ids(id);
    if ids.is_empty() {
        return None;
    }

    let mut mapping = HashMap::with_capacity(ids.len());
    for old in &ids {
        let prefix = doc.get(*old).map_or("layer", Layer::kind_tag);
        mapping.insert(*old, LayerId::fresh(prefix));
    }

    let mut clones = Vec::with_capacity(ids.len());
    for old in &ids {
        let Some(source) = doc.get(*old) else {
            continue;
        };
        let mut copy = source.clone();
        copy.id = mapping[old];
        if let Some(children) = copy.children_mut() {
            for child in children.iter_mut() {
                if let Some(new) = mapping.get(child) {
                    *child = *new;
                }
            }
        }
        clones.push(copy);
    }
    if let Some(top) = clones.first_mut() {
        top.name = format!("{} copy", top.name);
    }
    Some(clones)
}

// ─── History-level helpers ───────────────────────────────────────────────
//
// These restore exact prior states for undo/redo. They keep the tree
// invariants but do not consult the `locked` flag.

/// Insert a pre-built subtree (top node first; the rest are reachable
/// through the top node's children lists) at `index` in `parent`.
///
/// No-op if the parent is not a container, a subtree id already exists,
/// or `layers` is empty. `index` is clamped to the child count.
#[must_use]
pub fn insert_subtree(doc: &Document, parent: LayerId, index: usize, layers: Vec<Layer>) -> Document {
    let Some(top) = layers.first().map(|l| l.id) else {
        return doc.clone();
    };
    if !doc.get(parent).is_some_and(Layer::is_container) {
        log::warn!("insert_subtree: parent {parent} is not a container");
        return doc.clone();
    }
    let mut incoming = HashSet::with_capacity(layers.len());
    for layer in &layers {
        if doc.contains(layer.id) || !incoming.insert(layer.id) {
            log::warn!("insert_subtree: id {} already in use", layer.id);
            return doc.clone();
        }
    }

    let mut next = doc.clone();
    for mut layer in layers {
        layer.set_opacity(layer.opacity);
        next.layers_by_id.insert(layer.id, Arc::new(layer));
    }
    if let Some(children) = next.layer_mut(parent).and_then(Layer::children_mut) {
        let at = index.min(children.len());
        children.insert(at, top);
    }
    next
}

/// Move `id` to position `index` among its current siblings (clamped).
#[must_use]
pub fn move_layer_to(doc: &Document, id: LayerId, index: usize) -> Document {
    let Some((parent, from)) = doc.position_of(id) else {
        return doc.clone();
    };
    let last = doc.children_of(parent).len() - 1;
    let to = index.min(last);
    if to == from {
        return doc.clone();
    }
    let mut next = doc.clone();
    if let Some(children) = next.layer_mut(parent).and_then(Layer::children_mut) {
        let child = children.remove(from);
        children.insert(to, child);
    }
    next
}

/// Remove a subtree without consulting `locked`.
#[must_use]
pub fn detach_layer(doc: &Document, id: LayerId) -> Document {
    if id == doc.root_frame_id || !doc.contains(id) {
        return doc.clone();
    }
    let doomed = doc.subtree_ids(id);
    detach_subtree(doc, id, &doomed)
}

/// Swap in a whole layer value for the entry with the same id.
///
/// The stored children list is kept, so a replacement can never re-shape
/// the tree. No-op if the id does not resolve.
#[must_use]
pub fn replace_layer(doc: &Document, layer: Arc<Layer>) -> Document {
    let Some(current) = doc.get(layer.id) else {
        return doc.clone();
    };
    let mut layer = layer;
    if current.children() != layer.children() {
        let keep = current.children().map(<[LayerId]>::to_vec);
        let owned = Arc::make_mut(&mut layer);
        if let (Some(slot), Some(keep)) = (owned.children_mut(), keep) {
            *slot = keep;
        }
    }
    let mut next = doc.clone();
    next.layers_by_id.insert(layer.id, layer);
    next
}

/// Replace the selection, dropping unknown and repeated ids.
#[must_use]
pub fn with_selection(doc: &Document, ids: &[LayerId]) -> Document {
    let mut seen = HashSet::new();
    let ids: Vec<LayerId> = ids
        .iter()
        .copied()
        .filter(|id| doc.contains(*id) && seen.insert(*id))
        .collect();
    if ids == doc.selection.ids {
        return doc.clone();
    }
    let mut next = doc.clone();
    next.selection.ids = ids;
    next
}

fn detach_subtree(doc: &Document, id: LayerId, doomed: &[LayerId]) -> Document {
    let parent = doc.parent_of(id);
    let mut next = doc.clone();
    for d in doomed {
        next.layers_by_id.remove(d);
    }
    if let Some(children) = parent
        .and_then(|p| next.layer_mut(p))
        .and_then(Layer::children_mut)
    {
        children.retain(|c| *c != id);
    }
    next.prune_selection();
    next
}
