//! Selection and locked-path registry.
//!
//! Neither is document content: changing them never creates a history
//! entry, and undo/redo never touches them.

use ds_core::document::Document;
use ds_core::id::LayerId;
use ds_core::model::Layer;
use ds_core::path::{PropertyPath, canonical_segments, is_prefix_of};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Selection ───────────────────────────────────────────────────────────

/// Ordered set of selected layers. Order is selection order, which batch
/// operations (align, distribute) use as their reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<LayerId>,
}

impl Selection {
    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Replace the selection.
    pub fn select(&mut self, ids: &[LayerId]) {
        self.ids.clear();
        self.extend(ids);
    }

    /// Add ids not already selected, keeping order.
    pub fn extend(&mut self, ids: &[LayerId]) {
        for id in ids {
            if !self.ids.contains(id) {
                self.ids.push(*id);
            }
        }
    }

    /// Deselect if selected, otherwise append.
    pub fn toggle(&mut self, id: LayerId) {
        if let Some(pos) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer resolve in `doc`. Returns whether anything
    /// was dropped.
    pub fn prune(&mut self, doc: &Document) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| doc.contains(*id));
        self.ids.len() != before
    }
}

// ─── Locks ───────────────────────────────────────────────────────────────

/// Per-layer property paths that automated edits must not touch.
///
/// A lock on a path also covers every path below it (`fill` covers
/// `fill.color.r`), and `*` covers everything. Paths are stored as given
/// and compared in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockRegistry {
    paths: HashMap<LayerId, SmallVec<[String; 2]>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `path` on `id`. Returns `false` if it was already locked
    /// under an equivalent spelling.
    pub fn lock(&mut self, id: LayerId, path: &str) -> bool {
        let canonical = lock_segments(path);
        let entry = self.paths.entry(id).or_default();
        if entry.iter().any(|p| lock_segments(p) == canonical) {
            return false;
        }
        entry.push(path.trim().to_string());
        true
    }

    /// Remove a lock. Returns whether one was removed.
    pub fn unlock(&mut self, id: LayerId, path: &str) -> bool {
        let canonical = lock_segments(path);
        let Some(entry) = self.paths.get_mut(&id) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|p| lock_segments(p) != canonical);
        let removed = entry.len() != before;
        if entry.is_empty() {
            self.paths.remove(&id);
        }
        removed
    }

    /// Remove every lock on `id`.
    pub fn unlock_all(&mut self, id: LayerId) {
        self.paths.remove(&id);
    }

    /// Locked paths of one layer, as given.
    pub fn locked_paths(&self, id: LayerId) -> &[String] {
        self.paths.get(&id).map(|p| p.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Layers with at least one lock.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.paths.keys().copied()
    }

    /// The lock that blocks writing `path` on `layer`, if any. A write is
    /// blocked when it lands at, below or above a locked path, so locking
    /// `fill.color` also guards `fill` and `fills`. A layer with its
    /// `locked` flag set implicitly locks `transform`.
    pub fn blocking_lock(&self, layer: &Layer, path: &PropertyPath) -> Option<String> {
        if layer.locked && path.is_structural() {
            return Some("transform".to_string());
        }
        let target = path.segments();
        self.locked_paths(layer.id)
            .iter()
            .find(|lock| {
                let lock = lock_segments(lock);
                is_prefix_of(&lock, &target) || is_prefix_of(&target, &lock)
            })
            .cloned()
    }

    /// Forget locks on layers that no longer resolve in `doc`.
    pub fn prune(&mut self, doc: &Document) {
        self.paths.retain(|id, _| doc.contains(*id));
    }
}

impl From<HashMap<LayerId, Vec<String>>> for LockRegistry {
    fn from(map: HashMap<LayerId, Vec<String>>) -> Self {
        let mut registry = LockRegistry::new();
        for (id, paths) in map {
            for path in paths {
                registry.lock(id, &path);
            }
        }
        registry
    }
}

/// Canonical segments of a lock path. Unparseable paths still lock their
/// literal dotted spelling.
fn lock_segments(path: &str) -> Vec<String> {
    canonical_segments(path).unwrap_or_else(|err| {
        log::warn!("lock path not canonical: {err}");
        path.trim().split('.').map(str::to_string).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_core::model::ShapeKind;
    use pretty_assertions::assert_eq;

    fn path(p: &str) -> PropertyPath {
        PropertyPath::parse(p).unwrap()
    }

    #[test]
    fn selection_keeps_order_and_uniqueness() {
        let (a, b, c) = (
            LayerId::intern("sel_a"),
            LayerId::intern("sel_b"),
            LayerId::intern("sel_c"),
        );
        let mut sel = Selection::default();
        sel.select(&[b, a, b]);
        assert_eq!(sel.ids(), &[b, a]);
        sel.extend(&[a, c]);
        assert_eq!(sel.ids(), &[b, a, c]);
        sel.toggle(a);
        assert_eq!(sel.ids(), &[b, c]);
        sel.toggle(a);
        assert_eq!(sel.ids(), &[b, c, a]);
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn lock_covers_descendant_paths() {
        let layer = Layer::shape(ShapeKind::Rect, 1.0, 1.0);
        let mut locks = LockRegistry::new();
        assert!(locks.lock(layer.id, "fill"));
        assert!(!locks.lock(layer.id, "fills[0]"));

        assert_eq!(
            locks.blocking_lock(&layer, &path("fill.color.r")),
            Some("fill".to_string())
        );
        assert_eq!(locks.blocking_lock(&layer, &path("fills[0]")), Some("fill".to_string()));
        assert_eq!(locks.blocking_lock(&layer, &path("opacity")), None);
    }

    #[test]
    fn lock_covers_ancestor_paths() {
        let layer = Layer::shape(ShapeKind::Rect, 1.0, 1.0);
        let mut locks = LockRegistry::new();
        locks.lock(layer.id, "fill.color");
        locks.lock(layer.id, "x");

        assert_eq!(locks.blocking_lock(&layer, &path("fill")), Some("fill.color".to_string()));
        assert_eq!(locks.blocking_lock(&layer, &path("fills")), Some("fill.color".to_string()));
        assert_eq!(locks.blocking_lock(&layer, &path("transform")), Some("x".to_string()));
        assert_eq!(
            locks.blocking_lock(&layer, &path("transform.position")),
            Some("x".to_string())
        );
        assert_eq!(locks.blocking_lock(&layer, &path("y")), None);
        assert_eq!(locks.blocking_lock(&layer, &path("fills[1]")), None);
    }

    #[test]
    fn star_locks_everything() {
        let layer = Layer::text("hi");
        let mut locks = LockRegistry::new();
        locks.lock(layer.id, "*");
        assert!(locks.blocking_lock(&layer, &path("text")).is_some());
        assert!(locks.blocking_lock(&layer, &path("name")).is_some());
    }

    #[test]
    fn locked_flag_locks_transform() {
        let layer = Layer::text("pinned").locked();
        let locks = LockRegistry::new();
        assert_eq!(
            locks.blocking_lock(&layer, &path("x")),
            Some("transform".to_string())
        );
        assert_eq!(locks.blocking_lock(&layer, &path("text.color")), None);
    }

    #[test]
    fn unlock_accepts_equivalent_spelling() {
        let id = LayerId::intern("lock_target");
        let mut locks = LockRegistry::new();
        locks.lock(id, "x");
        locks.lock(id, "text");
        assert!(locks.unlock(id, "transform.position.x"));
        assert_eq!(locks.locked_paths(id), &["text".to_string()]);
        locks.unlock_all(id);
        assert!(locks.is_empty());
    }

    #[test]
    fn serializes_as_plain_map() {
        let id = LayerId::intern("s1");
        let mut locks = LockRegistry::new();
        locks.lock(id, "fill");
        let json = serde_json::to_value(&locks).unwrap();
        assert_eq!(json, serde_json::json!({ "s1": ["fill"] }));
        let back: LockRegistry = serde_json::from_value(json).unwrap();
        assert_eq!(back, locks);
    }
}
