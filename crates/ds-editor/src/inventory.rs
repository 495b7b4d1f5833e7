//! Inventory of editable values handed to a revision service.
//!
//! One entry per `(tag, layer, path)` with the current value. Locked
//! paths are left out so the service never proposes edits that would be
//! rejected anyway.

use crate::domain::read_value;
use crate::registry::LockRegistry;
use ds_core::document::Document;
use ds_core::id::LayerId;
use ds_core::model::{Layer, LayerKind};
use ds_core::path::PropertyPath;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub tag: String,
    pub layer: LayerId,
    pub kind: &'static str,
    pub path: String,
    pub value: Value,
}

const COMMON: &[&str] = &["opacity", "visible", "transform.position", "transform.size"];
const TEXT: &[&str] = &[
    "text",
    "text.color",
    "text.fontFamily",
    "text.fontSize",
    "text.fontWeight",
    "text.align",
];
const PAINTED: &[&str] = &["fill", "stroke.color", "cornerRadii"];

/// Entries for every tagged layer, in document order.
pub fn build_inventory(doc: &Document, locks: &LockRegistry) -> Vec<InventoryEntry> {
    let mut out = Vec::new();
    for layer in doc.walk().filter(|l| !l.tags.is_empty()) {
        for path in editable_paths(layer) {
            if locks.blocking_lock(layer, &path).is_some() {
                continue;
            }
            let Some(value) = read_value(layer, &path) else {
                continue;
            };
            for tag in &layer.tags {
                out.push(InventoryEntry {
                    tag: tag.clone(),
                    layer: layer.id,
                    kind: layer.kind_tag(),
                    path: path.to_string(),
                    value: value.clone(),
                });
            }
        }
    }
    out
}

fn editable_paths(layer: &Layer) -> Vec<PropertyPath> {
    let specific: &[&str] = match layer.kind {
        LayerKind::Text(_) => TEXT,
        LayerKind::Group(_) => &[],
        _ => PAINTED,
    };
    specific
        .iter()
        .chain(COMMON)
        .filter_map(|p| PropertyPath::parse(p).ok())
        .filter(|p| p.applies_to(layer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_core::document::{DocumentConfig, add_layer, create_document};
    use ds_core::model::ShapeKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn lists_tagged_layers_and_skips_locked_paths() {
        let doc = create_document(&DocumentConfig::default());
        let title = Layer::text("Sale").tagged(["headline"]);
        let untagged = Layer::shape(ShapeKind::Rect, 5.0, 5.0);
        let doc = add_layer(&doc, title.clone(), None);
        let doc = add_layer(&doc, untagged.clone(), None);

        let mut locks = LockRegistry::new();
        locks.lock(title.id, "text.color");
        let entries = build_inventory(&doc, &locks);

        assert!(entries.iter().all(|e| e.layer == title.id && e.tag == "headline"));
        assert!(entries.iter().all(|e| e.path != "text.color"));
        let content = entries.iter().find(|e| e.path == "text.content").unwrap();
        assert_eq!(content.value, json!("Sale"));
        assert_eq!(content.kind, "text");
    }

    #[test]
    fn entry_serializes_for_the_service() {
        let entry = InventoryEntry {
            tag: "cta-bg".into(),
            layer: LayerId::intern("s1"),
            kind: "shape",
            path: "fill".into(),
            value: json!("#FF0000"),
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "tag": "cta-bg", "layer": "s1", "kind": "shape", "path": "fill", "value": "#FF0000" })
        );
    }
}
