//! Structural checks for documents.
//!
//! Reports broken invariants without modifying the document. The pure
//! mutators never produce these; they show up in documents loaded from
//! outside or assembled by hand.

use crate::document::Document;
use crate::id::LayerId;
use std::collections::{HashMap, HashSet};

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The tree is broken; edits may misbehave.
    Error,
    /// Tolerated, but not something the mutators would produce.
    Warning,
}

/// A single finding.
#[derive(Debug, Clone)]
pub struct IntegrityIssue {
    /// The layer the finding refers to, if any.
    pub layer: Option<LayerId>,
    pub message: String,
    pub severity: IssueSeverity,
    /// Short rule identifier (e.g. "dangling-child", "orphan").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run every rule and return the findings. Empty means well-formed.
#[must_use]
pub fn check_document(doc: &Document) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    if doc.root().is_none() {
        issues.push(IntegrityIssue {
            layer: Some(doc.root_id()),
            message: format!("Root frame `{}` is missing.", doc.root_id()),
            severity: IssueSeverity::Error,
            rule: "missing-root",
        });
        return issues;
    }
    check_ids(doc, &mut issues);
    check_children(doc, &mut issues);
    check_reachability(doc, &mut issues);
    check_opacity(doc, &mut issues);
    check_selection(doc, &mut issues);
    issues
}

/// Whether `check_document` reports no errors.
pub fn is_well_formed(doc: &Document) -> bool {
    check_document(doc)
        .iter()
        .all(|i| i.severity != IssueSeverity::Error)
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn check_ids(doc: &Document, issues: &mut Vec<IntegrityIssue>) {
    for (key, layer) in doc.layers_by_id() {
        if *key != layer.id {
            issues.push(IntegrityIssue {
                layer: Some(*key),
                message: format!("Layer stored under `{key}` carries id `{}`.", layer.id),
                severity: IssueSeverity::Error,
                rule: "id-mismatch",
            });
        }
    }
}

/// Every child id resolves, and no layer has two parents.
fn check_children(doc: &Document, issues: &mut Vec<IntegrityIssue>) {
    let mut parents: HashMap<LayerId, LayerId> = HashMap::new();
    for layer in doc.layers() {
        for child in layer.children().unwrap_or(&[]) {
            if !doc.contains(*child) {
                issues.push(IntegrityIssue {
                    layer: Some(layer.id),
                    message: format!("`{}` lists unknown child `{child}`.", layer.id),
                    severity: IssueSeverity::Error,
                    rule: "dangling-child",
                });
                continue;
            }
            if *child == doc.root_id() {
                issues.push(IntegrityIssue {
                    layer: Some(layer.id),
                    message: format!("`{}` lists the root frame as a child.", layer.id),
                    severity: IssueSeverity::Error,
                    rule: "cycle",
                });
                continue;
            }
            if let Some(first) = parents.insert(*child, layer.id) {
                issues.push(IntegrityIssue {
                    layer: Some(*child),
                    message: format!("`{child}` is listed by both `{first}` and `{}`.", layer.id),
                    severity: IssueSeverity::Error,
                    rule: "double-parent",
                });
            }
        }
    }

    // With unique parents, a cycle shows up as a parent chain that never
    // reaches a layer without a parent.
    for start in parents.keys() {
        let mut seen = HashSet::new();
        let mut current = *start;
        while let Some(parent) = parents.get(&current) {
            if !seen.insert(current) {
                issues.push(IntegrityIssue {
                    layer: Some(*start),
                    message: format!("`{start}` is its own ancestor."),
                    severity: IssueSeverity::Error,
                    rule: "cycle",
                });
                break;
            }
            current = *parent;
        }
    }
}

fn check_reachability(doc: &Document, issues: &mut Vec<IntegrityIssue>) {
    let reachable: HashSet<LayerId> = doc.subtree_ids(doc.root_id()).into_iter().collect();
    let mut orphans: Vec<LayerId> = doc
        .layers_by_id()
        .keys()
        .filter(|id| !reachable.contains(id))
        .copied()
        .collect();
    orphans.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    for id in orphans {
        issues.push(IntegrityIssue {
            layer: Some(id),
            message: format!("`{id}` is not reachable from the root frame."),
            severity: IssueSeverity::Error,
            rule: "orphan",
        });
    }
}

fn check_opacity(doc: &Document, issues: &mut Vec<IntegrityIssue>) {
    for layer in doc.layers() {
        if !(0.0..=1.0).contains(&layer.opacity) {
            issues.push(IntegrityIssue {
                layer: Some(layer.id),
                message: format!("`{}` has opacity {} outside [0, 1].", layer.id, layer.opacity),
                severity: IssueSeverity::Warning,
                rule: "opacity-range",
            });
        }
    }
}

fn check_selection(doc: &Document, issues: &mut Vec<IntegrityIssue>) {
    for id in doc.selection() {
        if !doc.contains(*id) {
            issues.push(IntegrityIssue {
                layer: Some(*id),
                message: format!("Selection names unknown layer `{id}`."),
                severity: IssueSeverity::Warning,
                rule: "selection-unknown",
            });
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentConfig, add_layer, create_document, duplicate_layer};
    use crate::model::{Layer, ShapeKind};
    use serde_json::json;

    fn rules(doc: &Document) -> Vec<&'static str> {
        check_document(doc).iter().map(|i| i.rule).collect()
    }

    /// Assemble a document from JSON, bypassing the mutators.
    fn raw_document(layers: serde_json::Value, selection: &[&str]) -> Document {
        serde_json::from_value(json!({
            "id": "raw_doc",
            "canvasWidth": 100.0,
            "canvasHeight": 100.0,
            "dpi": 72.0,
            "bleedMargin": null,
            "safeAreaMargin": null,
            "layersById": layers,
            "rootFrameId": "root",
            "selection": { "ids": selection },
            "meta": {}
        }))
        .unwrap()
    }

    fn frame(id: &str, children: &[&str]) -> serde_json::Value {
        json!({
            "id": id, "name": id,
            "transform": { "position": { "x": 0.0, "y": 0.0 }, "size": { "x": 10.0, "y": 10.0 },
                           "rotation": 0.0, "skewX": 0.0, "skewY": 0.0 },
            "opacity": 1.0, "visible": true, "locked": false, "tags": [],
            "type": "frame", "children": children, "clip": true, "fills": [],
            "stroke": null, "cornerRadii": null
        })
    }

    #[test]
    fn mutator_output_is_clean() {
        let doc = create_document(&DocumentConfig::default());
        let group = Layer::group();
        let gid = group.id;
        let doc = add_layer(&doc, group, None);
        let doc = add_layer(&doc, Layer::shape(ShapeKind::Ellipse, 5.0, 5.0), Some(gid));
        let doc = duplicate_layer(&doc, gid);
        assert!(check_document(&doc).is_empty(), "{:?}", check_document(&doc));
        assert!(is_well_formed(&doc));
    }

    #[test]
    fn reports_dangling_child() {
        let doc = raw_document(json!({ "root": frame("root", &["ghost"]) }), &[]);
        assert_eq!(rules(&doc), vec!["dangling-child"]);
    }

    #[test]
    fn reports_orphan() {
        let doc = raw_document(
            json!({ "root": frame("root", &[]), "lost": frame("lost", &[]) }),
            &[],
        );
        assert_eq!(rules(&doc), vec!["orphan"]);
    }

    #[test]
    fn reports_double_parent() {
        let doc = raw_document(
            json!({
                "root": frame("root", &["a", "b"]),
                "a": frame("a", &["c"]),
                "b": frame("b", &["c"]),
                "c": frame("c", &[]),
            }),
            &[],
        );
        assert!(rules(&doc).contains(&"double-parent"));
        assert!(!is_well_formed(&doc));
    }

    #[test]
    fn reports_cycle() {
        let doc = raw_document(
            json!({
                "root": frame("root", &[]),
                "a": frame("a", &["b"]),
                "b": frame("b", &["a"]),
            }),
            &[],
        );
        let found = rules(&doc);
        assert!(found.contains(&"cycle"), "{found:?}");
        assert!(found.contains(&"orphan"), "{found:?}");
    }

    #[test]
    fn reports_missing_root_only() {
        let doc = raw_document(json!({ "other": frame("other", &[]) }), &[]);
        assert_eq!(rules(&doc), vec!["missing-root"]);
    }

    #[test]
    fn selection_of_unknown_layer_is_a_warning() {
        let doc = raw_document(json!({ "root": frame("root", &[]) }), &["nobody"]);
        assert_eq!(rules(&doc), vec!["selection-unknown"]);
        assert!(is_well_formed(&doc));
    }
}
