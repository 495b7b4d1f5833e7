//! Patch engine: validates externally proposed edits and folds every
//! accepted one into a single reversible [`Command`].
//!
//! Each op runs through resolve → scope → lock → domain. Rejection is per
//! op (and per layer for broadcast ops); an op that lands on at least one
//! layer counts as accepted. Validation reads only its inputs: no clock,
//! no randomness, no IO.

use crate::commands::{Command, Edit};
use crate::domain::{Clamp, apply_value};
use crate::registry::LockRegistry;
use ds_core::document::Document;
use ds_core::id::LayerId;
use ds_core::model::Layer;
use ds_core::path::{PropertyCategory, PropertyPath};
use ds_core::query::layers_with_tag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ─── Inputs ──────────────────────────────────────────────────────────────

/// One proposed property write. `target` is a layer id, or a tag that
/// broadcasts to every layer carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub target: String,
    pub path: String,
    pub value: Value,
}

impl PatchOp {
    pub fn new(target: impl Into<String>, path: impl Into<String>, value: Value) -> Self {
        Self {
            target: target.into(),
            path: path.into(),
            value,
        }
    }
}

/// What an automated revision is allowed to touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevisionScope {
    FullRedesign,
    ColorsOnly,
    CopyOnly,
    LayoutOnly,
    TypographyOnly,
    /// Named subset: the listed categories, restricted to layers carrying
    /// one of `tags` when `tags` is non-empty.
    Subset {
        categories: Vec<PropertyCategory>,
        #[serde(default)]
        tags: Vec<String>,
    },
}

impl RevisionScope {
    pub fn allows(&self, layer: &Layer, path: &PropertyPath) -> bool {
        let category = path.category();
        match self {
            RevisionScope::FullRedesign => true,
            RevisionScope::ColorsOnly => category == PropertyCategory::Color,
            RevisionScope::CopyOnly => category == PropertyCategory::Copy,
            RevisionScope::LayoutOnly => category == PropertyCategory::Geometry,
            RevisionScope::TypographyOnly => category == PropertyCategory::Typography,
            RevisionScope::Subset { categories, tags } => {
                categories.contains(&category)
                    && (tags.is_empty() || tags.iter().any(|t| layer.has_tag(t)))
            }
        }
    }
}

impl fmt::Display for RevisionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RevisionScope::FullRedesign => "full-redesign",
            RevisionScope::ColorsOnly => "colors-only",
            RevisionScope::CopyOnly => "copy-only",
            RevisionScope::LayoutOnly => "layout-only",
            RevisionScope::TypographyOnly => "typography-only",
            RevisionScope::Subset { .. } => "subset",
        })
    }
}

// ─── Outputs ─────────────────────────────────────────────────────────────

/// Why an op (or one of its broadcast targets) was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum RejectReason {
    #[error("no layer with id or tag `{target}`")]
    TargetNotFound { target: String },
    #[error("`{path}` is not an editable property of this layer")]
    UnknownProperty { path: String },
    #[error("invalid value for `{path}`: {message}")]
    InvalidValue { path: String, message: String },
    #[error("`{path}` is outside the {scope} scope")]
    ScopeViolation { path: String, scope: String },
    #[error("`{path}` is locked by `{locked_path}`")]
    LockViolation { path: String, locked_path: String },
}

/// The coarse classes callers render ("4 blocked by locked properties").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectClass {
    TargetNotFound,
    ScopeViolation,
    LockViolation,
}

impl RejectReason {
    pub fn class(&self) -> RejectClass {
        match self {
            RejectReason::TargetNotFound { .. }
            | RejectReason::UnknownProperty { .. }
            | RejectReason::InvalidValue { .. } => RejectClass::TargetNotFound,
            RejectReason::ScopeViolation { .. } => RejectClass::ScopeViolation,
            RejectReason::LockViolation { .. } => RejectClass::LockViolation,
        }
    }
}

/// A rejected op. `layers` lists the resolved layers it could not touch
/// (empty when nothing resolved).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedOp {
    pub op: PatchOp,
    pub reason: RejectReason,
    pub layers: Vec<LayerId>,
}

/// An applied value that was clamped into range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueClamp {
    pub layer: LayerId,
    pub path: String,
    pub requested: Value,
    pub applied: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchResult {
    /// At least one op was accepted.
    pub success: bool,
    /// The single history entry for every accepted effect. `None` when
    /// nothing was accepted or the accepted writes changed nothing.
    pub command: Option<Command>,
    /// Ops submitted, whatever happened to them.
    pub submitted_ops: usize,
    /// Ops that wrote to at least one layer.
    pub accepted_ops: usize,
    /// One entry per op that was blocked on at least one layer. A tag
    /// broadcast blocked on some layers is both accepted and rejected.
    pub rejected_ops: Vec<RejectedOp>,
    pub clamped: Vec<ValueClamp>,
}

impl PatchResult {
    pub fn rejected_by(&self, class: RejectClass) -> usize {
        self.rejected_ops
            .iter()
            .filter(|r| r.reason.class() == class)
            .count()
    }

    /// "3 of 7 changes applied; 4 blocked (4 by locked properties)"
    pub fn summary(&self) -> String {
        let blocked = self.submitted_ops.saturating_sub(self.accepted_ops);
        let partial = self.rejected_ops.len().saturating_sub(blocked);
        let mut out = format!(
            "{} of {} changes applied",
            self.accepted_ops, self.submitted_ops
        );
        if blocked > 0 {
            out.push_str(&format!("; {blocked} blocked"));
        }
        if partial > 0 {
            out.push_str(&format!("; {partial} applied in part"));
        }
        let locked = self.rejected_by(RejectClass::LockViolation);
        if locked > 0 {
            out.push_str(&format!(" ({locked} by locked properties)"));
        }
        out
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Working copies of every layer touched so far, in first-touch order.
#[derive(Default)]
struct Staging {
    order: Vec<LayerId>,
    layers: HashMap<LayerId, Layer>,
}

impl Staging {
    fn current<'a>(&'a self, doc: &'a Document, id: LayerId) -> Option<&'a Layer> {
        self.layers.get(&id).or_else(|| doc.get(id))
    }

    fn commit(&mut self, layer: Layer) {
        if !self.layers.contains_key(&layer.id) {
            self.order.push(layer.id);
        }
        self.layers.insert(layer.id, layer);
    }
}

/// Validate `ops` against `doc` and build one command from the accepted
/// effects. Never fails: every problem is reported in the result.
pub fn apply_patch(
    doc: &Document,
    ops: &[PatchOp],
    locks: &LockRegistry,
    scope: &RevisionScope,
    description: &str,
) -> PatchResult {
    let mut staging = Staging::default();
    let mut accepted_ops = 0;
    let mut rejected_ops = Vec::new();
    let mut clamped = Vec::new();

    for op in ops {
        let targets = resolve_targets(doc, &op.target);
        if targets.is_empty() {
            log::trace!("patch op {:?}: target not found", op.target);
            rejected_ops.push(RejectedOp {
                op: op.clone(),
                reason: RejectReason::TargetNotFound {
                    target: op.target.clone(),
                },
                layers: Vec::new(),
            });
            continue;
        }

        let path = match PropertyPath::parse(&op.path) {
            Ok(path) => path,
            Err(err) => {
                log::trace!("patch op {:?}: {err}", op.path);
                rejected_ops.push(RejectedOp {
                    op: op.clone(),
                    reason: RejectReason::UnknownProperty {
                        path: op.path.clone(),
                    },
                    layers: targets,
                });
                continue;
            }
        };

        let mut applied_any = false;
        let mut blocked: Vec<LayerId> = Vec::new();
        let mut first_reason: Option<RejectReason> = None;
        for id in targets {
            let Some(layer) = staging.current(doc, id) else {
                continue;
            };
            match check_and_write(layer, &path, op, locks, scope) {
                Ok((written, clamp)) => {
                    if let Some(clamp) = clamp {
                        clamped.push(ValueClamp {
                            layer: id,
                            path: path.to_string(),
                            requested: clamp.requested,
                            applied: clamp.applied,
                        });
                    }
                    staging.commit(written);
                    applied_any = true;
                }
                Err(reason) => {
                    log::trace!("patch op {:?} on {id}: {reason}", op.path);
                    blocked.push(id);
                    first_reason.get_or_insert(reason);
                }
            }
        }

        if applied_any {
            accepted_ops += 1;
        }
        if let Some(reason) = first_reason {
            rejected_ops.push(RejectedOp {
                op: op.clone(),
                reason,
                layers: blocked,
            });
        }
    }

    let command = build_command(doc, staging, description);
    log::debug!(
        "patch {description:?}: {accepted_ops} accepted, {} rejected, {} clamped",
        rejected_ops.len(),
        clamped.len()
    );
    PatchResult {
        success: accepted_ops > 0,
        command,
        submitted_ops: ops.len(),
        accepted_ops,
        rejected_ops,
        clamped,
    }
}

/// Id match first; otherwise every layer carrying the tag, in document
/// order.
pub(crate) fn resolve_targets(doc: &Document, target: &str) -> Vec<LayerId> {
    if let Some(id) = LayerId::lookup(target).filter(|id| doc.contains(*id)) {
        return vec![id];
    }
    layers_with_tag(doc, target).iter().map(|l| l.id).collect()
}

/// Scope, lock and domain checks for one layer. Returns the written copy.
fn check_and_write(
    layer: &Layer,
    path: &PropertyPath,
    op: &PatchOp,
    locks: &LockRegistry,
    scope: &RevisionScope,
) -> Result<(Layer, Option<Clamp>), RejectReason> {
    if !path.applies_to(layer) {
        return Err(RejectReason::UnknownProperty {
            path: op.path.clone(),
        });
    }
    if !scope.allows(layer, path) {
        return Err(RejectReason::ScopeViolation {
            path: op.path.clone(),
            scope: scope.to_string(),
        });
    }
    if let Some(locked_path) = locks.blocking_lock(layer, path) {
        return Err(RejectReason::LockViolation {
            path: op.path.clone(),
            locked_path,
        });
    }
    let mut written = layer.clone();
    let clamp = apply_value(&mut written, path, &op.value).map_err(|message| {
        RejectReason::InvalidValue {
            path: op.path.clone(),
            message,
        }
    })?;
    Ok((written, clamp))
}

/// One `Replace` per touched layer whose value actually changed.
fn build_command(doc: &Document, staging: Staging, description: &str) -> Option<Command> {
    let Staging { order, mut layers } = staging;
    let mut forward = Vec::new();
    let mut inverse = Vec::new();
    for id in order {
        let (Some(before), Some(after)) = (doc.get_shared(id), layers.remove(&id)) else {
            continue;
        };
        if *before == after {
            continue;
        }
        forward.push(Edit::Replace {
            layer: Arc::new(after),
        });
        inverse.push(Edit::Replace { layer: before });
    }
    if forward.is_empty() {
        return None;
    }
    Some(Command::from_edits(description, forward, inverse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_core::document::{DocumentConfig, add_layer, create_document};
    use ds_core::model::{Color, Paint, ShapeKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc_with(layers: Vec<Layer>) -> Document {
        layers.into_iter().fold(
            create_document(&DocumentConfig::default()),
            |doc, layer| add_layer(&doc, layer, None),
        )
    }

    #[test]
    fn scope_categories() {
        let text = Layer::text("hi").tagged(["headline"]);
        let p = |s: &str| PropertyPath::parse(s).unwrap();
        assert!(RevisionScope::ColorsOnly.allows(&text, &p("text.color")));
        assert!(!RevisionScope::ColorsOnly.allows(&text, &p("text")));
        assert!(RevisionScope::CopyOnly.allows(&text, &p("text")));
        assert!(RevisionScope::LayoutOnly.allows(&text, &p("x")));
        assert!(RevisionScope::TypographyOnly.allows(&text, &p("text.fontSize")));

        let subset = RevisionScope::Subset {
            categories: vec![PropertyCategory::Copy],
            tags: vec!["cta".into()],
        };
        assert!(!subset.allows(&text, &p("text")));
        let tagged = text.clone().tagged(["cta"]);
        assert!(subset.allows(&tagged, &p("text")));
    }

    #[test]
    fn scope_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(RevisionScope::FullRedesign).unwrap(),
            json!("full-redesign")
        );
        let subset: RevisionScope =
            serde_json::from_value(json!({ "subset": { "categories": ["color", "copy"] } })).unwrap();
        assert_eq!(
            subset,
            RevisionScope::Subset {
                categories: vec![PropertyCategory::Color, PropertyCategory::Copy],
                tags: vec![],
            }
        );
    }

    #[test]
    fn accepted_writes_become_one_command() {
        let rect = Layer::shape(ShapeKind::Rect, 10.0, 10.0).tagged(["cta-bg"]);
        let id = rect.id;
        let doc = doc_with(vec![rect]);
        let ops = vec![
            PatchOp::new("cta-bg", "fill", json!("#ff0000")),
            PatchOp::new(id.as_str(), "opacity", json!(0.5)),
        ];
        let result = apply_patch(&doc, &ops, &LockRegistry::new(), &RevisionScope::FullRedesign, "AI");
        assert!(result.success);
        assert_eq!(result.accepted_ops, 2);
        let cmd = result.command.unwrap();
        assert_eq!(cmd.forward().len(), 1);

        let next = cmd.execute(&doc);
        let layer = next.get(id).unwrap();
        assert_eq!(layer.fills().unwrap()[0], Paint::solid(Color::rgba(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(layer.opacity, 0.5);
        assert_eq!(cmd.revert(&next), doc);
    }

    #[test]
    fn ill_typed_value_is_rejected_in_target_class() {
        let text = Layer::text("hi").tagged(["headline"]);
        let doc = doc_with(vec![text]);
        let ops = vec![PatchOp::new("headline", "text.align", json!("sideways"))];
        let result = apply_patch(&doc, &ops, &LockRegistry::new(), &RevisionScope::FullRedesign, "AI");
        assert!(!result.success);
        assert!(result.command.is_none());
        assert_eq!(result.rejected_ops[0].reason.class(), RejectClass::TargetNotFound);
        assert!(matches!(
            result.rejected_ops[0].reason,
            RejectReason::InvalidValue { .. }
        ));
    }

    #[test]
    fn unchanged_value_is_accepted_without_a_command() {
        let text = Layer::text("hi").tagged(["headline"]);
        let doc = doc_with(vec![text]);
        let ops = vec![PatchOp::new("headline", "text", json!("hi"))];
        let result = apply_patch(&doc, &ops, &LockRegistry::new(), &RevisionScope::CopyOnly, "AI");
        assert!(result.success);
        assert!(result.command.is_none());
    }

    #[test]
    fn later_ops_see_earlier_writes() {
        let rect = Layer::shape(ShapeKind::Rect, 10.0, 10.0).tagged(["box"]);
        let id = rect.id;
        let doc = doc_with(vec![rect]);
        let ops = vec![
            PatchOp::new("box", "fill", json!("#000000")),
            PatchOp::new("box", "fill.color.r", json!(1.5)),
        ];
        let result = apply_patch(&doc, &ops, &LockRegistry::new(), &RevisionScope::ColorsOnly, "AI");
        assert_eq!(result.clamped.len(), 1);
        assert_eq!(result.clamped[0].path, "fill.color.r");
        let next = result.command.unwrap().execute(&doc);
        assert_eq!(
            next.get(id).unwrap().fills().unwrap()[0].solid_color(),
            Some(Color::rgba(1.0, 0.0, 0.0, 1.0))
        );
    }

    #[test]
    fn summary_counts_locked_rejections() {
        let rect = Layer::shape(ShapeKind::Rect, 10.0, 10.0);
        let id = rect.id;
        let doc = doc_with(vec![rect]);
        let mut locks = LockRegistry::new();
        locks.lock(id, "opacity");
        let ops = vec![
            PatchOp::new(id.as_str(), "opacity", json!(0.2)),
            PatchOp::new(id.as_str(), "name", json!("Button")),
            PatchOp::new("ghost", "name", json!("x")),
        ];
        let result = apply_patch(&doc, &ops, &locks, &RevisionScope::FullRedesign, "AI");
        assert_eq!(result.summary(), "1 of 3 changes applied; 2 blocked (1 by locked properties)");
    }
}
