//! Higher-level edit intents.
//!
//! An intent names what should happen ("recolor the CTA", "move the logo
//! 20px right") rather than which property paths to write. It is lowered
//! against the document current at apply time into [`PatchOp`]s, which
//! then go through the same validation as any other patch.

use crate::patch::{PatchOp, PatchResult, RevisionScope, apply_patch, resolve_targets};
use crate::registry::LockRegistry;
use ds_core::document::Document;
use ds_core::model::{Color, Layer, Paint};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "kebab-case")]
pub enum EditIntent {
    SetText { target: String, text: String },
    /// Set the primary color: text color for text, first fill otherwise.
    Recolor { target: String, color: String },
    /// Swap one color for another everywhere it is used as a solid fill,
    /// solid stroke or text color.
    ReplaceColor { from: String, to: String },
    SetOpacity { target: String, opacity: f32 },
    Move { target: String, dx: f32, dy: f32 },
    Resize { target: String, width: f32, height: f32 },
    SetVisibility { target: String, visible: bool },
    Rename { target: String, name: String },
}

impl EditIntent {
    /// Lower into patch ops against `doc`.
    ///
    /// Relative intents (move) read current values here. When a target
    /// resolves to nothing, a single op on the raw target is emitted so
    /// the patch engine reports it as not found.
    pub fn lower(&self, doc: &Document) -> Vec<PatchOp> {
        match self {
            EditIntent::SetText { target, text } => {
                vec![PatchOp::new(target.as_str(), "text", json!(text))]
            }
            EditIntent::Recolor { target, color } => {
                let ids = resolve_targets(doc, target);
                if ids.is_empty() {
                    return vec![PatchOp::new(target.as_str(), "fill", json!(color))];
                }
                ids.iter()
                    .filter_map(|id| doc.get(*id))
                    .map(|layer| {
                        let path = if layer.text_data().is_some() {
                            "text.color"
                        } else {
                            "fill"
                        };
                        PatchOp::new(layer.id.as_str(), path, json!(color))
                    })
                    .collect()
            }
            EditIntent::ReplaceColor { from, to } => {
                let Some(from) = Color::from_hex(from) else {
                    log::debug!("replace-color: `{from}` is not a color");
                    return Vec::new();
                };
                doc.walk()
                    .flat_map(|layer| color_uses(layer, &from))
                    .map(|(layer, path)| PatchOp::new(layer, path, json!(to)))
                    .collect()
            }
            EditIntent::SetOpacity { target, opacity } => {
                vec![PatchOp::new(target.as_str(), "opacity", json!(opacity))]
            }
            EditIntent::Move { target, dx, dy } => {
                let ids = resolve_targets(doc, target);
                if ids.is_empty() {
                    return vec![PatchOp::new(target.as_str(), "x", json!(dx))];
                }
                ids.iter()
                    .filter_map(|id| doc.get(*id))
                    .flat_map(|layer| {
                        let p = layer.transform.position;
                        [
                            PatchOp::new(layer.id.as_str(), "x", json!(p.x + dx)),
                            PatchOp::new(layer.id.as_str(), "y", json!(p.y + dy)),
                        ]
                    })
                    .collect()
            }
            EditIntent::Resize {
                target,
                width,
                height,
            } => vec![
                PatchOp::new(target.as_str(), "width", json!(width)),
                PatchOp::new(target.as_str(), "height", json!(height)),
            ],
            EditIntent::SetVisibility { target, visible } => {
                vec![PatchOp::new(target.as_str(), "visible", json!(visible))]
            }
            EditIntent::Rename { target, name } => {
                vec![PatchOp::new(target.as_str(), "name", json!(name))]
            }
        }
    }
}

/// `(layer id, path)` for every place `layer` uses `color` as a solid.
fn color_uses(layer: &Layer, color: &Color) -> Vec<(String, String)> {
    let id = layer.id.as_str().to_string();
    let mut out = Vec::new();
    if let Some(text) = layer.text_data() {
        if text.style.color.same_rgb8(color) {
            out.push((id.clone(), "text.color".to_string()));
        }
    }
    for (i, paint) in layer.fills().unwrap_or(&[]).iter().enumerate() {
        if paint.solid_color().is_some_and(|c| c.same_rgb8(color)) {
            out.push((id.clone(), format!("fills[{i}].color")));
        }
    }
    if let Some(Some(stroke)) = layer.stroke() {
        if let Paint::Solid { color: c } = &stroke.paint {
            if c.same_rgb8(color) {
                out.push((id, "stroke.color".to_string()));
            }
        }
    }
    out
}

/// Lower every intent against `doc` and apply the ops as one patch.
pub fn apply_intents(
    doc: &Document,
    intents: &[EditIntent],
    locks: &LockRegistry,
    scope: &RevisionScope,
    description: &str,
) -> PatchResult {
    let ops: Vec<PatchOp> = intents.iter().flat_map(|i| i.lower(doc)).collect();
    apply_patch(doc, &ops, locks, scope, description)
}
