//! Tag-addressed read queries.
//!
//! Tags are not unique: every query walks the tree in document order and
//! the tag-indexed maps keep the first match for each tag.

use crate::document::Document;
use crate::model::{Color, Layer, LayerKind};
use std::collections::BTreeMap;

/// Every reachable layer carrying `tag`, in document order.
pub fn layers_with_tag<'a>(doc: &'a Document, tag: &str) -> Vec<&'a Layer> {
    doc.walk().filter(|l| l.has_tag(tag)).collect()
}

/// Text layers carrying `tag`, in document order.
pub fn text_layers_by_tag<'a>(doc: &'a Document, tag: &str) -> Vec<&'a Layer> {
    doc.walk()
        .filter(|l| l.has_tag(tag) && matches!(l.kind, LayerKind::Text(_)))
        .collect()
}

/// Tag → content of the first text layer carrying it.
pub fn text_by_tag(doc: &Document) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for layer in doc.walk() {
        let Some(text) = layer.text_data() else {
            continue;
        };
        for tag in &layer.tags {
            out.entry(tag.clone())
                .or_insert_with(|| text.content.clone());
        }
    }
    out
}

/// Tag → primary color of the first layer carrying it that has one.
pub fn colors_by_tag(doc: &Document) -> BTreeMap<String, Color> {
    let mut out = BTreeMap::new();
    for layer in doc.walk() {
        let Some(color) = primary_color(layer) else {
            continue;
        };
        for tag in &layer.tags {
            out.entry(tag.clone()).or_insert(color);
        }
    }
    out
}

/// The color a layer visibly "is": its text color, or the color of its
/// first solid fill.
pub fn primary_color(layer: &Layer) -> Option<Color> {
    if let Some(text) = layer.text_data() {
        return Some(text.style.color);
    }
    layer.fills()?.iter().find_map(|p| p.solid_color())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentConfig, ReorderDirection, add_layer, create_document, reorder_layer};
    use crate::model::{Paint, ShapeKind};
    use pretty_assertions::assert_eq;

    fn sample() -> (Document, Layer, Layer, Layer) {
        let doc = create_document(&DocumentConfig::default());
        let title = Layer::text("Summer Sale").tagged(["headline"]);
        let sub = Layer::text("Up to 50% off").tagged(["headline", "subline"]);
        let button = Layer::shape(ShapeKind::Rect, 200.0, 48.0)
            .tagged(["cta-bg"])
            .filled(Paint::solid(Color::from_hex("#ff8800").unwrap()));
        let doc = add_layer(&doc, title.clone(), None);
        let doc = add_layer(&doc, sub.clone(), None);
        let doc = add_layer(&doc, button.clone(), None);
        (doc, title, sub, button)
    }

    #[test]
    fn layers_with_tag_follow_document_order() {
        let (doc, title, sub, _) = sample();
        let ids: Vec<_> = layers_with_tag(&doc, "headline").iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![title.id, sub.id]);

        let doc = reorder_layer(&doc, title.id, ReorderDirection::Top);
        let ids: Vec<_> = layers_with_tag(&doc, "headline").iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![sub.id, title.id]);
    }

    #[test]
    fn text_layers_skip_other_kinds() {
        let (doc, ..) = sample();
        assert!(text_layers_by_tag(&doc, "cta-bg").is_empty());
        assert_eq!(text_layers_by_tag(&doc, "subline").len(), 1);
        assert!(layers_with_tag(&doc, "missing").is_empty());
    }

    #[test]
    fn tag_indexed_text_keeps_first_match() {
        let (doc, ..) = sample();
        let texts = text_by_tag(&doc);
        assert_eq!(texts.get("headline").map(String::as_str), Some("Summer Sale"));
        assert_eq!(texts.get("subline").map(String::as_str), Some("Up to 50% off"));
        assert!(!texts.contains_key("cta-bg"));
    }

    #[test]
    fn tag_indexed_colors() {
        let (doc, ..) = sample();
        let colors = colors_by_tag(&doc);
        assert_eq!(colors["cta-bg"].to_hex(), "#FF8800");
        assert_eq!(colors["headline"], Color::BLACK);
    }
}
