//! Integration tests: mutator sequences keep the tree well-formed and
//! documents survive a JSON round trip.

use ds_core::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small banner: background frame, headline, button group with a
/// locked badge.
fn banner() -> (Document, LayerId, LayerId, LayerId) {
    let doc = create_document(&DocumentConfig {
        canvas_width: 1200.0,
        canvas_height: 628.0,
        ..Default::default()
    });
    let headline = Layer::text("Summer Sale").tagged(["headline"]).at(40.0, 40.0);
    let button = Layer::group().named("Button").tagged(["cta"]);
    let cta_bg = Layer::shape(ShapeKind::Rect, 200.0, 48.0)
        .tagged(["cta-bg"])
        .filled(Paint::solid(Color::from_hex("#0044ff").unwrap()));
    let badge = Layer::shape(ShapeKind::Ellipse, 24.0, 24.0).locked();
    let (h, b, bg) = (headline.id, button.id, cta_bg.id);

    let doc = add_layer(&doc, headline, None);
    let doc = add_layer(&doc, button, None);
    let doc = add_layer(&doc, cta_bg, Some(b));
    let doc = add_layer(&doc, badge, Some(b));
    (doc, h, b, bg)
}

fn assert_clean(doc: &Document) {
    let issues = check_document(doc);
    assert!(issues.is_empty(), "integrity issues: {issues:?}");
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[test]
fn every_mutator_keeps_the_tree_well_formed() {
    init_logging();
    let (doc, headline, button, cta_bg) = banner();
    assert_clean(&doc);

    let doc = update_layer(
        &doc,
        headline,
        &LayerPatch {
            content: Some("Winter Sale\nEverything must go".into()),
            opacity: Some(1.7),
            ..Default::default()
        },
    );
    assert_clean(&doc);
    assert_eq!(doc.get(headline).unwrap().opacity, 1.0);

    let doc = reorder_layer(&doc, button, ReorderDirection::Bottom);
    assert_clean(&doc);
    assert_eq!(doc.children_of(doc.root_id())[0], button);

    let doc = duplicate_layer(&doc, button);
    assert_clean(&doc);
    assert_eq!(doc.children_of(doc.root_id()).len(), 3);

    let doc = remove_layer(&doc, cta_bg);
    assert_clean(&doc);

    // Unknown ids and the root are silently ignored.
    let same = remove_layer(&doc, LayerId::intern("does_not_exist"));
    assert_eq!(same, doc);
    let same = remove_layer(&doc, doc.root_id());
    assert_eq!(same, doc);
}

#[test]
fn duplicate_copies_the_whole_subtree_under_new_ids() {
    init_logging();
    let (doc, _, button, cta_bg) = banner();
    let doc = duplicate_layer(&doc, button);

    let root_children = doc.children_of(doc.root_id());
    let copy = *root_children.last().unwrap();
    assert_ne!(copy, button);

    let original: Vec<_> = doc.subtree_ids(button);
    let copied: Vec<_> = doc.subtree_ids(copy);
    assert_eq!(original.len(), copied.len());
    assert!(copied.iter().all(|id| !original.contains(id)));

    // Content matches apart from ids.
    let bg_copy = doc.get(copied[1]).unwrap();
    let bg = doc.get(cta_bg).unwrap();
    assert_eq!(bg_copy.fills(), bg.fills());
    assert_eq!(bg_copy.tags, bg.tags);
}

#[test]
fn untouched_layers_are_shared_between_versions() {
    let (doc, headline, _, cta_bg) = banner();
    let next = update_layer(
        &doc,
        headline,
        &LayerPatch {
            name: Some("Title".into()),
            ..Default::default()
        },
    );
    assert!(Arc::ptr_eq(
        &doc.get_shared(cta_bg).unwrap(),
        &next.get_shared(cta_bg).unwrap()
    ));
    assert!(!Arc::ptr_eq(
        &doc.get_shared(headline).unwrap(),
        &next.get_shared(headline).unwrap()
    ));
    assert_eq!(doc.get(headline).unwrap().name, "Summer Sale");
}

#[test]
fn document_survives_json_round_trip() {
    let (doc, headline, ..) = banner();
    let doc = with_selection(&doc, &[headline]);
    let json = serde_json::to_string_pretty(&doc).unwrap();
    let back: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
    assert_clean(&back);
    assert_eq!(back.selection(), &[headline]);
}

#[test]
fn tag_queries_see_mutations() {
    let (doc, headline, ..) = banner();
    let doc = update_layer(
        &doc,
        headline,
        &LayerPatch {
            content: Some("Flash Sale".into()),
            ..Default::default()
        },
    );
    assert_eq!(text_by_tag(&doc)["headline"], "Flash Sale");
    assert_eq!(colors_by_tag(&doc)["cta-bg"].to_hex(), "#0044FF");
    assert_eq!(text_layers_by_tag(&doc, "headline").len(), 1);
    assert_eq!(layers_with_tag(&doc, "cta").len(), 1);
}
