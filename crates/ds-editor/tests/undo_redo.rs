//! Integration tests: undo/redo through the edit session (ds-editor).
//!
//! Exercises the CommandStack with every mutator, checking that history
//! restores exact prior documents across crate boundaries.

use ds_core::*;
use ds_editor::commands::{Command, CommandStack};
use ds_editor::session::{EditSession, SessionConfig};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Session with a headline, a button group (background + label) and a
/// standalone logo.
fn make_session() -> (EditSession, LayerId, LayerId, LayerId) {
    let mut session = EditSession::new(SessionConfig {
        max_history: 0,
        ..Default::default()
    });
    let headline = Layer::text("Summer Sale").tagged(["headline"]);
    let button = Layer::group().named("Button");
    let logo = Layer::image("logo.png", 64.0, 64.0).named("Logo");
    let (h, b, l) = (headline.id, button.id, logo.id);

    session.add_layer(headline, None);
    session.add_layer(button, None);
    session.add_layer(Layer::shape(ShapeKind::Rect, 200.0, 48.0).tagged(["cta-bg"]), Some(b));
    session.add_layer(Layer::text("Shop now").tagged(["cta-label"]), Some(b));
    session.add_layer(logo, None);
    (session, h, b, l)
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn undo_restores_previous_state() {
    init_logging();
    let (mut session, headline, ..) = make_session();
    let before = session.document().clone();

    session.update_layer(
        headline,
        &LayerPatch {
            content: Some("Winter Sale".into()),
            ..Default::default()
        },
    );
    assert_eq!(
        session.document().get(headline).unwrap().text_data().unwrap().content,
        "Winter Sale"
    );

    let desc = session.undo();
    assert_eq!(desc.as_deref(), Some("Update Summer Sale"));
    assert_eq!(session.document(), &before);
}

#[test]
fn redo_reapplies_undone_action() {
    let (mut session, _, button, _) = make_session();
    session.reorder_layer(button, ReorderDirection::Top);
    let after = session.document().clone();

    session.undo();
    assert_ne!(session.document(), &after);
    session.redo();
    assert_eq!(session.document(), &after);
}

#[test]
fn undo_then_redo_is_a_document_noop() {
    let (mut session, _, _, logo) = make_session();
    session.remove_layer(logo);
    let current = session.document().clone();
    session.undo();
    session.redo();
    assert_eq!(session.document(), &current);
}

// ─── Multiple operations ────────────────────────────────────────────────

/// Execute a command that must exist, then check the replay invariant.
fn push(stack: &mut CommandStack, cmd: Option<Command>) {
    let cmd = cmd.expect("edit should change the document");
    stack.execute(cmd);
    assert_eq!(stack.replay(), *stack.document());
}

#[test]
fn n_undos_reach_origin_and_n_redos_return() {
    init_logging();
    let (session, headline, button, logo) = make_session();
    let origin = session.document().clone();
    let mut stack = CommandStack::new(origin.clone());

    let patch = LayerPatch {
        opacity: Some(0.4),
        ..Default::default()
    };
    let cmd = Command::update_layer(stack.document(), headline, &patch);
    push(&mut stack, cmd);
    let cmd = Command::duplicate_layer(stack.document(), button);
    push(&mut stack, cmd);
    let cmd = Command::reorder_layer(stack.document(), logo, ReorderDirection::Bottom);
    push(&mut stack, cmd);
    let cmd = Command::remove_layer(stack.document(), button);
    push(&mut stack, cmd);
    let cmd = Command::add_layer(stack.document(), Layer::shape(ShapeKind::Ellipse, 8.0, 8.0), None);
    push(&mut stack, cmd);

    let steps = stack.past().len();
    assert_eq!(steps, 5);
    let end = stack.document().clone();

    for _ in 0..steps {
        assert!(stack.undo().is_some());
    }
    assert!(!stack.can_undo());
    assert_eq!(stack.document(), &origin);

    for _ in 0..steps {
        assert!(stack.redo().is_some());
    }
    assert!(!stack.can_redo());
    assert_eq!(stack.document(), &end);
}

#[test]
fn new_command_after_undo_clears_redo() {
    let (mut session, headline, _, logo) = make_session();
    session.remove_layer(logo);
    session.undo();
    assert!(session.can_redo());

    session.update_layer(
        headline,
        &LayerPatch {
            visible: Some(false),
            ..Default::default()
        },
    );
    assert!(!session.can_redo());
    assert_eq!(session.redo(), None);
}

// ─── Duplicate ──────────────────────────────────────────────────────────

#[test]
fn duplicate_then_undo_restores_exactly() {
    let (mut session, _, button, _) = make_session();
    let before = session.document().clone();
    let copy = session.duplicate_layer(button).unwrap();

    // Every node of the copy has a fresh id.
    let originals = session.document().subtree_ids(button);
    let copies = session.document().subtree_ids(copy);
    assert_eq!(originals.len(), 3);
    assert_eq!(copies.len(), 3);
    assert!(copies.iter().all(|id| !originals.contains(id)));

    session.undo();
    assert_eq!(session.document(), &before);
    assert!(check_document(session.document()).is_empty());

    // Redo brings back the same ids.
    session.redo();
    assert_eq!(session.document().subtree_ids(copy), copies);
}

#[test]
fn history_boundaries_are_noops() {
    let mut session = EditSession::default();
    let before = session.document().clone();
    assert_eq!(session.undo(), None);
    assert_eq!(session.redo(), None);
    assert_eq!(session.document(), &before);
}

#[test]
fn bounded_history_keeps_replay_consistent() {
    let mut session = EditSession::new(SessionConfig {
        max_history: 3,
        ..Default::default()
    });
    let rect = Layer::shape(ShapeKind::Rect, 1.0, 1.0);
    let id = rect.id;
    session.add_layer(rect, None);
    for n in 0..5 {
        session.update_layer(
            id,
            &LayerPatch {
                name: Some(format!("v{n}")),
                ..Default::default()
            },
        );
    }
    assert_eq!(session.history().past().len(), 3);
    assert_eq!(session.history().replay(), *session.document());

    while session.undo().is_some() {}
    assert_eq!(session.document().get(id).unwrap().name, "v1");
}
