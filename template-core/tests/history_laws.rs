//! Undo/redo laws.
//!
//! - Round-trip: undo n times then redo n times restores the state
//! - Bounded past
//! - New edits invalidate redo
//! - Alignment idempotence

use proptest::prelude::*;
use template_core::{
    align::align, Alignment, CanvasElement, EditorConfig, EditorSession, ElementKind, Position,
    PropertyPatch, Size,
};

fn seeded_session() -> EditorSession {
    let mut session = EditorSession::new();
    let kinds = [
        ElementKind::Text,
        ElementKind::Rectangle,
        ElementKind::Table,
        ElementKind::QrCode,
    ];
    for (i, kind) in kinds.into_iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = i as f64 * 50.0;
        session.add_element(CanvasElement::with_id(
            format!("seed{i}").into(),
            kind,
            Position::new(x, x),
        ));
    }
    session.clear_history();
    session
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize, f64, f64),
    Delete(usize),
    Move(usize, f64, f64),
    Resize(usize, f64, f64),
    Rotate(usize, f64),
    Rename(usize),
    Front(usize),
    Back(usize),
    Lock(usize),
    Hide(usize),
    AlignLeft,
    AlignCenter,
    Duplicate(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..19, -500.0f64..500.0, -500.0f64..500.0).prop_map(|(k, x, y)| Op::Add(k, x, y)),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), -100.0f64..100.0, -100.0f64..100.0)
            .prop_map(|(i, x, y)| Op::Move(i, x, y)),
        (any::<usize>(), 1.0f64..400.0, 1.0f64..400.0).prop_map(|(i, w, h)| Op::Resize(i, w, h)),
        (any::<usize>(), -360.0f64..360.0).prop_map(|(i, r)| Op::Rotate(i, r)),
        any::<usize>().prop_map(Op::Rename),
        any::<usize>().prop_map(Op::Front),
        any::<usize>().prop_map(Op::Back),
        any::<usize>().prop_map(Op::Lock),
        any::<usize>().prop_map(Op::Hide),
        Just(Op::AlignLeft),
        Just(Op::AlignCenter),
        any::<usize>().prop_map(Op::Duplicate),
    ]
}

fn apply(session: &mut EditorSession, op: &Op) {
    let ids = session.document().ids();
    let pick = |i: usize| ids.get(i % ids.len().max(1)).cloned();
    match *op {
        Op::Add(k, x, y) => {
            session.add_element(CanvasElement::new(ElementKind::ALL[k], Position::new(x, y)));
        }
        Op::Delete(i) => {
            if let Some(id) = pick(i) {
                session.delete_element(&id);
            }
        }
        Op::Move(i, x, y) => {
            if let Some(id) = pick(i) {
                session
                    .move_elements(&[id], Position::new(x, y))
                    .expect("finite delta");
            }
        }
        Op::Resize(i, w, h) => {
            if let Some(id) = pick(i) {
                session.resize_element(&id, Size::new(w, h)).expect("finite size");
            }
        }
        Op::Rotate(i, r) => {
            if let Some(id) = pick(i) {
                session.rotate_element(&id, r).expect("finite rotation");
            }
        }
        Op::Rename(i) => {
            if let Some(id) = pick(i) {
                let patch = PropertyPatch {
                    name: Some(format!("renamed-{i}")),
                    ..PropertyPatch::default()
                };
                session.update_element(&id, &patch).expect("valid patch");
            }
        }
        Op::Front(i) => {
            if let Some(id) = pick(i) {
                session.bring_to_front(&id);
            }
        }
        Op::Back(i) => {
            if let Some(id) = pick(i) {
                session.send_to_back(&id);
            }
        }
        Op::Lock(i) => {
            if let Some(id) = pick(i) {
                session.toggle_lock(&id);
            }
        }
        Op::Hide(i) => {
            if let Some(id) = pick(i) {
                session.toggle_visibility(&id);
            }
        }
        Op::AlignLeft => {
            session.align_left(&ids);
        }
        Op::AlignCenter => {
            session.align_center(&ids);
        }
        Op::Duplicate(i) => {
            if let Some(id) = pick(i) {
                session.duplicate_element(&id);
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_undo_all_restores_initial_state(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut session = seeded_session();
        let initial = session.document().clone();
        for op in &ops {
            apply(&mut session, op);
        }
        let end = session.document().clone();
        let n = session.history().past_len();

        for _ in 0..n {
            prop_assert!(session.undo());
        }
        prop_assert!(!session.undo());
        prop_assert_eq!(session.document(), &initial);

        for _ in 0..n {
            prop_assert!(session.redo());
        }
        prop_assert!(!session.redo());
        prop_assert_eq!(session.document(), &end);
    }

    #[test]
    fn prop_partial_undo_redo_round_trip(
        ops in prop::collection::vec(arb_op(), 1..30),
        k in 0usize..30,
    ) {
        let mut session = seeded_session();
        for op in &ops {
            apply(&mut session, op);
        }
        let end = session.document().clone();
        let k = k.min(session.history().past_len());

        for _ in 0..k {
            session.undo();
        }
        for _ in 0..k {
            session.redo();
        }
        prop_assert_eq!(session.document(), &end);
        for id in session.selection() {
            prop_assert!(session.document().contains(id));
        }
    }

    #[test]
    fn prop_align_is_idempotent(
        boxes in prop::collection::vec(
            (-500.0f64..500.0, -500.0f64..500.0, 1.0f64..300.0, 1.0f64..300.0),
            1..8,
        ),
        mode in 0usize..6,
    ) {
        let alignment = [
            Alignment::Left,
            Alignment::Right,
            Alignment::Top,
            Alignment::Bottom,
            Alignment::Center,
            Alignment::Middle,
        ][mode];
        let elements: Vec<CanvasElement> = boxes
            .iter()
            .enumerate()
            .map(|(i, (x, y, w, h))| {
                let position = Position::new(*x, *y);
                CanvasElement::with_id(format!("e{i}").into(), ElementKind::Rectangle, position)
                    .with_size(Size::new(*w, *h))
            })
            .collect();
        let refs: Vec<&CanvasElement> = elements.iter().collect();
        let once = align(&refs, alignment);

        let aligned: Vec<CanvasElement> = elements
            .iter()
            .zip(&once)
            .map(|(e, (_, p))| {
                CanvasElement::with_id(e.id().clone(), e.kind(), *p).with_size(e.size())
            })
            .collect();
        let refs: Vec<&CanvasElement> = aligned.iter().collect();
        let twice = align(&refs, alignment);

        for ((_, a), (_, b)) in once.iter().zip(&twice) {
            prop_assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
        }
    }
}

#[test]
fn test_align_left_twice_is_exact() {
    let mut session = seeded_session();
    let ids = session.document().ids();
    session.align_left(&ids);
    let once = session.document().clone();
    let recorded = session.history().past_len();
    session.align_left(&ids);
    assert_eq!(session.document(), &once);
    assert_eq!(session.history().past_len(), recorded);
}

#[test]
fn test_history_keeps_last_hundred() {
    let mut session = EditorSession::new();
    let id = session.add_element(CanvasElement::new(ElementKind::Circle, Position::new(0.0, 0.0)));
    session.clear_history();

    for _ in 0..150 {
        session
            .move_elements(&[id.clone()], Position::new(1.0, 0.0))
            .expect("finite delta");
    }
    assert_eq!(session.history().past_len(), 100);

    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 100);
    // The 50 oldest moves are gone for good.
    assert_eq!(session.get_element(&id).map(|e| e.position().x), Some(50.0));
}

#[test]
fn test_new_edit_clears_redo() {
    let mut session = EditorSession::new();
    let id = session.add_element(CanvasElement::new(ElementKind::Text, Position::new(0.0, 0.0)));
    session
        .move_elements(&[id.clone()], Position::new(5.0, 5.0))
        .expect("finite delta");
    assert!(session.undo());
    assert!(session.can_redo());

    session.toggle_lock(&id);
    assert!(!session.can_redo());
    assert_eq!(session.history().future_len(), 0);
    assert!(!session.redo());
}

#[test]
fn test_configured_capacity() {
    let mut session = EditorSession::with_config(EditorConfig {
        history_capacity: 10,
        ..EditorConfig::default()
    });
    for i in 0..25 {
        session.add_element(CanvasElement::with_id(
            format!("e{i}").into(),
            ElementKind::Line,
            Position::new(0.0, 0.0),
        ));
    }
    assert_eq!(session.history().past_len(), 10);
    assert_eq!(session.history().capacity(), 10);
}
