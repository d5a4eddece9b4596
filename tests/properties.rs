//! # Property Tests
//!
//! Laws that must hold for arbitrary input: undo/redo inversion,
//! constraint idempotence, font-fit bounds and alias determinism.

use labelsmith::{
    CanvasSize, Element, ElementStore,
    batch::{FlatRecord, alias::resolve_value},
    canvas::constrain,
    text_fit::{MAX_FONT_SIZE, MIN_FONT_SIZE, Size, TextFit},
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddRect(f64, f64, f64, f64),
    AddText(String),
    Move(usize, f64, f64),
    SetX(usize, f64),
    Remove(usize),
    Duplicate(usize),
    ToTop(usize),
    ToBottom(usize),
    Group(usize, usize),
    Ungroup(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0..400.0, 0.0..400.0, 1.0..200.0, 1.0..200.0)
            .prop_map(|(x, y, w, h)| Op::AddRect(x, y, w, h)),
        "[a-z ]{1,12}".prop_map(Op::AddText),
        (0usize..8, -50.0..50.0, -50.0..50.0).prop_map(|(i, dx, dy)| Op::Move(i, dx, dy)),
        (0usize..8, 0.0..400.0).prop_map(|(i, x)| Op::SetX(i, x)),
        (0usize..8).prop_map(Op::Remove),
        (0usize..8).prop_map(Op::Duplicate),
        (0usize..8).prop_map(Op::ToTop),
        (0usize..8).prop_map(Op::ToBottom),
        (0usize..8, 0usize..8).prop_map(|(a, b)| Op::Group(a, b)),
        (0usize..8).prop_map(Op::Ungroup),
    ]
}

fn apply(store: &mut ElementStore, op: &Op) {
    let ids: Vec<_> = store.elements().iter().map(|el| el.id.clone()).collect();
    let pick = |i: usize| ids.get(i % ids.len().max(1)).cloned();
    match op {
        Op::AddRect(x, y, w, h) => {
            store.add(Element::rect().with_bounds(*x, *y, *w, *h));
        }
        Op::AddText(text) => {
            store.add(Element::text(text.as_str()));
        }
        Op::Move(i, dx, dy) => {
            if let Some(mut el) = pick(*i).and_then(|id| store.get(&id).cloned()) {
                el.x += dx;
                el.y += dy;
                let _ = store.update(el);
            }
        }
        Op::SetX(i, x) => {
            if let Some(id) = pick(*i) {
                let _ = store.update_property(&id, "x", serde_json::json!(x));
            }
        }
        Op::Remove(i) => {
            if let Some(id) = pick(*i) {
                let _ = store.remove(&id);
            }
        }
        Op::Duplicate(i) => {
            if let Some(id) = pick(*i) {
                let _ = store.duplicate(&id);
            }
        }
        Op::ToTop(i) => {
            if let Some(id) = pick(*i) {
                let _ = store.move_to_top(&id);
            }
        }
        Op::ToBottom(i) => {
            if let Some(id) = pick(*i) {
                let _ = store.move_to_bottom(&id);
            }
        }
        Op::Group(a, b) => {
            if let (Some(a), Some(b)) = (pick(*a), pick(*b)) {
                let _ = store.group(&[a, b]);
            }
        }
        Op::Ungroup(i) => {
            if let Some(id) = pick(*i) {
                let _ = store.ungroup(&id);
            }
        }
    }
}

fn arb_element() -> impl Strategy<Value = Element> {
    (
        -5000.0..5000.0f64,
        -5000.0..5000.0f64,
        -100.0..3000.0f64,
        -100.0..3000.0f64,
        -720.0..720.0f64,
        any::<bool>(),
    )
        .prop_map(|(x, y, w, h, rotation, text)| {
            let mut el = if text { Element::text("x") } else { Element::rect() };
            el.set_bounds(labelsmith::element::Bounds::new(x, y, w, h));
            el.rotation = rotation;
            el
        })
}

proptest! {
    #[test]
    fn prop_undo_restores_every_step(ops in prop::collection::vec(arb_op(), 1..25)) {
        let mut store = ElementStore::default();
        let before = store.snapshot();
        let base_depth = store.history().undo_depth();

        for op in &ops {
            apply(&mut store, op);
        }
        let after = store.snapshot();
        let steps = store.history().undo_depth() - base_depth;

        for _ in 0..steps {
            prop_assert!(store.undo());
        }
        prop_assert_eq!(store.snapshot(), before);

        for _ in 0..steps {
            prop_assert!(store.redo());
        }
        prop_assert_eq!(store.snapshot(), after);
    }

    #[test]
    fn prop_constrain_is_idempotent(
        el in arb_element(),
        cw in 0.0..2000.0f64,
        ch in 0.0..2000.0f64,
    ) {
        let canvas = CanvasSize::new(cw, ch);
        let once = constrain(&el, &canvas);
        let twice = constrain(&once, &canvas);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.x >= 0.0 && once.y >= 0.0);
        prop_assert!(once.x + once.width <= cw + 1e-9);
        prop_assert!(once.y + once.height <= ch + 1e-9);
    }

    #[test]
    fn prop_fit_is_bounded(
        text in "\\PC{1,60}",
        w in -100.0..3000.0f64,
        h in -100.0..3000.0f64,
    ) {
        let size = TextFit::default().fit(&text, "Arial", Size::new(w, h));
        prop_assert!((MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size), "{} out of range", size);
    }

    #[test]
    fn prop_autosize_inverts_fit(text in "[A-Za-z0-9][A-Za-z0-9 ]{0,39}", size in 10u32..=72) {
        let fit = TextFit::default();
        let size = size as f64;
        let b = fit.autosize(&text, size, "Arial");
        let back = fit.fit(&text, "Arial", b);
        prop_assert!((back - size).abs() <= 1.0, "{} -> {:?} -> {}", size, b, back);
    }

    #[test]
    fn prop_item_key_resolves_under_any_casing(upper in prop::collection::vec(any::<bool>(), 7)) {
        let key: String = "itemkey"
            .chars()
            .zip(upper)
            .map(|(c, u)| if u { c.to_ascii_uppercase() } else { c })
            .collect();
        let record: FlatRecord = [
            (key.clone(), "A1".to_string()),
            ("description".to_string(), "Chicken".to_string()),
        ]
        .into_iter()
        .collect();
        prop_assert_eq!(resolve_value(&record, "itemKey"), Some("A1".to_string()), "key {}", key);
    }
}
