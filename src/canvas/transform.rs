//! Boundary constraint, canvas resize and multi-select geometry.
//!
//! Drag and resize follow a candidate → constrain → commit flow: the caller
//! builds the proposed geometry, passes it through [`Constraint::apply`]
//! (or [`Constraint::apply_soft`] while the pointer is still down) and only
//! then writes it to the store.

use crate::config::StoreConfig;
use crate::element::{Bounds, Element, ElementId, ElementKind};
use crate::text_fit::MIN_FONT_SIZE;

use super::CanvasSize;

/// Normalize degrees into `[0, 360)`. Non-finite input becomes 0.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    if r >= 360.0 { 0.0 } else { r }
}

/// Size floors applied while constraining.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub min_size: f64,
    pub min_line_thickness: f64,
}

impl Default for Constraint {
    fn default() -> Self {
        Self::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for Constraint {
    fn from(config: &StoreConfig) -> Self {
        Self {
            min_size: config.min_element_size,
            min_line_thickness: config.min_line_thickness,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

impl Constraint {
    /// Hard constraint: clip the element box into the canvas.
    ///
    /// Width and height are first raised to their minimums, then shrunk to
    /// the canvas if even a zero origin would overflow. The origin is then
    /// clamped so the box lies inside `[0, w] x [0, h]`. Idempotent.
    pub fn apply(&self, element: &Element, canvas: &CanvasSize) -> Element {
        let cw = finite_or_zero(canvas.width).max(0.0);
        let ch = finite_or_zero(canvas.height).max(0.0);

        let mut e = element.clone();
        e.enforce_min_size(self.min_size, self.min_line_thickness);
        e.width = e.width.min(cw);
        e.height = e.height.min(ch);
        e.x = finite_or_zero(e.x).min(cw - e.width).max(0.0);
        e.y = finite_or_zero(e.y).min(ch - e.height).max(0.0);
        e.rotation = normalize_rotation(e.rotation);
        e
    }

    /// Advisory constraint used while dragging: up to half of the element
    /// may hang off any edge. Sizes are only floored, never shrunk.
    pub fn apply_soft(&self, element: &Element, canvas: &CanvasSize) -> Element {
        let mut e = element.clone();
        e.enforce_min_size(self.min_size, self.min_line_thickness);
        let half_w = e.width / 2.0;
        let half_h = e.height / 2.0;
        e.x = finite_or_zero(e.x).min(canvas.width - half_w).max(-half_w);
        e.y = finite_or_zero(e.y).min(canvas.height - half_h).max(-half_h);
        e
    }
}

/// [`Constraint::apply`] with default size floors.
pub fn constrain(element: &Element, canvas: &CanvasSize) -> Element {
    Constraint::default().apply(element, canvas)
}

/// [`Constraint::apply_soft`] with default size floors.
pub fn constrain_soft(element: &Element, canvas: &CanvasSize) -> Element {
    Constraint::default().apply_soft(element, canvas)
}

fn scale_element(element: &mut Element, sx: f64, sy: f64, min_font: f64) {
    element.x *= sx;
    element.y *= sy;
    element.width *= sx;
    element.height *= sy;
    match &mut element.kind {
        ElementKind::Text(t) => {
            let scaled = (t.font_size * sx.min(sy) + 1e-9).floor();
            t.font_size = scaled.max(min_font);
        }
        ElementKind::Group(g) => {
            for child in &mut g.elements {
                scale_element(child, sx, sy, min_font);
            }
        }
        _ => {}
    }
}

/// Rescale every element from `old` canvas to `new` canvas.
///
/// Geometry scales per axis; text font sizes scale by the smaller factor,
/// rounded down and floored at `min_font_size`. Group children are scaled
/// in their group-relative frame. An invalid size on either side returns
/// the elements unchanged.
pub fn resize_canvas(
    elements: &[Element],
    old: &CanvasSize,
    new: &CanvasSize,
    min_font_size: f64,
) -> Vec<Element> {
    let Some((sx, sy)) = old.scale_to(new) else {
        tracing::debug!("resize_canvas: invalid canvas size, leaving elements unchanged");
        return elements.to_vec();
    };
    elements
        .iter()
        .map(|el| {
            let mut el = el.clone();
            scale_element(&mut el, sx, sy, min_font_size);
            el
        })
        .collect()
}

/// Shorthand for [`resize_canvas`] with the default minimum font size.
pub fn resize_canvas_default(elements: &[Element], old: &CanvasSize, new: &CanvasSize) -> Vec<Element> {
    resize_canvas(elements, old, new, MIN_FONT_SIZE)
}

/// Union of the elements' boxes, or `None` for an empty selection.
pub fn selection_bounds<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Option<Bounds> {
    elements
        .into_iter()
        .map(Element::bounds)
        .reduce(|acc, b| acc.union(&b))
}

/// Edge or center to line a selection up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    CenterHorizontal,
    Right,
    Top,
    CenterVertical,
    Bottom,
}

/// New origins that align each element to the selection bounds.
///
/// Returns `(id, x, y)` only for elements that actually move. Locked
/// elements stay put.
pub fn align_elements(elements: &[Element], alignment: Alignment) -> Vec<(ElementId, f64, f64)> {
    let Some(target) = selection_bounds(elements) else {
        return Vec::new();
    };

    elements
        .iter()
        .filter(|el| !el.locked)
        .filter_map(|el| {
            let (x, y) = match alignment {
                Alignment::Left => (target.x, el.y),
                Alignment::Right => (target.right() - el.width, el.y),
                Alignment::CenterHorizontal => (target.center_x() - el.width / 2.0, el.y),
                Alignment::Top => (el.x, target.y),
                Alignment::Bottom => (el.x, target.bottom() - el.height),
                Alignment::CenterVertical => (el.x, target.center_y() - el.height / 2.0),
            };
            let moved = (x - el.x).abs() > f64::EPSILON || (y - el.y).abs() > f64::EPSILON;
            moved.then(|| (el.id.clone(), x, y))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, GroupProps, LineProps};
    use pretty_assertions::assert_eq;

    fn canvas() -> CanvasSize {
        CanvasSize::new(400.0, 300.0)
    }

    #[test]
    fn test_constrain_inside_is_unchanged() {
        let el = Element::rect().with_bounds(10.0, 10.0, 50.0, 20.0);
        assert_eq!(constrain(&el, &canvas()), el);
    }

    #[test]
    fn test_constrain_clamps_negative_origin() {
        let el = Element::rect().with_bounds(-30.0, -5.0, 50.0, 20.0);
        let c = constrain(&el, &canvas());
        assert_eq!(c.bounds(), Bounds::new(0.0, 0.0, 50.0, 20.0));
    }

    #[test]
    fn test_constrain_pushes_back_from_far_edge() {
        let el = Element::rect().with_bounds(380.0, 290.0, 50.0, 20.0);
        let c = constrain(&el, &canvas());
        assert_eq!(c.bounds(), Bounds::new(350.0, 280.0, 50.0, 20.0));
    }

    #[test]
    fn test_constrain_shrinks_oversized() {
        let el = Element::rect().with_bounds(100.0, 100.0, 900.0, 20.0);
        let c = constrain(&el, &canvas());
        assert_eq!(c.bounds(), Bounds::new(0.0, 100.0, 400.0, 20.0));
    }

    #[test]
    fn test_constrain_raises_to_min_size() {
        let el = Element::rect().with_bounds(10.0, 10.0, -4.0, 1.0);
        let c = constrain(&el, &canvas());
        assert_eq!((c.width, c.height), (5.0, 5.0));

        let line = Element::new(ElementKind::Line(LineProps::default()))
            .with_bounds(0.0, 0.0, 100.0, 0.2);
        assert_eq!(constrain(&line, &canvas()).height, 1.0);
    }

    #[test]
    fn test_constrain_non_finite_origin() {
        let el = Element::rect().with_bounds(f64::NAN, f64::INFINITY, 10.0, 10.0);
        let c = constrain(&el, &canvas());
        assert_eq!((c.x, c.y), (0.0, 0.0));
    }

    #[test]
    fn test_constrain_tiny_canvas() {
        let tiny = CanvasSize::new(3.0, 3.0);
        let el = Element::rect().with_bounds(1.0, 1.0, 10.0, 10.0);
        let once = constrain(&el, &tiny);
        assert_eq!(once.bounds(), Bounds::new(0.0, 0.0, 3.0, 3.0));
        assert_eq!(constrain(&once, &tiny), once);
    }

    #[test]
    fn test_constrain_normalizes_rotation() {
        let mut el = Element::rect().with_bounds(0.0, 0.0, 10.0, 10.0);
        el.rotation = -90.0;
        assert_eq!(constrain(&el, &canvas()).rotation, 270.0);
        el.rotation = 720.0;
        assert_eq!(constrain(&el, &canvas()).rotation, 0.0);
    }

    #[test]
    fn test_soft_constraint_allows_half_overhang() {
        let c = Constraint::default();
        let el = Element::rect().with_bounds(-40.0, 295.0, 50.0, 20.0);
        let soft = c.apply_soft(&el, &canvas());
        assert_eq!((soft.x, soft.y), (-25.0, 290.0));
        assert_eq!(constrain_soft(&el, &canvas()), soft);
        let hard = c.apply(&soft, &canvas());
        assert_eq!((hard.x, hard.y), (0.0, 280.0));
    }

    #[test]
    fn test_resize_canvas_halves_text() {
        let el = Element::text("Lot").with_bounds(100.0, 40.0, 200.0, 60.0);
        let old = CanvasSize::new(400.0, 400.0);
        let new = CanvasSize::new(200.0, 200.0);
        let out = resize_canvas_default(&[el], &old, &new);
        assert_eq!(out[0].bounds(), Bounds::new(50.0, 20.0, 100.0, 30.0));
        match &out[0].kind {
            ElementKind::Text(t) => assert_eq!(t.font_size, 10.0),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_resize_canvas_font_uses_min_axis_and_floor() {
        let el = Element::text("Lot");
        let out = resize_canvas_default(
            &[el],
            &CanvasSize::new(100.0, 100.0),
            &CanvasSize::new(300.0, 130.0),
        );
        match &out[0].kind {
            // 20 * 1.3 = 26
            ElementKind::Text(t) => assert_eq!(t.font_size, 26.0),
            _ => panic!("expected text"),
        }

        let shrunk = resize_canvas_default(
            &out,
            &CanvasSize::new(100.0, 100.0),
            &CanvasSize::new(10.0, 10.0),
        );
        match &shrunk[0].kind {
            ElementKind::Text(t) => assert_eq!(t.font_size, MIN_FONT_SIZE),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_resize_canvas_scales_group_children() {
        let child = Element::text("x").with_bounds(10.0, 10.0, 20.0, 20.0);
        let group = Element::new(ElementKind::Group(GroupProps { elements: vec![child] }))
            .with_bounds(100.0, 100.0, 40.0, 40.0);
        let out = resize_canvas_default(
            &[group],
            &CanvasSize::new(400.0, 400.0),
            &CanvasSize::new(800.0, 800.0),
        );
        assert_eq!(out[0].bounds(), Bounds::new(200.0, 200.0, 80.0, 80.0));
        assert_eq!(out[0].children()[0].bounds(), Bounds::new(20.0, 20.0, 40.0, 40.0));
    }

    #[test]
    fn test_resize_canvas_invalid_is_identity() {
        let el = Element::rect().with_bounds(1.0, 2.0, 30.0, 40.0);
        let out = resize_canvas_default(
            &[el.clone()],
            &CanvasSize::new(0.0, 100.0),
            &CanvasSize::new(200.0, 200.0),
        );
        assert_eq!(out, vec![el]);
    }

    #[test]
    fn test_selection_bounds() {
        let a = Element::rect().with_bounds(10.0, 10.0, 10.0, 10.0);
        let b = Element::rect().with_bounds(50.0, 30.0, 10.0, 20.0);
        assert_eq!(selection_bounds([&a, &b]), Some(Bounds::new(10.0, 10.0, 50.0, 40.0)));
        assert_eq!(selection_bounds(std::iter::empty::<&Element>()), None);
    }

    #[test]
    fn test_align_left_and_center() {
        let a = Element::rect().with_id("a").with_bounds(10.0, 10.0, 10.0, 10.0);
        let b = Element::rect().with_id("b").with_bounds(50.0, 30.0, 30.0, 20.0);
        let moves = align_elements(&[a.clone(), b.clone()], Alignment::Left);
        assert_eq!(moves, vec![(ElementId::from("b"), 10.0, 30.0)]);

        let moves = align_elements(&[a, b], Alignment::CenterVertical);
        // Selection spans y 10..50, center 30
        assert_eq!(
            moves,
            vec![(ElementId::from("a"), 10.0, 25.0), (ElementId::from("b"), 50.0, 20.0)]
        );
    }

    #[test]
    fn test_align_skips_locked() {
        let a = Element::rect().with_id("a").with_bounds(10.0, 10.0, 10.0, 10.0);
        let b = Element::rect().with_id("b").with_bounds(50.0, 30.0, 30.0, 20.0).with_locked(true);
        assert!(align_elements(&[a, b], Alignment::Left).is_empty());
    }
}
