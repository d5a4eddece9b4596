//! # Element Model
//!
//! A single sum type for everything that can be placed on a label.
//! `Element` carries the geometry and interaction flags every element shares;
//! `ElementKind` is the tagged variant with the type-specific payload.
//!
//! ```
//! use labelsmith::element::*;
//!
//! // Rust construction
//! let el = Element::new(ElementKind::Text(TextProps::new("BEST BEFORE")))
//!     .with_bounds(10.0, 10.0, 120.0, 24.0);
//!
//! // JSON deserialization (the persisted template shape)
//! let parsed: Element = serde_json::from_str(
//!     r#"{"id":"e1","type":"qr","x":0,"y":0,"width":80,"height":80,"value":"LOT-7"}"#,
//! ).unwrap();
//! assert_eq!(parsed.type_name(), "qr");
//! # let _ = el;
//! ```

pub mod types;

pub use types::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// IDENTITY
// ============================================================================

/// Opaque element identifier, stable for the lifetime of a template.
///
/// Fresh ids are UUIDv4 strings; ids loaded from a template are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::generate()
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Axis-aligned box in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

// ============================================================================
// ELEMENT
// ============================================================================

/// Type-specific payload, discriminated by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextProps),
    Barcode(BarcodeProps),
    Qr(QrProps),
    Rect(ShapeProps),
    Ellipse(ShapeProps),
    Line(LineProps),
    Image(ImageProps),
    Group(GroupProps),
}

/// Children of a group. Child coordinates are relative to the group origin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupProps {
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl ElementMeta for GroupProps {
    fn label() -> &'static str { "Group" }
    fn editor_default() -> Self { Self::default() }
}

impl ElementKind {
    /// Wire discriminant.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "text",
            ElementKind::Barcode(_) => "barcode",
            ElementKind::Qr(_) => "qr",
            ElementKind::Rect(_) => "rect",
            ElementKind::Ellipse(_) => "ellipse",
            ElementKind::Line(_) => "line",
            ElementKind::Image(_) => "image",
            ElementKind::Group(_) => "group",
        }
    }

    /// Display label, taken from the payload's [`ElementMeta`].
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => TextProps::label(),
            ElementKind::Barcode(_) => BarcodeProps::label(),
            ElementKind::Qr(_) => QrProps::label(),
            ElementKind::Rect(_) => "Rectangle",
            ElementKind::Ellipse(_) => "Ellipse",
            ElementKind::Line(_) => LineProps::label(),
            ElementKind::Image(_) => ImageProps::label(),
            ElementKind::Group(_) => GroupProps::label(),
        }
    }

    /// Editor default payload for a type name, or `None` if unknown.
    pub fn editor_default(type_name: &str) -> Option<Self> {
        Some(match type_name {
            "text" => ElementKind::Text(TextProps::editor_default()),
            "barcode" => ElementKind::Barcode(BarcodeProps::editor_default()),
            "qr" => ElementKind::Qr(QrProps::editor_default()),
            "rect" => ElementKind::Rect(ShapeProps::editor_default()),
            "ellipse" => ElementKind::Ellipse(ShapeProps::editor_default()),
            "line" => ElementKind::Line(LineProps::editor_default()),
            "image" => ElementKind::Image(ImageProps::editor_default()),
            "group" => ElementKind::Group(GroupProps::editor_default()),
            _ => return None,
        })
    }

    /// Default footprint for a newly placed element of this kind.
    fn default_size(&self) -> (f64, f64) {
        match self {
            ElementKind::Text(_) => (200.0, 40.0),
            ElementKind::Barcode(_) => (200.0, 80.0),
            ElementKind::Qr(_) => (100.0, 100.0),
            ElementKind::Rect(_) | ElementKind::Ellipse(_) => (100.0, 60.0),
            ElementKind::Line(_) => (200.0, 2.0),
            ElementKind::Image(_) => (100.0, 100.0),
            ElementKind::Group(_) => (100.0, 100.0),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> f64 {
    100.0
}

fn default_height() -> f64 {
    40.0
}

/// One placeable unit on the label canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(default)]
    pub id: ElementId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Degrees, normalized into `[0, 360)` by the transform engine.
    #[serde(default)]
    pub rotation: f64,
    /// Paint order key; higher draws later. Ties fall back to insertion order.
    #[serde(default)]
    pub layer: i64,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Blocks geometry mutation and drag.
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub draggable: bool,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a fresh id and the kind's default footprint.
    pub fn new(kind: ElementKind) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id: ElementId::generate(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            layer: 0,
            visible: true,
            locked: false,
            draggable: true,
            kind,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(ElementKind::Text(TextProps::new(content)))
    }

    pub fn barcode(value: impl Into<String>, format: BarcodeFormat) -> Self {
        Self::new(ElementKind::Barcode(BarcodeProps::new(value, format)))
    }

    pub fn qr(value: impl Into<String>) -> Self {
        Self::new(ElementKind::Qr(QrProps::new(value)))
    }

    pub fn rect() -> Self {
        Self::new(ElementKind::Rect(ShapeProps::default()))
    }

    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.set_bounds(Bounds::new(x, y, width, height));
        self
    }

    pub fn with_layer(mut self, layer: i64) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_bounds(&mut self, b: Bounds) {
        self.x = b.x;
        self.y = b.y;
        self.width = b.width;
        self.height = b.height;
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ElementKind::Group(_))
    }

    /// Barcode or QR: elements that need a rasterized symbol.
    pub fn is_symbolic_code(&self) -> bool {
        matches!(self.kind, ElementKind::Barcode(_) | ElementKind::Qr(_))
    }

    pub fn children(&self) -> &[Element] {
        match &self.kind {
            ElementKind::Group(g) => &g.elements,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Element>> {
        match &mut self.kind {
            ElementKind::Group(g) => Some(&mut g.elements),
            _ => None,
        }
    }

    /// Visit this element and every descendant, depth-first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Mutable variant of [`Element::walk`].
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        if let Some(children) = self.children_mut() {
            for child in children {
                child.walk_mut(f);
            }
        }
    }

    /// Give this element and all descendants fresh ids.
    pub fn regenerate_ids(&mut self) {
        self.walk_mut(&mut |el| el.id = ElementId::generate());
    }

    /// Smallest legal height for this element: lines store thickness in
    /// `height` and use their own floor.
    pub fn min_height(&self, min_size: f64, min_line_thickness: f64) -> f64 {
        match self.kind {
            ElementKind::Line(_) => min_line_thickness,
            _ => min_size,
        }
    }

    /// Raise width/height to their minimums. NaN collapses to the minimum.
    pub fn enforce_min_size(&mut self, min_size: f64, min_line_thickness: f64) {
        let min_h = self.min_height(min_size, min_line_thickness);
        self.width = if self.width.is_nan() { min_size } else { self.width.max(min_size) };
        self.height = if self.height.is_nan() { min_h } else { self.height.max(min_h) };
    }
}

/// Parse a JSON array of elements, skipping entries that fail to parse.
///
/// A damaged entry costs that entry only; the rest of the label survives.
pub fn parse_elements_lenient(value: serde_json::Value) -> Vec<Element> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            tracing::warn!("elements: expected array, got {}", json_kind(&other));
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| match serde_json::from_value::<Element>(v) {
            Ok(el) => Some(el),
            Err(e) => {
                tracing::warn!("elements[{}]: skipping malformed element: {}", i, e);
                None
            }
        })
        .collect()
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_element_json_shape() {
        let el = Element::text("Hello").with_id("e1").with_bounds(10.0, 20.0, 100.0, 30.0);
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["id"], "e1");
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["fontSize"], 20.0);
        assert_eq!(json["x"], 10.0);
    }

    #[test]
    fn test_element_json_roundtrip_group() {
        let child = Element::rect().with_id("c1").with_bounds(5.0, 5.0, 20.0, 20.0);
        let group = Element::new(ElementKind::Group(GroupProps { elements: vec![child] }))
            .with_id("g1");
        let json = serde_json::to_string(&group).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, group);
        assert_eq!(back.children().len(), 1);
    }

    #[test]
    fn test_missing_common_fields_use_defaults() {
        let el: Element = serde_json::from_str(r#"{"type":"line"}"#).unwrap();
        assert!(el.visible);
        assert!(!el.locked);
        assert!(el.draggable);
        assert!(!el.id.as_str().is_empty());
    }

    #[test]
    fn test_parse_elements_lenient_skips_bad_entries() {
        let value = serde_json::json!([
            {"id": "a", "type": "text", "text": "ok"},
            {"id": "b", "type": "hologram"},
            42,
            {"id": "c", "type": "rect"}
        ]);
        let els = parse_elements_lenient(value);
        let ids: Vec<&str> = els.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_parse_elements_lenient_non_array() {
        assert!(parse_elements_lenient(serde_json::json!({"oops": true})).is_empty());
    }

    #[test]
    fn test_regenerate_ids_reaches_children() {
        let child = Element::rect().with_id("c1");
        let mut group = Element::new(ElementKind::Group(GroupProps { elements: vec![child] }))
            .with_id("g1");
        group.regenerate_ids();
        assert_ne!(group.id.as_str(), "g1");
        assert_ne!(group.children()[0].id.as_str(), "c1");
    }

    #[test]
    fn test_enforce_min_size_line_exception() {
        let mut line = Element::new(ElementKind::Line(LineProps::default()))
            .with_bounds(0.0, 0.0, 1.0, 0.5);
        line.enforce_min_size(5.0, 1.0);
        assert_eq!(line.width, 5.0);
        assert_eq!(line.height, 1.0);

        let mut rect = Element::rect().with_bounds(0.0, 0.0, f64::NAN, -3.0);
        rect.enforce_min_size(5.0, 1.0);
        assert_eq!(rect.width, 5.0);
        assert_eq!(rect.height, 5.0);
    }

    #[test]
    fn test_bounds_union() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Bounds::new(0.0, 0.0, 30.0, 15.0));
    }
}
