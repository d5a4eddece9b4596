//! # Templates
//!
//! The persisted form of a label: metadata plus a content blob of
//! `{elements, canvasSize}`.
//!
//! Two JSON shapes are accepted:
//!
//! ```json
//! { "name": "Frozen 4x6", "paperSize": "4x6", "elements": [...], "canvasSize": {...} }
//! { "name": "Frozen 4x6", "paperSize": "4x6", "content": "{\"elements\":[...]}" }
//! ```
//!
//! The second is what the template backend stores ([`Template::to_stored_value`]);
//! `content` may also arrive as an inline object. Content that cannot be
//! parsed degrades to an empty label on the paper's canvas; individual
//! malformed elements are skipped. Only a document that is not JSON at all
//! is an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canvas::{CanvasSize, Orientation, PaperSize};
use crate::element::{Element, parse_elements_lenient};
use crate::error::LabelResult;

/// Content blob: the element list and canvas it was designed on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContent {
    pub elements: Vec<Element>,
    pub canvas_size: CanvasSize,
}

impl TemplateContent {
    pub fn to_json(&self) -> LabelResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Lenient split of a content object into elements and canvas.
fn content_parts(mut value: Value) -> (Vec<Element>, Option<CanvasSize>) {
    let Some(obj) = value.as_object_mut() else {
        tracing::warn!("template content is not an object, using empty label");
        return (Vec::new(), None);
    };
    let elements = obj
        .remove("elements")
        .map(parse_elements_lenient)
        .unwrap_or_default();
    let canvas = obj.remove("canvasSize").and_then(|v| {
        match serde_json::from_value::<CanvasSize>(v) {
            Ok(c) if c.is_valid() => Some(c),
            Ok(c) => {
                tracing::warn!("template canvas {}x{} is invalid, using default", c.width, c.height);
                None
            }
            Err(e) => {
                tracing::warn!("template canvasSize unreadable: {}", e);
                None
            }
        }
    });
    (elements, canvas)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A reusable label design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_key: String,
    #[serde(default)]
    pub customer_key: String,
    #[serde(default)]
    pub paper_size: PaperSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub canvas_size: CanvasSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new("Untitled", PaperSize::default(), Orientation::default())
    }
}

impl Template {
    /// Empty template on the given paper.
    pub fn new(name: impl Into<String>, paper_size: PaperSize, orientation: Orientation) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            product_key: String::new(),
            customer_key: String::new(),
            paper_size,
            orientation,
            elements: Vec::new(),
            canvas_size: paper_size.canvas_size(orientation),
            version: None,
            updated_at: None,
        }
    }

    /// Parse either template shape. Bad content degrades; bad JSON fails.
    pub fn from_json(json: &str) -> LabelResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value))
    }

    /// Lenient conversion from an already parsed document.
    pub fn from_value(mut value: Value) -> Self {
        let (elements, canvas) = match value.as_object_mut() {
            Some(obj) => {
                let mut content = match obj.remove("content") {
                    None | Some(Value::Null) => serde_json::Map::new(),
                    Some(Value::Object(parsed)) => parsed,
                    Some(Value::String(blob)) => match serde_json::from_str::<Value>(&blob) {
                        Ok(Value::Object(parsed)) => parsed,
                        Ok(_) | Err(_) => {
                            tracing::warn!("template content blob unreadable, using empty label");
                            serde_json::Map::new()
                        }
                    },
                    Some(other) => {
                        tracing::warn!("template content is {}, using empty label", json_kind(&other));
                        serde_json::Map::new()
                    }
                };
                for key in ["elements", "canvasSize"] {
                    if let Some(v) = obj.remove(key) {
                        content.insert(key.to_string(), v);
                    }
                }
                content_parts(Value::Object(content))
            }
            None => (Vec::new(), None),
        };

        let mut template: Template = match serde_json::from_value(value) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("template metadata unreadable ({}), using defaults", e);
                Template::default()
            }
        };
        template.canvas_size = canvas.unwrap_or_else(|| template.paper_canvas());
        template.elements = elements;
        template
    }

    pub fn to_json(&self) -> LabelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Content blob for the backend.
    pub fn content(&self) -> TemplateContent {
        TemplateContent {
            elements: self.elements.clone(),
            canvas_size: self.canvas_size,
        }
    }

    /// Backend shape: metadata with the content as a JSON string.
    pub fn to_stored_value(&self) -> LabelResult<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("elements");
            obj.remove("canvasSize");
            obj.insert("content".to_string(), Value::String(self.content().to_json()?));
        }
        Ok(value)
    }

    /// Canvas implied by paper size and orientation.
    pub fn paper_canvas(&self) -> CanvasSize {
        self.paper_size.canvas_size(self.orientation)
    }

    /// Mark as saved: bump the version and stamp the time.
    pub fn touch(&mut self) {
        self.version = Some(self.version.map_or(1, |v| v + 1));
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inline_shape() {
        let t = Template::from_json(
            r#"{
                "name": "Frozen",
                "productKey": "P1",
                "paperSize": "4x4",
                "orientation": "landscape",
                "elements": [{"id": "e1", "type": "text", "text": "Hi"}],
                "canvasSize": {"width": 384, "height": 384}
            }"#,
        )
        .unwrap();
        assert_eq!(t.name, "Frozen");
        assert_eq!(t.product_key, "P1");
        assert_eq!(t.paper_size, PaperSize::Label4x4);
        assert_eq!(t.orientation, Orientation::Landscape);
        assert_eq!(t.elements.len(), 1);
        assert_eq!(t.canvas_size, CanvasSize::new(384.0, 384.0));
    }

    #[test]
    fn test_content_blob_shape() {
        let content = r#"{"elements":[{"id":"q","type":"qr","value":"X"}],"canvasSize":{"width":200,"height":100}}"#;
        let doc = serde_json::json!({"name": "Blob", "content": content, "version": 3});
        let t = Template::from_value(doc);
        assert_eq!(t.elements.len(), 1);
        assert_eq!(t.canvas_size, CanvasSize::new(200.0, 100.0));
        assert_eq!(t.version, Some(3));
    }

    #[test]
    fn test_corrupt_content_falls_back() {
        let doc = serde_json::json!({"name": "Broken", "paperSize": "2x1", "content": "{not json"});
        let t = Template::from_value(doc);
        assert!(t.elements.is_empty());
        assert_eq!(t.canvas_size, PaperSize::Label2x1.canvas_size(Orientation::Portrait));
        assert_eq!(t.name, "Broken");
    }

    #[test]
    fn test_bad_elements_and_canvas_degrade() {
        let t = Template::from_json(
            r#"{"elements":[{"type":"nope"},{"id":"ok","type":"rect"}],"canvasSize":{"width":-1,"height":5}}"#,
        )
        .unwrap();
        assert_eq!(t.elements.len(), 1);
        assert_eq!(t.canvas_size, CanvasSize::default());
    }

    #[test]
    fn test_not_json_is_error() {
        assert!(Template::from_json("<html>").is_err());
    }

    #[test]
    fn test_content_object_shape() {
        let doc = serde_json::json!({
            "name": "Object",
            "content": {
                "elements": [{"id": "t", "type": "text", "text": "Hi"}],
                "canvasSize": {"width": 300, "height": 200}
            }
        });
        let t = Template::from_value(doc);
        assert_eq!(t.elements.len(), 1);
        assert_eq!(t.elements[0].id.as_str(), "t");
        assert_eq!(t.canvas_size, CanvasSize::new(300.0, 200.0));
    }

    #[test]
    fn test_content_of_wrong_shape_falls_back() {
        let doc = serde_json::json!({"name": "Odd", "paperSize": "4x4", "content": [1, 2]});
        let t = Template::from_value(doc);
        assert!(t.elements.is_empty());
        assert_eq!(t.canvas_size, PaperSize::Label4x4.canvas_size(Orientation::Portrait));
    }

    #[test]
    fn test_stored_value_roundtrip() {
        let mut t = Template::new("Stored", PaperSize::Label4x4, Orientation::Portrait);
        t.elements.push(Element::qr("X").with_id("q"));
        let stored = t.to_stored_value().unwrap();
        assert!(stored.get("elements").is_none());
        assert!(stored["content"].is_string());
        assert_eq!(Template::from_value(stored), t);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut t = Template::new("Round", PaperSize::A6, Orientation::Portrait);
        t.elements.push(Element::text("x").with_id("e1"));
        t.touch();
        let back = Template::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_touch_bumps_version() {
        let mut t = Template::default();
        t.touch();
        assert_eq!(t.version, Some(1));
        t.touch();
        assert_eq!(t.version, Some(2));
        assert!(t.updated_at.is_some());
    }
}
