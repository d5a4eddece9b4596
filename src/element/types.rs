//! Variant payloads for the element model.
//!
//! All types derive `Serialize + Deserialize` so the same structs serve the
//! Rust API and the persisted template JSON. Keys are camelCase on the wire.
//!
//! Each payload implements [`ElementMeta`] to declare its display label and
//! the starter value used when an operator drops a new element on the canvas.

use serde::{Deserialize, Serialize};

/// Metadata that every element payload must provide.
///
/// Keeping the label and editor default next to each struct means a new
/// element type is self-contained: implement this trait and the compiler
/// points at the remaining exhaustive matches in `ElementKind`.
pub trait ElementMeta: Sized {
    /// Human-readable display label (e.g. "QR Code", "Rectangle").
    fn label() -> &'static str;

    /// Starter value for a freshly placed element.
    ///
    /// Distinct from `Default`: editor defaults carry example content so a
    /// new element is visible immediately instead of empty.
    fn editor_default() -> Self;
}

pub(crate) fn default_fill() -> String {
    "#000000".to_string()
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> f64 {
    20.0
}

fn default_caption_size() -> f64 {
    14.0
}

fn default_true() -> bool {
    true
}

// ============================================================================
// TEXT
// ============================================================================

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Static or data-bound text.
///
/// Data-bound text carries `{{field}}` placeholders that are filled from a
/// batch record (see [`crate::batch::fill_placeholders`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_fill")]
    pub fill: String,
    /// `None` means the operator never picked an alignment; layout then
    /// derives one from the script (right for RTL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub font_weight: FontWeight,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            fill: default_fill(),
            align: None,
            font_style: FontStyle::Normal,
            font_weight: FontWeight::Normal,
        }
    }
}

impl ElementMeta for TextProps {
    fn label() -> &'static str { "Text" }
    fn editor_default() -> Self {
        Self { text: "Text".into(), ..Default::default() }
    }
}

impl TextProps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// SYMBOLIC CODES
// ============================================================================

/// 1D barcode symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeFormat {
    #[default]
    Code128,
    Code39,
    Code93,
    Ean13,
    Ean8,
    Upca,
    Itf,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 7] = [
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Upca,
        BarcodeFormat::Itf,
    ];

    /// Wire name of the symbology.
    pub fn name(self) -> &'static str {
        match self {
            BarcodeFormat::Code128 => "code128",
            BarcodeFormat::Code39 => "code39",
            BarcodeFormat::Code93 => "code93",
            BarcodeFormat::Ean13 => "ean13",
            BarcodeFormat::Ean8 => "ean8",
            BarcodeFormat::Upca => "upca",
            BarcodeFormat::Itf => "itf",
        }
    }

    /// Parse a symbology name, tolerating case and separators ("EAN-13").
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == normalized)
    }
}

impl std::fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A 1D barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeProps {
    /// Literal value, or a `{{field}}` placeholder before substitution.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub format: BarcodeFormat,
    #[serde(default = "default_fill")]
    pub fill: String,
    /// Print the human-readable value under the bars.
    #[serde(default = "default_true")]
    pub display_value: bool,
    /// Caption font size.
    #[serde(default = "default_caption_size")]
    pub font_size: f64,
    /// Caption font family.
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

impl Default for BarcodeProps {
    fn default() -> Self {
        Self {
            value: String::new(),
            format: BarcodeFormat::Code128,
            fill: default_fill(),
            display_value: true,
            font_size: default_caption_size(),
            font_family: default_font_family(),
        }
    }
}

impl ElementMeta for BarcodeProps {
    fn label() -> &'static str { "Barcode" }
    fn editor_default() -> Self {
        Self { value: "123456789012".into(), ..Default::default() }
    }
}

impl BarcodeProps {
    pub fn new(value: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            value: value.into(),
            format,
            ..Default::default()
        }
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QrErrorLevel {
    /// ~7% recovery
    L,
    /// ~15% recovery (default)
    #[default]
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrProps {
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default)]
    pub error_level: QrErrorLevel,
}

impl Default for QrProps {
    fn default() -> Self {
        Self {
            value: String::new(),
            fill: default_fill(),
            error_level: QrErrorLevel::M,
        }
    }
}

impl ElementMeta for QrProps {
    fn label() -> &'static str { "QR Code" }
    fn editor_default() -> Self {
        Self { value: "https://example.com".into(), ..Default::default() }
    }
}

impl QrProps {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// SHAPES
// ============================================================================

/// Outline style for rectangles and ellipses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

/// Fill and outline for `rect` and `ellipse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    #[serde(default = "transparent")]
    pub fill: String,
    #[serde(default = "default_fill")]
    pub border_color: String,
    #[serde(default = "default_border_width")]
    pub border_width: f64,
    #[serde(default)]
    pub border_style: BorderStyle,
}

fn transparent() -> String {
    "transparent".to_string()
}

fn default_border_width() -> f64 {
    1.0
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            fill: transparent(),
            border_color: default_fill(),
            border_width: default_border_width(),
            border_style: BorderStyle::Solid,
        }
    }
}

impl ElementMeta for ShapeProps {
    fn label() -> &'static str { "Shape" }
    fn editor_default() -> Self {
        Self { border_width: 2.0, ..Default::default() }
    }
}

/// A straight rule. Its stroke thickness is the element height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineProps {
    #[serde(default = "default_fill")]
    pub fill: String,
}

impl Default for LineProps {
    fn default() -> Self {
        Self { fill: default_fill() }
    }
}

impl ElementMeta for LineProps {
    fn label() -> &'static str { "Line" }
    fn editor_default() -> Self { Self::default() }
}

/// An embedded bitmap. `src` is base64 or a `data:` URI; the decoded image
/// is a runtime handle held by [`crate::images::ImageCache`], never by the
/// element itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    #[serde(default)]
    pub src: String,
}

impl ElementMeta for ImageProps {
    fn label() -> &'static str { "Image" }
    fn editor_default() -> Self { Self::default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barcode_format_parse() {
        assert_eq!(BarcodeFormat::parse("EAN-13"), Some(BarcodeFormat::Ean13));
        assert_eq!(BarcodeFormat::parse("code128"), Some(BarcodeFormat::Code128));
        assert_eq!(BarcodeFormat::parse("UPC_A"), Some(BarcodeFormat::Upca));
        assert_eq!(BarcodeFormat::parse("pdf417"), None);
    }

    #[test]
    fn test_text_props_defaults_from_json() {
        let props: TextProps = serde_json::from_str(r#"{"text":"Lot 7"}"#).unwrap();
        assert_eq!(props.text, "Lot 7");
        assert_eq!(props.font_size, 20.0);
        assert_eq!(props.align, None);
        assert_eq!(props.font_weight, FontWeight::Normal);
    }

    #[test]
    fn test_editor_defaults_have_content() {
        assert!(!TextProps::editor_default().text.is_empty());
        assert!(!BarcodeProps::editor_default().value.is_empty());
        assert!(!QrProps::editor_default().value.is_empty());
    }
}
