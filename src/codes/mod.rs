//! # Symbolic Codes
//!
//! Barcode and QR rasterization, and the per-element cache that keeps the
//! rasters in step with the element store.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`barcode`] | 1D symbologies via `barcoders` |
//! | [`qr`] | QR via `qrcode` |
//! | [`cache`] | Debounced async generation keyed by element id |
//!
//! A raster only depends on the [`CodeKey`] of its element. Geometry is not
//! part of the key: the renderer scales the bitmap into the element box.

pub mod barcode;
pub mod cache;
pub mod qr;

pub use cache::{CodeCache, CodeStatus};

use std::io::Cursor;

use image::{GrayImage, Luma};

use crate::config::CodeConfig;
use crate::element::{BarcodeFormat, BarcodeProps, Element, ElementKind, QrErrorLevel, QrProps};
use crate::error::LabelResult;

/// A successfully encoded symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCode {
    /// Black modules on white, quiet zone included.
    pub image: GrayImage,
    /// Human-readable line printed under a barcode, if enabled.
    pub caption: Option<String>,
}

impl RenderedCode {
    pub fn to_png(&self) -> LabelResult<Vec<u8>> {
        encode_png(&self.image)
    }
}

/// Stand-in for a symbol that could not be encoded: an outlined box with the
/// raw value as fallback text.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub text: String,
    pub reason: String,
    pub image: GrayImage,
}

impl Placeholder {
    pub const WIDTH: u32 = 120;
    pub const HEIGHT: u32 = 60;

    pub fn new(text: impl Into<String>, reason: impl Into<String>) -> Self {
        let (w, h) = (Self::WIDTH, Self::HEIGHT);
        let mut image = GrayImage::from_pixel(w, h, Luma([255u8]));
        for x in 0..w {
            image.put_pixel(x, 0, Luma([0u8]));
            image.put_pixel(x, h - 1, Luma([0u8]));
        }
        for y in 0..h {
            image.put_pixel(0, y, Luma([0u8]));
            image.put_pixel(w - 1, y, Luma([0u8]));
        }
        Self {
            text: text.into(),
            reason: reason.into(),
            image,
        }
    }

    pub fn to_png(&self) -> LabelResult<Vec<u8>> {
        encode_png(&self.image)
    }
}

fn encode_png(img: &GrayImage) -> LabelResult<Vec<u8>> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)?;
    Ok(png_bytes)
}

/// Everything a raster depends on. Two equal keys produce the same bitmap.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeKey {
    Barcode {
        value: String,
        format: BarcodeFormat,
        display_value: bool,
        font_size: f64,
        font_family: String,
    },
    Qr {
        value: String,
        error_level: QrErrorLevel,
    },
}

impl CodeKey {
    /// Key for a barcode or QR element; `None` for every other kind.
    pub fn for_element(element: &Element) -> Option<Self> {
        match &element.kind {
            ElementKind::Barcode(b) => Some(CodeKey::Barcode {
                value: b.value.clone(),
                format: b.format,
                display_value: b.display_value,
                font_size: b.font_size,
                font_family: b.font_family.clone(),
            }),
            ElementKind::Qr(q) => Some(CodeKey::Qr {
                value: q.value.clone(),
                error_level: q.error_level,
            }),
            _ => None,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            CodeKey::Barcode { value, .. } | CodeKey::Qr { value, .. } => value,
        }
    }

    /// Encode and rasterize. Blocking; the cache runs this off the runtime.
    pub fn rasterize(&self, config: &CodeConfig) -> LabelResult<RenderedCode> {
        match self {
            CodeKey::Barcode {
                value,
                format,
                display_value,
                font_size,
                font_family,
            } => {
                let props = BarcodeProps {
                    value: value.clone(),
                    format: *format,
                    display_value: *display_value,
                    font_size: *font_size,
                    font_family: font_family.clone(),
                    ..BarcodeProps::default()
                };
                barcode::render(&props, config.barcode_module_px)
            }
            CodeKey::Qr { value, error_level } => {
                let props = QrProps {
                    value: value.clone(),
                    error_level: *error_level,
                    ..QrProps::default()
                };
                qr::render(&props, config.qr_cell_px, config.qr_quiet_zone)
            }
        }
    }
}

/// Rasterize an element directly, falling back to a placeholder.
///
/// Synchronous counterpart of [`CodeCache::ensure`] for batch tools.
pub fn rasterize_element(
    element: &Element,
    config: &CodeConfig,
) -> Option<Result<RenderedCode, Placeholder>> {
    let key = CodeKey::for_element(element)?;
    Some(key.rasterize(config).map_err(|e| {
        tracing::warn!("{}: {}", element.id, e);
        Placeholder::new(key.value(), e.to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_geometry() {
        let a = Element::barcode("123", BarcodeFormat::Code128).with_bounds(0.0, 0.0, 100.0, 40.0);
        let b = a.clone().with_bounds(50.0, 50.0, 300.0, 90.0);
        assert_eq!(CodeKey::for_element(&a), CodeKey::for_element(&b));
    }

    #[test]
    fn test_key_tracks_caption_controls() {
        let a = Element::barcode("123", BarcodeFormat::Code128);
        let mut b = a.clone();
        if let ElementKind::Barcode(props) = &mut b.kind {
            props.font_family = "Courier".into();
        }
        assert_ne!(CodeKey::for_element(&a), CodeKey::for_element(&b));
    }

    #[test]
    fn test_non_code_has_no_key() {
        assert!(CodeKey::for_element(&Element::text("x")).is_none());
        assert!(rasterize_element(&Element::rect(), &CodeConfig::default()).is_none());
    }

    #[test]
    fn test_rasterize_element_placeholder() {
        let el = Element::barcode("not-an-ean", BarcodeFormat::Ean13);
        let result = rasterize_element(&el, &CodeConfig::default()).unwrap();
        let placeholder = result.unwrap_err();
        assert_eq!(placeholder.text, "not-an-ean");
        assert_eq!(placeholder.image.get_pixel(0, 0).0[0], 0);
        assert_eq!(placeholder.image.get_pixel(5, 5).0[0], 255);
    }

    #[test]
    fn test_png_export_signature() {
        let el = Element::qr("LOT-9");
        let code = rasterize_element(&el, &CodeConfig::default()).unwrap().unwrap();
        let png = code.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
