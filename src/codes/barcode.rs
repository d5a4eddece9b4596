//! Barcode encoding and rasterization.
//!
//! Uses the barcoders crate for every 1D symbology. UPC-A is encoded as an
//! EAN-13 with a leading zero, which is what it is on the wire.
//!
//! GTIN formats (EAN-13, EAN-8, UPC-A) accept the value with or without its
//! check digit; when present it must be correct.

use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::code93::Code93;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::tf::TF;
use image::{GrayImage, Luma};

use super::RenderedCode;
use crate::element::{BarcodeFormat, BarcodeProps};
use crate::error::{LabelError, LabelResult};

/// Bar height in pixels, before the caption band.
pub const BAR_HEIGHT: u32 = 80;

/// Blank modules on each side of the symbol.
pub const QUIET_ZONE_MODULES: u32 = 10;

fn encode_err(format: BarcodeFormat, e: impl std::fmt::Display) -> LabelError {
    LabelError::Encode(format!("{}: {}", format, e))
}

/// GS1 mod-10 check digit over a digit payload.
pub fn gtin_check_digit(payload: &str) -> Option<u32> {
    let mut sum = 0;
    for (i, c) in payload.chars().rev().enumerate() {
        let d = c.to_digit(10)?;
        sum += if i % 2 == 0 { d * 3 } else { d };
    }
    Some((10 - sum % 10) % 10)
}

/// Strip the check digit from a GTIN value, validating it if present.
fn gtin_payload(value: &str, payload_len: usize, format: BarcodeFormat) -> LabelResult<String> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(encode_err(format, "digits only"));
    }
    match digits.len() {
        n if n == payload_len => Ok(digits),
        n if n == payload_len + 1 => {
            let (payload, check) = digits.split_at(payload_len);
            let expected = gtin_check_digit(payload);
            if check.chars().next().and_then(|c| c.to_digit(10)) == expected {
                Ok(payload.to_string())
            } else {
                Err(encode_err(format, format!("bad check digit in {}", digits)))
            }
        }
        n => Err(encode_err(
            format,
            format!("expected {} or {} digits, got {}", payload_len, payload_len + 1, n),
        )),
    }
}

/// Encode a value into barcode modules (1 = bar, 0 = space).
pub fn encode(value: &str, format: BarcodeFormat) -> LabelResult<Vec<u8>> {
    if value.is_empty() {
        return Err(encode_err(format, "empty value"));
    }
    let modules = match format {
        BarcodeFormat::Code128 => {
            // Character set B covers upper/lowercase, digits and punctuation.
            let prefixed = format!("\u{0181}{}", value);
            Code128::new(&prefixed).map_err(|e| encode_err(format, e))?.encode()
        }
        BarcodeFormat::Code39 => Code39::new(value).map_err(|e| encode_err(format, e))?.encode(),
        BarcodeFormat::Code93 => Code93::new(value).map_err(|e| encode_err(format, e))?.encode(),
        BarcodeFormat::Ean13 => {
            let payload = gtin_payload(value, 12, format)?;
            EAN13::new(&payload).map_err(|e| encode_err(format, e))?.encode()
        }
        BarcodeFormat::Ean8 => {
            let payload = gtin_payload(value, 7, format)?;
            EAN8::new(&payload).map_err(|e| encode_err(format, e))?.encode()
        }
        BarcodeFormat::Upca => {
            let payload = gtin_payload(value, 11, format)?;
            EAN13::new(format!("0{}", payload))
                .map_err(|e| encode_err(format, e))?
                .encode()
        }
        BarcodeFormat::Itf => TF::interleaved(value).map_err(|e| encode_err(format, e))?.encode(),
    };
    if modules.is_empty() {
        return Err(encode_err(format, "encoder produced no modules"));
    }
    Ok(modules)
}

/// Caption band height for a caption font size.
fn caption_band(props: &BarcodeProps) -> u32 {
    if props.display_value && props.font_size.is_finite() && props.font_size > 0.0 {
        (props.font_size * 1.2).ceil() as u32
    } else {
        0
    }
}

/// Rasterize a barcode. The bitmap is black on white; the caption text is
/// returned alongside for the renderer, with a blank band reserved for it.
pub fn render(props: &BarcodeProps, module_px: u32) -> LabelResult<RenderedCode> {
    let modules = encode(&props.value, props.format)?;
    let module_px = module_px.max(1);
    let quiet = QUIET_ZONE_MODULES * module_px;
    let width = modules.len() as u32 * module_px + quiet * 2;
    let height = BAR_HEIGHT + caption_band(props);

    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
    for (i, &module) in modules.iter().enumerate() {
        if module != 1 {
            continue;
        }
        let x0 = quiet + i as u32 * module_px;
        for x in x0..x0 + module_px {
            for y in 0..BAR_HEIGHT {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
    }

    Ok(RenderedCode {
        image: img,
        caption: props.display_value.then(|| props.value.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code128_encoding() {
        let modules = encode("Hello", BarcodeFormat::Code128).unwrap();
        assert!(modules.iter().any(|&m| m == 1));
    }

    #[test]
    fn test_code39_rejects_lowercase() {
        assert!(encode("HELLO-1", BarcodeFormat::Code39).is_ok());
        assert!(encode("hello", BarcodeFormat::Code39).is_err());
    }

    #[test]
    fn test_ean13_with_and_without_check_digit() {
        let without = encode("400638133393", BarcodeFormat::Ean13).unwrap();
        let with = encode("4006381333931", BarcodeFormat::Ean13).unwrap();
        assert_eq!(without, with);
        assert_eq!(with.len(), 95);
    }

    #[test]
    fn test_ean13_bad_check_digit() {
        assert!(matches!(
            encode("4006381333932", BarcodeFormat::Ean13),
            Err(LabelError::Encode(_))
        ));
    }

    #[test]
    fn test_ean_rejects_letters_and_length() {
        assert!(encode("40063813339A", BarcodeFormat::Ean13).is_err());
        assert!(encode("1234", BarcodeFormat::Ean8).is_err());
    }

    #[test]
    fn test_upca_matches_zero_prefixed_ean13() {
        let upc = encode("036000291452", BarcodeFormat::Upca).unwrap();
        let ean = encode("0036000291452", BarcodeFormat::Ean13).unwrap();
        assert_eq!(upc, ean);
    }

    #[test]
    fn test_check_digit() {
        assert_eq!(gtin_check_digit("400638133393"), Some(1));
        assert_eq!(gtin_check_digit("03600029145"), Some(2));
        assert_eq!(gtin_check_digit("12a"), None);
    }

    #[test]
    fn test_empty_value_is_error() {
        for format in BarcodeFormat::ALL {
            assert!(encode("", format).is_err(), "{}", format);
        }
    }

    #[test]
    fn test_render_dimensions() {
        let mut props = BarcodeProps::new("4006381333931", BarcodeFormat::Ean13);
        props.font_size = 10.0;
        let code = render(&props, 2).unwrap();
        assert_eq!(code.image.width(), 95 * 2 + 2 * QUIET_ZONE_MODULES * 2);
        assert_eq!(code.image.height(), BAR_HEIGHT + 12);
        assert_eq!(code.caption.as_deref(), Some("4006381333931"));
        // Quiet zone stays white
        assert_eq!(code.image.get_pixel(0, 0).0[0], 255);

        props.display_value = false;
        let bare = render(&props, 2).unwrap();
        assert_eq!(bare.image.height(), BAR_HEIGHT);
        assert_eq!(bare.caption, None);
    }
}
