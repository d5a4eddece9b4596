//! QR code rasterization via the qrcode crate.

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};

use super::RenderedCode;
use crate::element::{QrErrorLevel, QrProps};
use crate::error::{LabelError, LabelResult};

fn ec_level(level: QrErrorLevel) -> EcLevel {
    match level {
        QrErrorLevel::L => EcLevel::L,
        QrErrorLevel::M => EcLevel::M,
        QrErrorLevel::Q => EcLevel::Q,
        QrErrorLevel::H => EcLevel::H,
    }
}

/// Encode a value into a square module matrix, row-major (`true` = dark).
pub fn encode(value: &str, level: QrErrorLevel) -> LabelResult<(usize, Vec<bool>)> {
    if value.is_empty() {
        return Err(LabelError::Encode("qr: empty value".into()));
    }
    let code = QrCode::with_error_correction_level(value, ec_level(level))
        .map_err(|e| LabelError::Encode(format!("qr: {}", e)))?;
    let size = code.width();
    let mut modules = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            modules.push(code[(x, y)] == qrcode::Color::Dark);
        }
    }
    Ok((size, modules))
}

/// Rasterize a QR code with `cell_px` pixels per module and a quiet zone
/// of `quiet_zone` modules on every side.
pub fn render(props: &QrProps, cell_px: u32, quiet_zone: u32) -> LabelResult<RenderedCode> {
    let (size, modules) = encode(&props.value, props.error_level)?;
    let cell = cell_px.max(1);
    let side = (size as u32 + quiet_zone * 2) * cell;

    let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));
    for (i, &dark) in modules.iter().enumerate() {
        if !dark {
            continue;
        }
        let qx = (i % size) as u32 + quiet_zone;
        let qy = (i / size) as u32 + quiet_zone;
        for cy in 0..cell {
            for cx in 0..cell {
                img.put_pixel(qx * cell + cx, qy * cell + cy, Luma([0u8]));
            }
        }
    }

    Ok(RenderedCode { image: img, caption: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_value_is_version_1() {
        let (size, modules) = encode("LOT-1", QrErrorLevel::M).unwrap();
        assert_eq!(size, 21);
        assert_eq!(modules.len(), 21 * 21);
        // Finder pattern corner is dark
        assert!(modules[0]);
    }

    #[test]
    fn test_render_size_includes_quiet_zone() {
        let code = render(&QrProps::new("LOT-1"), 4, 2).unwrap();
        assert_eq!(code.image.dimensions(), (100, 100));
        assert_eq!(code.image.get_pixel(0, 0).0[0], 255);
        assert_eq!(code.image.get_pixel(8, 8).0[0], 0);
        assert!(code.caption.is_none());
    }

    #[test]
    fn test_higher_error_level_grows_symbol() {
        let value = "https://example.com/batch/LOT-2024-0001";
        let (low, _) = encode(value, QrErrorLevel::L).unwrap();
        let (high, _) = encode(value, QrErrorLevel::H).unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_empty_and_oversized_values_fail() {
        assert!(encode("", QrErrorLevel::M).is_err());
        let huge = "X".repeat(8000);
        assert!(encode(&huge, QrErrorLevel::H).is_err());
    }
}
