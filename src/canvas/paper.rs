//! # Paper Sizes
//!
//! Fixed lookup from `(paper size, orientation)` to canvas dimensions.
//!
//! Canvas units are device independent at 96 units per inch. The table stores
//! portrait dimensions (short side as width); landscape swaps them.
//!
//! | Paper | Physical | Portrait canvas |
//! |-------|----------|-----------------|
//! | `4x6` | 4 × 6 in | 384 × 576 |
//! | `4x4` | 4 × 4 in | 384 × 384 |
//! | `4x3` | 4 × 3 in | 288 × 384 |
//! | `4x2` | 4 × 2 in | 192 × 384 |
//! | `3x2` | 3 × 2 in | 192 × 288 |
//! | `2x1` | 2 × 1 in | 96 × 192 |
//! | `100x150mm` | 100 × 150 mm | 378 × 567 |
//! | `100x100mm` | 100 × 100 mm | 378 × 378 |
//! | `100x50mm` | 100 × 50 mm | 189 × 378 |
//! | `A6` | 105 × 148 mm | 397 × 559 |
//! | `A5` | 148 × 210 mm | 559 × 794 |
//! | `A4` | 210 × 297 mm | 794 × 1123 |
//!
//! ## Usage
//!
//! ```
//! use labelsmith::canvas::{Orientation, PaperSize};
//!
//! let size = PaperSize::Label4x6.canvas_size(Orientation::Landscape);
//! assert_eq!((size.width, size.height), (576.0, 384.0));
//! ```

use serde::{Deserialize, Serialize};

use super::CanvasSize;

/// Canvas units per inch.
pub const UNITS_PER_INCH: f64 = 96.0;

/// Label stock sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    #[serde(rename = "4x6")]
    Label4x6,
    #[serde(rename = "4x4")]
    Label4x4,
    #[serde(rename = "4x3")]
    Label4x3,
    #[serde(rename = "4x2")]
    Label4x2,
    #[serde(rename = "3x2")]
    Label3x2,
    #[serde(rename = "2x1")]
    Label2x1,
    #[serde(rename = "100x150mm")]
    Label100x150mm,
    #[serde(rename = "100x100mm")]
    Label100x100mm,
    #[serde(rename = "100x50mm")]
    Label100x50mm,
    A6,
    A5,
    A4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "portrait" | "p" => Some(Orientation::Portrait),
            "landscape" | "l" => Some(Orientation::Landscape),
            _ => None,
        }
    }
}

impl PaperSize {
    pub const ALL: [PaperSize; 12] = [
        PaperSize::Label4x6,
        PaperSize::Label4x4,
        PaperSize::Label4x3,
        PaperSize::Label4x2,
        PaperSize::Label3x2,
        PaperSize::Label2x1,
        PaperSize::Label100x150mm,
        PaperSize::Label100x100mm,
        PaperSize::Label100x50mm,
        PaperSize::A6,
        PaperSize::A5,
        PaperSize::A4,
    ];

    /// Wire name (matches the serde representation).
    pub fn name(self) -> &'static str {
        match self {
            PaperSize::Label4x6 => "4x6",
            PaperSize::Label4x4 => "4x4",
            PaperSize::Label4x3 => "4x3",
            PaperSize::Label4x2 => "4x2",
            PaperSize::Label3x2 => "3x2",
            PaperSize::Label2x1 => "2x1",
            PaperSize::Label100x150mm => "100x150mm",
            PaperSize::Label100x100mm => "100x100mm",
            PaperSize::Label100x50mm => "100x50mm",
            PaperSize::A6 => "A6",
            PaperSize::A5 => "A5",
            PaperSize::A4 => "A4",
        }
    }

    /// Parse a paper name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
    }

    /// Portrait dimensions in canvas units `(width, height)`.
    fn portrait_units(self) -> (f64, f64) {
        match self {
            PaperSize::Label4x6 => (384.0, 576.0),
            PaperSize::Label4x4 => (384.0, 384.0),
            PaperSize::Label4x3 => (288.0, 384.0),
            PaperSize::Label4x2 => (192.0, 384.0),
            PaperSize::Label3x2 => (192.0, 288.0),
            PaperSize::Label2x1 => (96.0, 192.0),
            PaperSize::Label100x150mm => (378.0, 567.0),
            PaperSize::Label100x100mm => (378.0, 378.0),
            PaperSize::Label100x50mm => (189.0, 378.0),
            PaperSize::A6 => (397.0, 559.0),
            PaperSize::A5 => (559.0, 794.0),
            PaperSize::A4 => (794.0, 1123.0),
        }
    }

    /// Canvas dimensions for this paper in the given orientation.
    pub fn canvas_size(self, orientation: Orientation) -> CanvasSize {
        let (w, h) = self.portrait_units();
        match orientation {
            Orientation::Portrait => CanvasSize::new(w, h),
            Orientation::Landscape => CanvasSize::new(h, w),
        }
    }
}

impl std::fmt::Display for PaperSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canvas units per millimeter.
#[inline]
pub fn units_per_mm() -> f64 {
    UNITS_PER_INCH / 25.4
}

/// Convert canvas units to millimeters.
#[inline]
pub fn units_to_mm(units: f64) -> f64 {
    units / units_per_mm()
}

/// Lookup used by templates: `(paper, orientation) -> canvas`.
pub fn canvas_size(paper: PaperSize, orientation: Orientation) -> CanvasSize {
    paper.canvas_size(orientation)
}

// ============================================================================
// TESTS
// ============================================================================
