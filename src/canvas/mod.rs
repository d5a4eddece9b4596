//! # Canvas Geometry
//!
//! The label canvas and the pure transforms applied to element geometry:
//!
//! - [`paper`]: `(paper size, orientation) -> canvas` lookup
//! - [`transform`]: boundary constraint, proportional canvas resize,
//!   selection bounds, alignment
//! - [`snap`]: grid and edge snapping
//!
//! Every function here takes elements by reference and returns new values;
//! committing the result is the store's job.

pub mod paper;
pub mod snap;
pub mod transform;

pub use paper::{Orientation, PaperSize, canvas_size, units_to_mm};
pub use snap::{Point, snap};
pub use transform::{
    Alignment, Constraint, align_elements, constrain, constrain_soft, normalize_rotation, resize_canvas,
    selection_bounds,
};

use serde::{Deserialize, Serialize};

/// Design surface dimensions in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A usable canvas has finite, positive dimensions.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Per-axis scale factors from `self` to `other`.
    pub fn scale_to(&self, other: &CanvasSize) -> Option<(f64, f64)> {
        if !self.is_valid() || !other.is_valid() {
            return None;
        }
        Some((other.width / self.width, other.height / self.height))
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        PaperSize::default().canvas_size(Orientation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_4x6_portrait() {
        assert_eq!(CanvasSize::default(), CanvasSize::new(384.0, 576.0));
    }

    #[test]
    fn test_scale_to() {
        let a = CanvasSize::new(400.0, 400.0);
        assert_eq!(a.scale_to(&CanvasSize::new(200.0, 800.0)), Some((0.5, 2.0)));
        assert_eq!(a.scale_to(&CanvasSize::new(0.0, 800.0)), None);
        assert_eq!(CanvasSize::new(f64::NAN, 1.0).scale_to(&a), None);
    }
}
