//! # Engine Configuration
//!
//! Tunables for the composition engine, grouped by the component they feed.
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [store]
//! duplicate_offset = 10.0
//!
//! [text]
//! max_font_size = 48.0
//! ```
//!
//! | Section | Consumer |
//! |---------|----------|
//! | `store` | [`crate::store::ElementStore`], [`crate::history::History`] |
//! | `text`  | [`crate::text_fit::TextFit`] |
//! | `snap`  | [`crate::canvas::snap`] |
//! | `codes` | [`crate::codes::CodeCache`] |
//! | `batch` | [`crate::batch`] |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LabelResult};
use crate::text_fit::{MAX_FONT_SIZE, MIN_FONT_SIZE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub text: TextConfig,
    pub snap: SnapConfig,
    pub codes: CodeConfig,
    pub batch: BatchConfig,
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> LabelResult<Self> {
        toml::from_str(content).map_err(|e| LabelError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> LabelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Element store and history limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Floor for element width and height after any mutation.
    pub min_element_size: f64,
    /// Floor for line thickness (lines keep thickness in `height`).
    pub min_line_thickness: f64,
    /// Displacement applied to both axes by `duplicate` and paste.
    pub duplicate_offset: f64,
    /// Spacing between renormalized layer values.
    pub layer_gap: i64,
    /// Maximum undo depth; the oldest snapshot is dropped beyond it.
    pub history_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_element_size: 5.0,
            min_line_thickness: 1.0,
            duplicate_offset: 20.0,
            layer_gap: 100,
            history_limit: 100,
        }
    }
}

/// Text-fit coefficients shared by both directions of the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub min_font_size: f64,
    pub max_font_size: f64,
    /// Padding per side, as a fraction of the font size.
    pub padding_ratio: f64,
    /// Extra shrink for long lines and complex scripts.
    pub shrink_factor: f64,
    /// Lines longer than this (in characters) trigger the shrink factor.
    pub long_line_threshold: usize,
    /// Minimum box returned for degenerate autosize input.
    pub min_box_width: f64,
    pub min_box_height: f64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            min_font_size: MIN_FONT_SIZE,
            max_font_size: MAX_FONT_SIZE,
            padding_ratio: 0.1,
            shrink_factor: 0.85,
            long_line_threshold: 30,
            min_box_width: 20.0,
            min_box_height: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Grid pitch in canvas units; `0` disables grid snapping.
    pub grid_size: f64,
    /// Distance within which an element edge captures the pointer.
    pub tolerance: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            grid_size: 5.0,
            tolerance: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    /// Coalescing window for bursts of `ensure` calls.
    pub debounce_ms: u64,
    /// Pixels per barcode module.
    pub barcode_module_px: u32,
    /// Pixels per QR module.
    pub qr_cell_px: u32,
    /// Quiet zone around QR codes, in modules.
    pub qr_quiet_zone: u32,
}

impl CodeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            barcode_module_px: 2,
            qr_cell_px: 4,
            qr_quiet_zone: 2,
        }
    }
}

/// Layout tunables for batch-record synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Outer margin on every side of the canvas.
    pub margin: f64,
    /// Horizontal gap between columns.
    pub gutter: f64,
    /// Cap on the font size picked for a field line.
    pub max_field_font: f64,
    /// Share of canvas height reserved for barcode fields.
    pub barcode_band_ratio: f64,
    /// Number of recently used batch numbers remembered by a session.
    pub history_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            margin: 10.0,
            gutter: 8.0,
            max_field_font: 24.0,
            barcode_band_ratio: 0.25,
            history_limit: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
[store]
duplicate_offset = 10.0

[codes]
debounce_ms = 0
"#,
        )
        .unwrap();
        assert_eq!(config.store.duplicate_offset, 10.0);
        assert_eq!(config.store.layer_gap, 100);
        assert_eq!(config.codes.debounce(), Duration::ZERO);
        assert_eq!(config.text, TextConfig::default());
    }

    #[test]
    fn test_invalid_toml_error() {
        let err = EngineConfig::from_toml_str("this is not valid toml {{{{").unwrap_err();
        assert!(matches!(err, LabelError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[snap]\ngrid_size = 10.0\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.snap.grid_size, 10.0);
    }
}
