//! # Text Fitting
//!
//! Estimates font sizes and text boxes without a shaping engine, using
//! per-script glyph coefficients (average advance and line height, as
//! multiples of the font size).
//!
//! ## Coefficients
//!
//! | Script | Width | Height |
//! |--------|-------|--------|
//! | Latin | 0.6 | 1.2 |
//! | Thai | 0.7 | 1.4 |
//! | Chinese / Japanese / Korean | 1.0 | 1.2 |
//! | Arabic | 1.0 | 1.8 |
//! | Hebrew | 0.9 | 1.6 |
//!
//! RTL scripts get wide advances and tall lines because joined glyphs and
//! marks take more room than the character count suggests.
//!
//! ## Solving
//!
//! ```text
//! extent_w = longest_line * width_coef * family_factor + 2 * padding
//! extent_h = line_count   * height_coef                + 2 * padding
//! size     = min(box.w / extent_w, box.h / extent_h) * shrink
//! ```
//!
//! `shrink` is below 1 for long lines and complex scripts. [`TextFit::autosize`]
//! runs the same equation backwards, so `fit(autosize(s)) == s` for any whole
//! `s` in `[MIN_FONT_SIZE, MAX_FONT_SIZE]`.

use serde::{Deserialize, Serialize};

use crate::config::TextConfig;
use crate::element::{Bounds, Element, ElementKind, TextAlign};
use crate::script::{self, Direction, Script};

/// Smallest font size the solver returns.
pub const MIN_FONT_SIZE: f64 = 10.0;
/// Largest font size the solver returns.
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Average glyph advance and line height, in ems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub width: f64,
    pub height: f64,
}

/// Coefficients for a script.
pub fn coefficients(script: Script) -> Coefficients {
    let (width, height) = match script {
        Script::Latin => (0.6, 1.2),
        Script::Thai => (0.7, 1.4),
        Script::Chinese | Script::Japanese | Script::Korean => (1.0, 1.2),
        Script::Arabic => (1.0, 1.8),
        Script::Hebrew => (0.9, 1.6),
    };
    Coefficients { width, height }
}

/// Width adjustment for the font family's proportions.
pub fn family_width_factor(family: &str) -> f64 {
    let family = family.to_lowercase();
    if family.contains("condensed") || family.contains("narrow") || family.contains("compressed") {
        0.85
    } else if family.contains("extended") || family.contains("expanded") || family.contains("wide") {
        1.15
    } else {
        1.0
    }
}

/// A width/height pair in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

impl From<Bounds> for Size {
    fn from(b: Bounds) -> Self {
        Size::new(b.width, b.height)
    }
}

/// Line statistics the solver works from.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    pub script: Script,
    pub line_count: usize,
    /// Character count of the longest explicit line.
    pub longest_line: usize,
}

/// Measure explicit lines. Returns `None` for blank text.
pub fn measure(text: &str) -> Option<TextMetrics> {
    if text.trim().is_empty() {
        return None;
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let longest_line = lines
        .iter()
        .map(|l| l.trim_end_matches('\r').chars().count())
        .max()
        .unwrap_or(0)
        .max(1);
    Some(TextMetrics {
        script: script::classify(text),
        line_count: lines.len(),
        longest_line,
    })
}

/// Result of [`TextFit::layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font_size: f64,
    pub lines: Vec<String>,
    pub script: Script,
    pub direction: Direction,
    /// Explicit alignment, or right for RTL text when none was set.
    pub align: TextAlign,
}

/// Text-fit solver with configurable bounds.
#[derive(Debug, Clone, Default)]
pub struct TextFit {
    config: TextConfig,
}

impl TextFit {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    fn shrink(&self, metrics: &TextMetrics) -> f64 {
        if metrics.longest_line > self.config.long_line_threshold || metrics.script.is_complex() {
            self.config.shrink_factor
        } else {
            1.0
        }
    }

    /// Per-axis extents in ems (font size = 1), padding included.
    fn extents(&self, metrics: &TextMetrics, family: &str) -> (f64, f64) {
        let c = coefficients(metrics.script);
        let pad = 2.0 * self.config.padding_ratio;
        let width = metrics.longest_line as f64 * c.width * family_width_factor(family) + pad;
        let height = metrics.line_count as f64 * c.height + pad;
        (width, height)
    }

    fn clamp_size(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return self.config.min_font_size;
        }
        // Tolerate float noise just below a whole size.
        (raw + 1e-9)
            .floor()
            .min(self.config.max_font_size)
            .max(self.config.min_font_size)
    }

    /// Largest font size at which `text` fits inside `bounds`.
    ///
    /// Blank text or a non-positive box returns the minimum size.
    pub fn fit(&self, text: &str, family: &str, bounds: Size) -> f64 {
        let Some(metrics) = measure(text) else {
            return self.config.min_font_size;
        };
        if bounds.is_degenerate() {
            return self.config.min_font_size;
        }
        let (ew, eh) = self.extents(&metrics, family);
        let raw = (bounds.width / ew).min(bounds.height / eh) * self.shrink(&metrics);
        self.clamp_size(raw)
    }

    /// Box that holds `text` at `font_size`, padding included.
    ///
    /// Blank text or a non-positive size returns the minimum box.
    pub fn autosize(&self, text: &str, font_size: f64, family: &str) -> Size {
        let min_box = Size::new(self.config.min_box_width, self.config.min_box_height);
        let Some(metrics) = measure(text) else {
            return min_box;
        };
        if !(font_size > 0.0) {
            return min_box;
        }
        let size = font_size.clamp(self.config.min_font_size, self.config.max_font_size);
        let (ew, eh) = self.extents(&metrics, family);
        let scale = size / self.shrink(&metrics);
        Size::new(ew * scale, eh * scale)
    }

    /// Fit plus presentation details: explicit lines, direction, alignment.
    pub fn layout(
        &self,
        text: &str,
        family: &str,
        bounds: Size,
        align: Option<TextAlign>,
    ) -> TextLayout {
        let script = script::classify(text);
        let direction = if script.is_rtl() { Direction::Rtl } else { Direction::Ltr };
        let align = align.unwrap_or(match direction {
            Direction::Rtl => TextAlign::Right,
            Direction::Ltr => TextAlign::Left,
        });
        TextLayout {
            font_size: self.fit(text, family, bounds),
            lines: text.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect(),
            script,
            direction,
            align,
        }
    }

    /// Greedy word wrap of each explicit line to `max_width` at `font_size`.
    ///
    /// Words longer than a full line are split at character boundaries.
    pub fn wrap(&self, text: &str, font_size: f64, family: &str, max_width: f64) -> Vec<String> {
        let script = script::classify(text);
        let size = if font_size > 0.0 { font_size } else { self.config.min_font_size };
        let advance = size * coefficients(script).width * family_width_factor(family);
        let usable = max_width - 2.0 * self.config.padding_ratio * size;
        let max_chars = if usable > 0.0 {
            ((usable / advance).floor() as usize).max(1)
        } else {
            1
        };

        let mut out = Vec::new();
        for line in text.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.chars().count() <= max_chars {
                out.push(line.to_string());
                continue;
            }
            let mut current = String::new();
            for word in line.split_whitespace() {
                let word_len = word.chars().count();
                let current_len = current.chars().count();
                let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
                if needed <= max_chars {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(word);
                    continue;
                }
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                if word_len <= max_chars {
                    current.push_str(word);
                } else {
                    let chars: Vec<char> = word.chars().collect();
                    let mut chunks = chars.chunks(max_chars).peekable();
                    while let Some(chunk) = chunks.next() {
                        let piece: String = chunk.iter().collect();
                        if chunks.peek().is_some() {
                            out.push(piece);
                        } else {
                            current = piece;
                        }
                    }
                }
            }
            if !current.is_empty() {
                out.push(current);
            }
        }
        out
    }

    /// Single-line, width-only fit in the text's own script proportions,
    /// capped at `max_size`.
    pub fn fit_width(&self, text: &str, width: f64, max_size: f64) -> f64 {
        let Some(metrics) = measure(text) else {
            return self.config.min_font_size;
        };
        if !(width > 0.0) {
            return self.config.min_font_size;
        }
        let chars = text.chars().count();
        let raw = width / (chars as f64 * coefficients(metrics.script).width) * self.shrink(&metrics);
        (raw + 1e-9)
            .floor()
            .min(max_size.min(self.config.max_font_size))
            .max(self.config.min_font_size)
    }

    /// Font size that fits a text element's content into its own box.
    /// Returns `None` for non-text elements.
    pub fn fit_element(&self, element: &Element) -> Option<f64> {
        match &element.kind {
            ElementKind::Text(t) => {
                Some(self.fit(&t.text, &t.font_family, Size::from(element.bounds())))
            }
            _ => None,
        }
    }
}

/// [`TextFit::fit`] with default bounds.
pub fn fit(text: &str, family: &str, bounds: Size) -> f64 {
    TextFit::default().fit(text, family, bounds)
}

/// [`TextFit::autosize`] with default bounds.
pub fn autosize(text: &str, font_size: f64, family: &str) -> Size {
    TextFit::default().autosize(text, font_size, family)
}
