//! Element synthesis from a batch record.
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │ margin                              │
//! │  Item: A1      │ Lot: L-7   │ ...   │  text area, column-major
//! │  Cust: C1      │ Exp: ...   │       │
//! │  ...           │            │       │
//! │                                     │
//! │  ║║│║║│║│║║    ║║│║║│║│║║           │  barcode band (optional)
//! └─────────────────────────────────────┘
//! ```
//!
//! Fields are resolved first and absent ones dropped, so the column count
//! reflects what will actually be printed.

use serde::{Deserialize, Serialize};

use super::alias::{FlatRecord, resolve_field};
use crate::canvas::CanvasSize;
use crate::config::BatchConfig;
use crate::element::{BarcodeFormat, BarcodeProps, Element, ElementKind, TextProps};
use crate::text_fit::TextFit;

/// Line height per point of font size used for row sizing.
const LINE_HEIGHT_RATIO: f64 = 1.2;

/// One field the operator chose to print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSelection {
    /// Logical field name, resolved through the alias table.
    pub field: String,
    /// Caption printed before the value; defaults to the field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Render the value as a barcode in the bottom band instead of text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<BarcodeFormat>,
}

impl FieldSelection {
    pub fn text(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: None,
            barcode: None,
        }
    }

    pub fn barcode(field: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            field: field.into(),
            label: None,
            barcode: Some(format),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn caption(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field)
    }
}

impl From<&str> for FieldSelection {
    fn from(field: &str) -> Self {
        Self::text(field)
    }
}

/// Columns used for `fields` text lines.
pub fn column_count(fields: usize) -> usize {
    match fields {
        0..=12 => 1,
        13..=24 => 2,
        _ => 3,
    }
}

/// Cell position of field `index` in column-major order.
pub fn grid_position(index: usize, fields: usize, columns: usize) -> (usize, usize) {
    let rows = fields.div_ceil(columns.max(1)).max(1);
    (index / rows, index % rows)
}

/// Batch binder with its layout tunables.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    config: BatchConfig,
    fit: TextFit,
}

impl Binder {
    pub fn new(config: BatchConfig, fit: TextFit) -> Self {
        Self { config, fit }
    }

    /// Build positioned elements for the selected fields of `record`.
    ///
    /// Text fields fill the canvas above an optional barcode band. Absent
    /// fields are skipped. Layers increase in selection order.
    pub fn bind(
        &self,
        record: &FlatRecord,
        selection: &[FieldSelection],
        canvas: &CanvasSize,
    ) -> Vec<Element> {
        let mut text_fields = Vec::new();
        let mut code_fields = Vec::new();
        for sel in selection {
            match resolve_field(record, &sel.field) {
                Some(resolved) => match sel.barcode {
                    Some(format) => code_fields.push((sel, format, resolved.value)),
                    None => text_fields.push((sel, resolved.value)),
                },
                None => tracing::debug!("bind: '{}' absent, skipped", sel.field),
            }
        }

        let margin = self.config.margin;
        let gutter = self.config.gutter;
        let inner_w = (canvas.width - 2.0 * margin).max(0.0);
        let inner_h = (canvas.height - 2.0 * margin).max(0.0);

        let band_h = if code_fields.is_empty() {
            0.0
        } else {
            canvas.height * self.config.barcode_band_ratio
        };
        let text_h = if code_fields.is_empty() {
            inner_h
        } else {
            (inner_h - band_h - gutter).max(0.0)
        };

        let mut elements = Vec::with_capacity(text_fields.len() + code_fields.len());

        let n = text_fields.len();
        if n > 0 {
            let columns = column_count(n);
            let rows = n.div_ceil(columns);
            let col_w = (inner_w - gutter * (columns - 1) as f64) / columns as f64;
            let row_h = text_h / rows as f64;
            let min_font = self.fit.config().min_font_size;
            let max_font = self
                .config
                .max_field_font
                .min((row_h / LINE_HEIGHT_RATIO).floor())
                .max(min_font);

            for (i, (sel, value)) in text_fields.iter().enumerate() {
                let (col, row) = grid_position(i, n, columns);
                let content = format!("{}: {}", sel.caption(), value);
                let font_size = self.fit.fit_width(&content, col_w, max_font);
                let mut props = TextProps::new(content);
                props.font_size = font_size;
                elements.push(
                    Element::new(ElementKind::Text(props)).with_bounds(
                        margin + col as f64 * (col_w + gutter),
                        margin + row as f64 * row_h,
                        col_w,
                        row_h,
                    ),
                );
            }
        }

        let m = code_fields.len();
        if m > 0 {
            let cell_w = (inner_w - gutter * (m - 1) as f64) / m as f64;
            let top = canvas.height - margin - band_h;
            for (i, (_, format, value)) in code_fields.into_iter().enumerate() {
                elements.push(
                    Element::new(ElementKind::Barcode(BarcodeProps::new(value, format)))
                        .with_bounds(margin + i as f64 * (cell_w + gutter), top, cell_w, band_h),
                );
            }
        }

        for (i, el) in elements.iter_mut().enumerate() {
            el.layer = (i as i64 + 1) * 100;
        }
        tracing::info!(
            "bind: {} of {} fields placed ({} text, {} barcode)",
            elements.len(),
            selection.len(),
            n,
            m
        );
        elements
    }
}

/// [`Binder::bind`] with default tunables.
pub fn bind(record: &FlatRecord, selection: &[FieldSelection], canvas: &CanvasSize) -> Vec<Element> {
    Binder::default().bind(record, selection, canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_fit::MIN_FONT_SIZE;
    use pretty_assertions::assert_eq;

    fn record(n: usize) -> FlatRecord {
        (0..n).map(|i| (format!("field{:02}", i), format!("v{}", i))).collect()
    }

    fn selection(n: usize) -> Vec<FieldSelection> {
        (0..n).map(|i| FieldSelection::text(format!("field{:02}", i))).collect()
    }

    fn distinct_xs(elements: &[Element]) -> usize {
        let mut xs: Vec<i64> = elements.iter().map(|e| e.x.round() as i64).collect();
        xs.sort();
        xs.dedup();
        xs.len()
    }

    #[test]
    fn test_column_count_thresholds() {
        assert_eq!(column_count(1), 1);
        assert_eq!(column_count(12), 1);
        assert_eq!(column_count(13), 2);
        assert_eq!(column_count(24), 2);
        assert_eq!(column_count(25), 3);
        assert_eq!(column_count(30), 3);
    }

    #[test]
    fn test_grid_position_column_major() {
        assert_eq!(grid_position(0, 30, 3), (0, 0));
        assert_eq!(grid_position(9, 30, 3), (0, 9));
        assert_eq!(grid_position(10, 30, 3), (1, 0));
        assert_eq!(grid_position(29, 30, 3), (2, 9));
        // 13 fields over 2 columns: 7 + 6
        assert_eq!(grid_position(6, 13, 2), (0, 6));
        assert_eq!(grid_position(7, 13, 2), (1, 0));
    }

    #[test]
    fn test_bind_30_fields_three_columns() {
        let canvas = CanvasSize::new(576.0, 384.0);
        let elements = bind(&record(30), &selection(30), &canvas);
        assert_eq!(elements.len(), 30);
        assert_eq!(distinct_xs(&elements), 3);
        for el in &elements {
            assert!(el.x >= 0.0 && el.bounds().right() <= canvas.width + 1e-9);
            assert!(el.y >= 0.0 && el.bounds().bottom() <= canvas.height + 1e-9);
        }
    }

    #[test]
    fn test_bind_single_column_stack() {
        let canvas = CanvasSize::new(384.0, 576.0);
        let elements = bind(&record(5), &selection(5), &canvas);
        assert_eq!(distinct_xs(&elements), 1);
        let ys: Vec<f64> = elements.iter().map(|e| e.y).collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_absent_fields_dropped() {
        let mut sel = selection(3);
        sel.push(FieldSelection::text("nonexistentThing"));
        let elements = bind(&record(3), &sel, &CanvasSize::default());
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn test_text_content_and_font_cap() {
        let rec: FlatRecord = [("ItemKey".to_string(), "A1".to_string())].into_iter().collect();
        let sel = vec![FieldSelection::text("itemKey").with_label("Item")];
        let elements = bind(&rec, &sel, &CanvasSize::default());
        match &elements[0].kind {
            ElementKind::Text(t) => {
                assert_eq!(t.text, "Item: A1");
                assert_eq!(t.font_size, BatchConfig::default().max_field_font);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_rtl_values_fit_narrower() {
        let canvas = CanvasSize::new(384.0, 576.0);
        let latin: FlatRecord = [("description".to_string(), "Chicken Grilld".to_string())]
            .into_iter()
            .collect();
        let arabic: FlatRecord = [("description".to_string(), "دجاج مشوي طازج".to_string())]
            .into_iter()
            .collect();
        let sel = vec![FieldSelection::text("description").with_label("Item")];
        let size = |rec: &FlatRecord| match &bind(rec, &sel, &canvas)[0].kind {
            ElementKind::Text(t) => t.font_size,
            other => panic!("expected text, got {:?}", other),
        };
        // 364 / (20 chars * 1.0) * 0.85
        assert_eq!(size(&arabic), 15.0);
        assert_eq!(size(&latin), BatchConfig::default().max_field_font);
    }

    #[test]
    fn test_tiny_rows_never_go_below_minimum_font() {
        let sel = selection(12);
        let elements = bind(&record(12), &sel, &CanvasSize::new(384.0, 60.0));
        assert_eq!(elements.len(), 12);
        for el in &elements {
            if let ElementKind::Text(t) = &el.kind {
                assert_eq!(t.font_size, MIN_FONT_SIZE);
            }
        }
    }

    #[test]
    fn test_barcode_band_at_bottom() {
        let canvas = CanvasSize::new(384.0, 576.0);
        let rec: FlatRecord = [
            ("batchNo".to_string(), "L-7".to_string()),
            ("gtin".to_string(), "4006381333931".to_string()),
        ]
        .into_iter()
        .collect();
        let sel = vec![
            FieldSelection::text("batchNo"),
            FieldSelection::barcode("gtin", BarcodeFormat::Ean13),
        ];
        let elements = bind(&rec, &sel, &canvas);
        assert_eq!(elements.len(), 2);
        let code = &elements[1];
        assert_eq!(code.type_name(), "barcode");
        assert!((code.bounds().bottom() - (canvas.height - 10.0)).abs() < 1e-9);
        assert!((code.height - canvas.height * 0.25).abs() < 1e-9);
        assert!(elements[0].bounds().bottom() <= code.y);
    }

    #[test]
    fn test_layers_follow_selection_order() {
        let elements = bind(&record(4), &selection(4), &CanvasSize::default());
        let layers: Vec<i64> = elements.iter().map(|e| e.layer).collect();
        assert_eq!(layers, vec![100, 200, 300, 400]);
    }

    #[test]
    fn test_empty_selection() {
        assert!(bind(&record(4), &[], &CanvasSize::default()).is_empty());
    }
}
