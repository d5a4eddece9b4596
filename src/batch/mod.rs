//! # Batch Binder
//!
//! Turns a fetched batch record into label content. Everything here is a
//! pure function of its inputs.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`alias`] | Logical field → record key resolution, record flattening |
//! | [`layout`] | Positioned elements for a field selection |
//! | [`rows`] | Choosing one row among records sharing a batch number |
//!
//! Templates may also carry data-bound text: `{{field}}` tokens in text,
//! barcode and QR values, filled by [`fill_placeholders`].

pub mod alias;
pub mod layout;
pub mod rows;

pub use alias::{FlatRecord, MatchStrategy, Resolved, flatten_record, flatten_records, resolve_field};
pub use layout::{Binder, FieldSelection, bind, column_count};
pub use rows::{RowIdentity, RowMatch, select_row};

use crate::element::{Element, ElementKind};

/// Replace `{{field}}` tokens using alias resolution.
///
/// Unresolved tokens are left as written so the operator can see them.
pub fn fill_string(s: &str, record: &FlatRecord) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match alias::resolve_value(record, name) {
            Some(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Data-bound copy of `elements`: every text, barcode and QR value (group
/// children included) has its `{{field}}` tokens filled from `record`.
pub fn fill_placeholders(elements: &[Element], record: &FlatRecord) -> Vec<Element> {
    elements
        .iter()
        .cloned()
        .map(|mut el| {
            el.walk_mut(&mut |e| match &mut e.kind {
                ElementKind::Text(t) => t.text = fill_string(&t.text, record),
                ElementKind::Barcode(b) => b.value = fill_string(&b.value, record),
                ElementKind::Qr(q) => q.value = fill_string(&q.value, record),
                _ => {}
            });
            el
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{BarcodeFormat, GroupProps};

    fn record() -> FlatRecord {
        [("ITEMKEY", "A1"), ("Lot_No", "L-7"), ("customer", "Acme")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fill_string() {
        let rec = record();
        assert_eq!(fill_string("Item {{itemKey}} / {{ batchNo }}", &rec), "Item A1 / L-7");
        assert_eq!(fill_string("no tokens", &rec), "no tokens");
    }

    #[test]
    fn test_unresolved_tokens_kept() {
        let rec = record();
        assert_eq!(fill_string("{{palletId}} {{itemKey}}", &rec), "{{palletId}} A1");
        assert_eq!(fill_string("open {{itemKey", &rec), "open {{itemKey");
        assert_eq!(fill_string("{{}}", &rec), "{{}}");
    }

    #[test]
    fn test_fill_placeholders_all_value_kinds() {
        let rec = record();
        let group = Element::new(ElementKind::Group(GroupProps {
            elements: vec![Element::text("For {{customerName}}")],
        }));
        let elements = vec![
            Element::text("Lot {{batchNo}}"),
            Element::barcode("{{itemKey}}", BarcodeFormat::Code128),
            Element::qr("https://trace.example/{{batchNo}}"),
            group,
        ];
        let filled = fill_placeholders(&elements, &rec);

        let values: Vec<String> = filled
            .iter()
            .map(|el| match &el.kind {
                ElementKind::Text(t) => t.text.clone(),
                ElementKind::Barcode(b) => b.value.clone(),
                ElementKind::Qr(q) => q.value.clone(),
                ElementKind::Group(g) => match &g.elements[0].kind {
                    ElementKind::Text(t) => t.text.clone(),
                    _ => String::new(),
                },
                _ => String::new(),
            })
            .collect();
        assert_eq!(
            values,
            vec!["Lot L-7", "A1", "https://trace.example/L-7", "For Acme"]
        );
        // Source untouched
        assert!(matches!(&elements[0].kind, ElementKind::Text(t) if t.text == "Lot {{batchNo}}"));
    }
}
