//! Field-name alias resolution.
//!
//! Batch records come from several upstream systems and spell the same
//! logical field many ways (`ItemKey`, `itemKey`, `ITEMKEY`,
//! `Assembly_Item_Key`). A logical field is resolved by trying, in order:
//!
//! | # | Strategy | Example for `itemKey` |
//! |---|----------|-----------------------|
//! | 1 | Known alias, case-insensitive | `ITEM_KEY` |
//! | 2 | Exact field name | `itemKey` |
//! | 3 | Normalized (alphanumeric, lowercase) | `Item-Key` |
//! | 4 | Normalized substring | `Assembly_Item_Key` |
//!
//! The first non-empty value wins. A field nothing matches is absent; that
//! is never an error.

use std::collections::BTreeMap;

use serde_json::Value;

/// One batch record with scalar values, keyed by source field name.
///
/// Sorted keys make every "first match" deterministic.
pub type FlatRecord = BTreeMap<String, String>;

/// Known spellings per logical field.
pub const ALIASES: &[(&str, &[&str])] = &[
    ("itemKey", &["itemKey", "item_key", "itemNo", "item_no", "itemCode", "sku", "productCode"]),
    ("custKey", &["custKey", "cust_key", "customerKey", "customer_key", "customerNo", "custNo", "customerCode"]),
    ("batchNo", &["batchNo", "batch_no", "batchNumber", "batch", "lotNo", "lot_no", "lotNumber", "lot"]),
    ("shipToCountry", &["shipToCountry", "ship_to_country", "country", "destinationCountry", "countryOfDestination"]),
    ("productionDate", &["productionDate", "production_date", "prodDate", "mfgDate", "manufactureDate", "packDate"]),
    ("expiryDate", &["expiryDate", "expiry_date", "expDate", "expirationDate", "bestBefore", "useBy", "bbd"]),
    ("description", &["description", "desc", "itemDescription", "productDescription", "productName", "itemName"]),
    ("customerName", &["customerName", "customer_name", "custName", "customer"]),
    ("netWeight", &["netWeight", "net_weight", "netWt", "weight", "netWeightKg"]),
    ("grossWeight", &["grossWeight", "gross_weight", "grossWt"]),
    ("quantity", &["quantity", "qty", "units", "packQty"]),
    ("allergens", &["allergens", "allergen", "allergenInfo", "contains"]),
    ("ingredients", &["ingredients", "ingredient", "ingredientList"]),
    ("storage", &["storage", "storageConditions", "storageInstructions", "keep"]),
    ("origin", &["origin", "countryOfOrigin", "madeIn"]),
    ("gtin", &["gtin", "ean", "ean13", "upc", "barcode"]),
];

/// Shortest normalized alias allowed to match as a substring.
const MIN_SUBSTRING_LEN: usize = 3;

/// Which strategy matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Alias,
    Exact,
    Normalized,
    Substring,
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Source key in the record.
    pub key: String,
    pub value: String,
    pub strategy: MatchStrategy,
}

/// Known aliases for a logical field (case-insensitive lookup of the field).
pub fn aliases_for(field: &str) -> &'static [&'static str] {
    ALIASES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(field))
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

/// Lowercase alphanumerics only.
pub fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn first_non_empty<'a>(
    record: &'a FlatRecord,
    mut matches: impl FnMut(&str) -> bool,
) -> Option<(&'a String, &'a String)> {
    record
        .iter()
        .find(|(key, value)| !value.trim().is_empty() && matches(key))
}

/// Resolve a logical field against a record.
pub fn resolve_field(record: &FlatRecord, field: &str) -> Option<Resolved> {
    let hit = |(key, value): (&String, &String), strategy| Resolved {
        key: key.clone(),
        value: value.trim().to_string(),
        strategy,
    };

    let aliases = aliases_for(field);
    for alias in aliases {
        if let Some(found) = first_non_empty(record, |k| k.eq_ignore_ascii_case(alias)) {
            return Some(hit(found, MatchStrategy::Alias));
        }
    }

    if let Some(found) = record.get_key_value(field).filter(|(_, v)| !v.trim().is_empty()) {
        return Some(hit(found, MatchStrategy::Exact));
    }

    let candidates: Vec<String> = std::iter::once(field)
        .chain(aliases.iter().copied())
        .map(normalize)
        .filter(|c| !c.is_empty())
        .collect();

    for candidate in &candidates {
        if let Some(found) = first_non_empty(record, |k| normalize(k) == *candidate) {
            return Some(hit(found, MatchStrategy::Normalized));
        }
    }

    for candidate in candidates.iter().filter(|c| c.chars().count() >= MIN_SUBSTRING_LEN) {
        if let Some(found) = first_non_empty(record, |k| normalize(k).contains(candidate.as_str())) {
            return Some(hit(found, MatchStrategy::Substring));
        }
    }

    tracing::debug!("field '{}' not found in record", field);
    None
}

/// Resolved value only.
pub fn resolve_value(record: &FlatRecord, field: &str) -> Option<String> {
    resolve_field(record, field).map(|r| r.value)
}

/// Scalar JSON value as text. Null, arrays and objects have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten a near-flat JSON record.
///
/// Top-level scalars are kept as-is; scalars inside a nested object become
/// `parent.child`. Anything deeper is dropped. Non-object input yields an
/// empty record.
pub fn flatten_record(value: &Value) -> FlatRecord {
    let mut out = FlatRecord::new();
    let Value::Object(map) = value else {
        tracing::warn!("batch record is not an object");
        return out;
    };
    for (key, v) in map {
        match v {
            Value::Object(inner) => {
                for (child, cv) in inner {
                    if let Some(text) = scalar_text(cv) {
                        out.insert(format!("{}.{}", key, child), text);
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    out.insert(key.clone(), text);
                }
            }
        }
    }
    out
}

/// Flatten an API response that is either one record or an array of them.
pub fn flatten_records(value: &Value) -> Vec<FlatRecord> {
    match value {
        Value::Array(items) => items.iter().map(flatten_record).collect(),
        other => vec![flatten_record(other)],
    }
}
