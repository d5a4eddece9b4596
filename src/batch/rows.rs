//! Picking one row out of several records that share a batch number.
//!
//! The operator's previous choice is remembered as a [`RowIdentity`]. The
//! next fetch is matched against it with a widening fallback:
//!
//! 1. item + customer + ship-to country
//! 2. item + customer
//! 3. item
//! 4. customer
//! 5. first row
//!
//! A tier is skipped when the identity lacks one of its fields.

use serde::{Deserialize, Serialize};

use super::alias::{FlatRecord, resolve_value};

/// Fields that identify a row within a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowIdentity {
    pub item_key: Option<String>,
    pub cust_key: Option<String>,
    pub ship_to_country: Option<String>,
}

impl RowIdentity {
    pub fn from_record(record: &FlatRecord) -> Self {
        Self {
            item_key: resolve_value(record, "itemKey"),
            cust_key: resolve_value(record, "custKey"),
            ship_to_country: resolve_value(record, "shipToCountry"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_key.is_none() && self.cust_key.is_none() && self.ship_to_country.is_none()
    }
}

/// Tier that selected the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMatch {
    Full,
    ItemAndCustomer,
    Item,
    Customer,
    First,
}

fn same(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

/// Select the row that best matches `identity`.
///
/// Returns `None` only for an empty row list.
pub fn select_row<'a>(
    rows: &'a [FlatRecord],
    identity: &RowIdentity,
) -> Option<(usize, &'a FlatRecord, RowMatch)> {
    let first = rows.first()?;
    let candidates: Vec<RowIdentity> = rows.iter().map(RowIdentity::from_record).collect();

    let tiers: [(RowMatch, fn(&RowIdentity, &RowIdentity) -> bool); 4] = [
        (RowMatch::Full, |a, b| {
            same(&a.item_key, &b.item_key)
                && same(&a.cust_key, &b.cust_key)
                && same(&a.ship_to_country, &b.ship_to_country)
        }),
        (RowMatch::ItemAndCustomer, |a, b| {
            same(&a.item_key, &b.item_key) && same(&a.cust_key, &b.cust_key)
        }),
        (RowMatch::Item, |a, b| same(&a.item_key, &b.item_key)),
        (RowMatch::Customer, |a, b| same(&a.cust_key, &b.cust_key)),
    ];

    for (tier, matches) in tiers {
        if let Some(idx) = candidates.iter().position(|c| matches(identity, c)) {
            tracing::debug!("row {} selected by {:?}", idx, tier);
            return Some((idx, &rows[idx], tier));
        }
    }
    Some((0, first, RowMatch::First))
}
