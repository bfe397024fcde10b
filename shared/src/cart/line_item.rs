//! Cart line item

use super::Customizations;
use crate::util;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One persisted cart entry
///
/// Pack orders are decomposed before they get here: a pack of quantity N is
/// stored as N line items of quantity 1, while plain and offer items keep
/// their ordered quantity on a single line.
///
/// `unit_price` is the pure per-unit price (base + global supplements).
/// `line_total` is what the customer pays for this line: unit price ×
/// quantity, plus pack supplements, plus the shared paid-drink cost on the
/// payer line only. Edits adjust `line_total` by deltas, so the two fields
/// are kept separately rather than derived on the fly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLineItem {
    /// Time-ordered id; the numeric prefix encodes creation order
    pub id: String,
    pub name: String,
    pub unit_price: f64,
    pub line_total: f64,
    pub quantity: i32,
    pub customizations: Customizations,
    /// Merged free+paid quantities, display only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub drink_quantities: BTreeMap<String, i32>,
}

impl CartLineItem {
    pub fn new(
        name: impl Into<String>,
        unit_price: f64,
        line_total: f64,
        quantity: i32,
        customizations: Customizations,
    ) -> Self {
        let drink_quantities = customizations.merged_drink_quantities();
        Self {
            id: util::ordered_id().to_string(),
            name: name.into(),
            unit_price,
            line_total,
            quantity,
            customizations,
            drink_quantities,
        }
    }

    /// Creation order derived from the id. Never cached as a flag: the payer
    /// is always recomputed as the minimum over the current sibling set.
    pub fn creation_order(&self) -> i64 {
        util::creation_order(&self.id)
    }

    pub fn restaurant_id(&self) -> &str {
        &self.customizations.restaurant_id
    }

    /// Whether this line currently carries any billable drink quantity.
    pub fn has_paid_drinks(&self) -> bool {
        self.customizations
            .paid_drink_quantities
            .values()
            .any(|q| *q > 0)
    }
}
