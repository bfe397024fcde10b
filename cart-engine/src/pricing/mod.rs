//! Price calculation using rust_decimal for precision
//!
//! All arithmetic runs on `Decimal` internally; f64 only appears at the
//! storage/serialization boundary, rounded to 2 decimal places on the way
//! out. Comparisons use a 0.01 tolerance so float jitter in stored values
//! never triggers a spurious recalculation.

use crate::catalog::CatalogAdapter;
use crate::selection::SelectionState;
use rust_decimal::prelude::*;
use shared::models::Variant;
use shared::Customizations;
use std::collections::BTreeMap;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
///
/// Stored payloads are the only source of f64 here; a non-finite value means
/// a corrupt payload, which degrades to zero rather than poisoning a total.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

/// Per-unit price of a selection: base price, plus the size surcharge for
/// plain menu items, plus the chosen global supplements.
///
/// Global supplements scale with the final line quantity because they are
/// part of the unit price; pack-scoped supplements are accounted separately
/// in [`pack_supplement_total`] and must never appear here.
pub fn unit_price(
    selection: &SelectionState,
    variant: &Variant,
    catalog: &dyn CatalogAdapter,
) -> Decimal {
    let base = match &selection.pricing {
        Some(pricing) => {
            let mut base = to_decimal(pricing.base_price);
            // Size surcharge applies to plain menu items only
            if !variant.is_pack && !variant.is_offer {
                base += to_decimal(pricing.size_surcharge);
            }
            base
        }
        // Offer items may be ordered without a size
        None => to_decimal(variant.base_price),
    };

    base + global_supplement_sum(selection, catalog)
}

fn global_supplement_sum(selection: &SelectionState, catalog: &dyn CatalogAdapter) -> Decimal {
    let Some(pricing) = &selection.pricing else {
        return Decimal::ZERO;
    };
    let price_list = catalog.global_supplements(pricing);
    selection
        .supplements
        .iter()
        .filter(|name| !Customizations::is_pack_scoped(name))
        .map(|name| match price_list.get(name) {
            Some(price) => to_decimal(*price),
            None => {
                tracing::warn!(supplement = %name, "Supplement missing from price list, charging zero");
                Decimal::ZERO
            }
        })
        .sum()
}

/// Total of the pack-scoped supplements chosen across all slots, priced from
/// the pack's declared price list.
///
/// Computed once per decomposed unit and never re-multiplied by an outer
/// quantity: each decomposed unit already represents exactly one pack.
pub fn pack_supplement_total(
    selection: &SelectionState,
    declared_prices: &BTreeMap<String, f64>,
) -> Decimal {
    selection
        .pack_supplements
        .iter()
        .flat_map(|(_, names)| names.iter())
        .map(|name| match declared_prices.get(name) {
            Some(price) => to_decimal(*price),
            None => {
                tracing::warn!(supplement = %name, "Pack supplement not declared by catalog, charging zero");
                Decimal::ZERO
            }
        })
        .sum()
}

/// Pack-supplement total from a stored payload's `"<slot>:<name>" → price`
/// map; used when recomputing an existing line item.
pub fn stored_pack_supplement_total(payload: &Customizations) -> Decimal {
    payload
        .pack_supplement_prices
        .values()
        .map(|p| to_decimal(*p))
        .sum()
}

/// Final amount for one line item.
///
/// Formula: unit_price × quantity + pack_supplement_total + paid_drinks,
/// where `paid_drinks` is non-zero only for the payer item.
pub fn total_for_line_item(
    unit_price: Decimal,
    quantity: i32,
    pack_supplement_total: Decimal,
    paid_drinks: Decimal,
) -> Decimal {
    unit_price * Decimal::from(quantity.max(0)) + pack_supplement_total + paid_drinks
}
