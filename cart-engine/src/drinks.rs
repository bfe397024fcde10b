//! Drink synchronizer
//!
//! The two global drink pools (free, paid) are scoped to one
//! ordering/editing session and shared by every line item produced in it.
//! Paid drinks are billed exactly once per restaurant order, to the payer:
//! the sibling with the earliest creation order, always recomputed from the
//! current sibling set and never cached as a flag.

use crate::pricing::to_decimal;
use crate::telemetry::{ReconcileEvent, Telemetry};
use rust_decimal::Decimal;
use shared::models::{Drink, PricingOption};
use shared::{CartLineItem, DrinkLine};
use std::collections::{BTreeMap, BTreeSet};

/// Classification of a drink id against the session pools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrinkClass {
    Free,
    Paid,
    Unselected,
}

/// Session-scoped drink state
///
/// Invariant: a drink id never carries a positive quantity in both pools;
/// marking a drink paid supersedes any free classification it had.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalDrinkPool {
    free_drink_quantities: BTreeMap<String, i32>,
    paid_drink_quantities: BTreeMap<String, i32>,
    drink_size_by_id: BTreeMap<String, String>,
    selected_drinks: BTreeSet<String>,
}

impl GlobalDrinkPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a pool from stored payloads: the payer's paid maps are the
    /// authoritative paid state, the edited item contributes its free state.
    pub fn from_stored(
        paid: &BTreeMap<String, i32>,
        free: &BTreeMap<String, i32>,
        drink_lines: &[DrinkLine],
    ) -> Self {
        let mut pool = Self::new();
        for (id, qty) in free {
            pool.set_free(id, *qty);
        }
        // Paid second: supersedes any overlapping free entry
        for (id, qty) in paid {
            pool.set_paid(id, *qty);
        }
        for line in drink_lines {
            if !line.size.is_empty() {
                pool.set_size(&line.id, &line.size);
            }
        }
        pool
    }

    /// Paid always wins over free, even if the drink was free before.
    pub fn classify(&self, drink_id: &str) -> DrinkClass {
        if self.paid_drink_quantities.get(drink_id).copied().unwrap_or(0) > 0 {
            DrinkClass::Paid
        } else if self.free_drink_quantities.get(drink_id).copied().unwrap_or(0) > 0 {
            DrinkClass::Free
        } else {
            DrinkClass::Unselected
        }
    }

    /// Set a free quantity. Zero removes the entry; any paid quantity for
    /// the same id is dropped to keep the pools disjoint.
    pub fn set_free(&mut self, drink_id: &str, quantity: i32) {
        self.paid_drink_quantities.remove(drink_id);
        if quantity > 0 {
            self.free_drink_quantities
                .insert(drink_id.to_string(), quantity);
            self.selected_drinks.insert(drink_id.to_string());
        } else {
            self.free_drink_quantities.remove(drink_id);
            self.sync_selected(drink_id);
        }
    }

    /// Set a paid quantity, superseding any free entry for the same id.
    pub fn set_paid(&mut self, drink_id: &str, quantity: i32) {
        self.free_drink_quantities.remove(drink_id);
        if quantity > 0 {
            self.paid_drink_quantities
                .insert(drink_id.to_string(), quantity);
            self.selected_drinks.insert(drink_id.to_string());
        } else {
            self.paid_drink_quantities.remove(drink_id);
            self.sync_selected(drink_id);
        }
    }

    pub fn remove(&mut self, drink_id: &str) {
        self.free_drink_quantities.remove(drink_id);
        self.paid_drink_quantities.remove(drink_id);
        self.selected_drinks.remove(drink_id);
    }

    pub fn set_size(&mut self, drink_id: &str, size: &str) {
        self.drink_size_by_id
            .insert(drink_id.to_string(), size.to_string());
    }

    fn sync_selected(&mut self, drink_id: &str) {
        if !self.free_drink_quantities.contains_key(drink_id)
            && !self.paid_drink_quantities.contains_key(drink_id)
        {
            self.selected_drinks.remove(drink_id);
        }
    }

    pub fn free_quantities(&self) -> &BTreeMap<String, i32> {
        &self.free_drink_quantities
    }

    pub fn paid_quantities(&self) -> &BTreeMap<String, i32> {
        &self.paid_drink_quantities
    }

    pub fn selected_drinks(&self) -> &BTreeSet<String> {
        &self.selected_drinks
    }

    pub fn size_of(&self, drink_id: &str) -> Option<&str> {
        self.drink_size_by_id.get(drink_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.free_drink_quantities.is_empty() && self.paid_drink_quantities.is_empty()
    }
}

/// Free-drink allocation for one produced line item.
///
/// Free drinks are granted per consumed unit for plain items and once per
/// decomposed pack instance (each instance already represents one pack, so
/// no further scaling). The entitlement budget is `free_drinks_per_unit ×
/// units`, consumed in the catalog's entitlement order; drinks outside the
/// eligible list, and everything when no size is chosen, allocate nothing.
pub fn free_allocation(
    pool: &GlobalDrinkPool,
    pricing: Option<&PricingOption>,
    quantity: i32,
    is_pack: bool,
) -> BTreeMap<String, i32> {
    let Some(pricing) = pricing else {
        return BTreeMap::new();
    };
    let units = if is_pack { 1 } else { quantity.max(1) };
    let mut budget = pricing.free_drinks_per_unit.max(0) * units;
    if budget == 0 {
        return BTreeMap::new();
    }

    let order: Vec<&str> = if pricing.free_drink_ids.is_empty() {
        pool.free_quantities().keys().map(String::as_str).collect()
    } else {
        pricing.free_drink_ids.iter().map(String::as_str).collect()
    };

    let mut allocation = BTreeMap::new();
    for id in order {
        let per_unit = pool.free_quantities().get(id).copied().unwrap_or(0);
        if per_unit <= 0 {
            continue;
        }
        let take = (per_unit * units).min(budget);
        if take > 0 {
            allocation.insert(id.to_string(), take);
            budget -= take;
        }
        if budget == 0 {
            break;
        }
    }
    allocation
}

/// Resolve a drink id against the restaurant catalog; a missing id becomes
/// a zero-price placeholder so one stale reference cannot abort a commit.
pub fn resolve_drink(drinks: &[Drink], drink_id: &str, telemetry: &Telemetry) -> Drink {
    match drinks.iter().find(|d| d.id == drink_id) {
        Some(drink) => drink.clone(),
        None => {
            telemetry.emit(ReconcileEvent::PlaceholderDrink {
                drink_id: drink_id.to_string(),
            });
            Drink::placeholder(drink_id)
        }
    }
}

/// Total paid-drink cost: Σ price × quantity over the paid pool.
/// Billed exactly once per restaurant order, to the payer.
pub fn paid_total(pool: &GlobalDrinkPool, drinks: &[Drink], telemetry: &Telemetry) -> Decimal {
    pool.paid_quantities()
        .iter()
        .filter(|(_, qty)| **qty > 0)
        .map(|(id, qty)| {
            let drink = resolve_drink(drinks, id, telemetry);
            to_decimal(drink.price) * Decimal::from(*qty)
        })
        .sum()
}

/// Paid total from stored quantity maps (reconciliation baseline).
pub fn stored_paid_total(
    paid: &BTreeMap<String, i32>,
    drinks: &[Drink],
    telemetry: &Telemetry,
) -> Decimal {
    paid.iter()
        .filter(|(_, qty)| **qty > 0)
        .map(|(id, qty)| {
            let drink = resolve_drink(drinks, id, telemetry);
            to_decimal(drink.price) * Decimal::from(*qty)
        })
        .sum()
}

/// The payer of a restaurant-scoped sibling set: earliest creation order.
pub fn payer(items: &[CartLineItem]) -> Option<&CartLineItem> {
    items.iter().min_by_key(|i| i.creation_order())
}

/// Display drink list for one line item: paid rows first, then free, each
/// group in id order (stable, so serialized payloads are deterministic).
pub fn drink_lines(
    free: &BTreeMap<String, i32>,
    paid: &BTreeMap<String, i32>,
    pool: &GlobalDrinkPool,
    drinks: &[Drink],
    telemetry: &Telemetry,
) -> Vec<DrinkLine> {
    let mut lines = Vec::new();
    for id in paid.iter().filter(|(_, q)| **q > 0).map(|(id, _)| id) {
        let drink = resolve_drink(drinks, id, telemetry);
        telemetry.emit(ReconcileEvent::DrinkClassified {
            drink_id: id.clone(),
            paid: true,
        });
        lines.push(DrinkLine {
            id: id.clone(),
            name: drink.name,
            size: pool.size_of(id).unwrap_or(&drink.size).to_string(),
            price: drink.price,
            is_free: false,
        });
    }
    for id in free.iter().filter(|(_, q)| **q > 0).map(|(id, _)| id) {
        let drink = resolve_drink(drinks, id, telemetry);
        telemetry.emit(ReconcileEvent::DrinkClassified {
            drink_id: id.clone(),
            paid: false,
        });
        lines.push(DrinkLine {
            id: id.clone(),
            name: drink.name,
            size: pool.size_of(id).unwrap_or(&drink.size).to_string(),
            price: drink.price,
            is_free: true,
        });
    }
    lines
}
