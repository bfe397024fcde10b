//! Edit reconciler
//!
//! Reopening a stored line item must reproduce the exact selection that
//! created it (lossless restore), and saving the edit must leave every
//! sibling of the same restaurant order priced consistently, in particular
//! the shared paid-drink cost which lives on exactly one payer line.

use crate::catalog::{self, CatalogAdapter};
use crate::drinks::{self, GlobalDrinkPool};
use crate::error::{EngineError, EngineResult};
use crate::pricing;
use crate::selection::SelectionState;
use crate::store::CartStore;
use crate::telemetry::{ReconcileEvent, Telemetry};
use rust_decimal::Decimal;
use shared::{CartLineItem, Customizations};
use std::collections::BTreeMap;

/// How sibling line totals are rewritten when an edit lands.
///
/// `Recompute` (the default) rebuilds every sibling total from its stored
/// unit price. `PreserveBaseline` keeps each sibling's stored total and only
/// moves the paid-drink contribution, so manual price adjustments and
/// legacy drift survive an edit; use it when migrating carts written by
/// older price calculators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcilePolicy {
    #[default]
    Recompute,
    PreserveBaseline,
}

/// Editable state recovered from a stored line item
#[derive(Debug, Clone)]
pub struct RestoredEdit {
    pub item_id: String,
    pub selection: SelectionState,
    pub pool: GlobalDrinkPool,
}

pub struct EditReconciler<'a> {
    catalog: &'a dyn CatalogAdapter,
    telemetry: &'a Telemetry,
    policy: ReconcilePolicy,
}

impl<'a> EditReconciler<'a> {
    pub fn new(catalog: &'a dyn CatalogAdapter, telemetry: &'a Telemetry) -> Self {
        Self::with_policy(catalog, telemetry, ReconcilePolicy::default())
    }

    pub fn with_policy(
        catalog: &'a dyn CatalogAdapter,
        telemetry: &'a Telemetry,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            catalog,
            telemetry,
            policy,
        }
    }

    /// Rebuild the selection and drink pool behind a stored line item.
    ///
    /// The paid pool comes from the current payer sibling, not from the
    /// edited item: paid drinks are order-scoped state and the payer's copy
    /// is authoritative. The free map is the edited item's own.
    pub fn restore(&self, item: &CartLineItem, siblings: &[CartLineItem]) -> RestoredEdit {
        let payload = &item.customizations;
        let mut selection =
            SelectionState::new(payload.menu_item_id.clone(), payload.restaurant_id.clone());
        if let Some(variant) = &payload.variant {
            selection.set_variant(variant.clone());
        }
        selection.quantity = item.quantity.max(1);
        selection.supplements = payload.global_supplements();
        selection.removed_ingredients = payload.removed_ingredients.iter().cloned().collect();
        selection.ingredient_preferences = payload.ingredient_preferences.clone();
        selection.pack_selections = payload.pack_selections.clone();
        selection.pack_ingredient_preferences = payload.pack_ingredient_preferences.clone();
        selection.pack_supplements = payload.pack_supplement_selections.clone();
        self.recover_leaked_pack_supplements(payload, &mut selection);

        if let Some(label) = &payload.size {
            match catalog::find_pricing_by_label(self.catalog, &payload.menu_item_id, label) {
                Some(pricing) => selection.set_pricing(pricing),
                None => {
                    tracing::warn!(size = %label, "Stored size label no longer priced, restoring without pricing");
                }
            }
        }

        let payer_paid = drinks::payer(siblings)
            .map(|p| p.customizations.paid_drink_quantities.clone())
            .unwrap_or_default();
        let free = per_unit_free(payload, item.quantity);
        let pool = GlobalDrinkPool::from_stored(&payer_paid, &free, &payload.drinks);

        RestoredEdit {
            item_id: item.id.clone(),
            selection,
            pool,
        }
    }

    /// Legacy writers leaked pack-scoped names into the global supplements
    /// list; fold them back into their slots so the edit form shows them.
    fn recover_leaked_pack_supplements(
        &self,
        payload: &Customizations,
        selection: &mut SelectionState,
    ) {
        for name in &payload.supplements {
            if let Some((slot, supplement)) = Customizations::split_pack_key(name) {
                let slot_supps = selection.pack_supplements.entry(slot).or_default();
                if !slot_supps.iter().any(|s| s == supplement) {
                    slot_supps.push(supplement.to_string());
                }
            }
        }
    }

    /// Write an edited selection back and re-reconcile every sibling.
    ///
    /// The edited item is always repriced from the new selection. Siblings
    /// only move by the paid-drink difference under `PreserveBaseline`, or
    /// are rebuilt from their stored unit price under `Recompute`. All
    /// writes happen after every new total is computed.
    pub fn apply(
        &self,
        item_id: &str,
        selection: &SelectionState,
        pool: &GlobalDrinkPool,
        store: &mut dyn CartStore,
    ) -> EngineResult<()> {
        let siblings = store.list_by_restaurant(&selection.restaurant_id);
        let target = siblings
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| EngineError::LineItemNotFound(item_id.to_string()))?;

        let drinks_catalog = self.catalog.restaurant_drinks(&selection.restaurant_id);
        let new_paid_total = drinks::paid_total(pool, &drinks_catalog, self.telemetry);
        let payer_id = drinks::payer(&siblings).map(|p| p.id.clone());

        let mut updated = Vec::with_capacity(siblings.len());
        for sibling in &siblings {
            let is_payer = payer_id.as_deref() == Some(sibling.id.as_str());
            let paid_share = if is_payer { new_paid_total } else { Decimal::ZERO };

            let new_item = if sibling.id == item_id {
                self.rebuild_target(target, selection, pool, &drinks_catalog, is_payer, paid_share)
            } else {
                self.reprice_sibling(sibling, pool, &drinks_catalog, is_payer, paid_share)
            };

            if is_payer && new_item.has_paid_drinks() {
                self.telemetry.emit(ReconcileEvent::PayerSelected {
                    item_id: new_item.id.clone(),
                });
            }
            if sibling.id != *item_id && !pricing::money_eq(new_item.line_total, sibling.line_total)
            {
                self.telemetry.emit(ReconcileEvent::PriceDeltaApplied {
                    item_id: new_item.id.clone(),
                    delta: pricing::to_f64(
                        pricing::to_decimal(new_item.line_total)
                            - pricing::to_decimal(sibling.line_total),
                    ),
                });
            }
            updated.push(new_item);
        }

        for item in updated {
            // Ids are stable across an edit, so this never misses
            let id = item.id.clone();
            store.update_line_item(&id, item);
        }
        Ok(())
    }

    /// Full reprice of the edited item from its new selection.
    fn rebuild_target(
        &self,
        target: &CartLineItem,
        selection: &SelectionState,
        pool: &GlobalDrinkPool,
        drinks_catalog: &[shared::models::Drink],
        is_payer: bool,
        paid_share: Decimal,
    ) -> CartLineItem {
        let variant_id = selection.variant_id.clone().unwrap_or_default();
        let variant = catalog::find_variant(self.catalog, &selection.menu_item_id, &variant_id)
            .unwrap_or_else(|| {
                tracing::warn!(variant_id = %variant_id, "Variant missing from catalog, repricing against placeholder");
                placeholder_variant(&variant_id)
            });
        let unit = pricing::unit_price(selection, &variant, self.catalog);
        let declared = self.catalog.parse_pack_supplements(&variant.description);
        let quantity = selection.quantity.max(1);
        let (pack_total, line_quantity) = if variant.is_pack {
            // Decomposed pack units stay at quantity 1
            (pricing::pack_supplement_total(selection, &declared), 1)
        } else {
            (Decimal::ZERO, quantity)
        };

        let free = drinks::free_allocation(
            pool,
            selection.pricing.as_ref(),
            line_quantity,
            variant.is_pack,
        );
        let paid = if is_payer {
            pool.paid_quantities().clone()
        } else {
            BTreeMap::new()
        };

        let mut payload = Customizations {
            menu_item_id: selection.menu_item_id.clone(),
            restaurant_id: selection.restaurant_id.clone(),
            main_item_quantity: quantity,
            variant: Some(variant.id.clone()),
            size: selection.pricing.as_ref().map(|p| p.label.clone()),
            portion: selection.pricing.as_ref().and_then(|p| p.portion.clone()),
            supplements: selection
                .supplements
                .iter()
                .filter(|s| !Customizations::is_pack_scoped(s))
                .cloned()
                .collect(),
            removed_ingredients: selection.removed_ingredients.iter().cloned().collect(),
            ingredient_preferences: selection.ingredient_preferences.clone(),
            drinks: drinks::drink_lines(&free, &paid, pool, drinks_catalog, self.telemetry),
            free_drink_quantities: free,
            paid_drink_quantities: paid,
            pack_selections: selection.pack_selections.clone(),
            pack_ingredient_preferences: selection.pack_ingredient_preferences.clone(),
            pack_supplement_selections: selection.pack_supplements.clone(),
            pack_supplement_prices: declared_pack_prices(selection, &declared),
            is_special_pack: variant.is_pack,
            popup_session_id: target.customizations.popup_session_id.clone(),
            ..Default::default()
        };
        payload.normalize();

        let line_total = pricing::total_for_line_item(unit, line_quantity, pack_total, paid_share);
        let mut item = CartLineItem::new(
            &variant.name,
            pricing::to_f64(unit),
            pricing::to_f64(line_total),
            line_quantity,
            payload,
        );
        item.id = target.id.clone();
        item
    }

    /// Adjust an untouched sibling for the new paid-drink state.
    fn reprice_sibling(
        &self,
        sibling: &CartLineItem,
        pool: &GlobalDrinkPool,
        drinks_catalog: &[shared::models::Drink],
        is_payer: bool,
        paid_share: Decimal,
    ) -> CartLineItem {
        let mut item = sibling.clone();
        let old_paid = drinks::stored_paid_total(
            &item.customizations.paid_drink_quantities,
            drinks_catalog,
            self.telemetry,
        );

        item.customizations.paid_drink_quantities = if is_payer {
            pool.paid_quantities().clone()
        } else {
            BTreeMap::new()
        };
        item.customizations.drinks = drinks::drink_lines(
            &item.customizations.free_drink_quantities,
            &item.customizations.paid_drink_quantities,
            pool,
            drinks_catalog,
            self.telemetry,
        );
        item.customizations.normalize();
        item.drink_quantities = item.customizations.merged_drink_quantities();

        let new_total = match self.policy {
            ReconcilePolicy::PreserveBaseline => {
                // Keep whatever the line cost before, minus its old paid
                // share, plus its new one
                pricing::to_decimal(item.line_total) - old_paid + paid_share
            }
            ReconcilePolicy::Recompute => {
                let pack_total = pricing::stored_pack_supplement_total(&item.customizations);
                pricing::total_for_line_item(
                    pricing::to_decimal(item.unit_price),
                    item.quantity,
                    pack_total,
                    paid_share,
                )
            }
        };
        item.line_total = pricing::to_f64(new_total);
        item
    }
}

fn declared_pack_prices(
    selection: &SelectionState,
    declared: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let mut prices = BTreeMap::new();
    for (slot, names) in &selection.pack_supplements {
        for name in names {
            let price = declared.get(name).copied().unwrap_or(0.0);
            prices.insert(Customizations::pack_key(*slot, name), price);
        }
    }
    prices
}

/// Stored free maps hold the total allocation; the edit form works per
/// unit, so divide back by the line quantity for plain items. Pack units
/// have quantity 1 and pass through unchanged.
fn per_unit_free(payload: &Customizations, quantity: i32) -> BTreeMap<String, i32> {
    let divisor = if payload.is_special_pack {
        1
    } else {
        quantity.max(1)
    };
    payload
        .free_drink_quantities
        .iter()
        .filter(|(_, qty)| **qty > 0)
        .map(|(id, qty)| (id.clone(), (*qty / divisor).max(1)))
        .collect()
}

fn placeholder_variant(variant_id: &str) -> shared::models::Variant {
    shared::models::Variant {
        id: variant_id.to_string(),
        name: variant_id.to_string(),
        description: String::new(),
        base_price: 0.0,
        is_pack: false,
        is_offer: true,
        pack_slots: vec![],
        ingredients: vec![],
    }
}

/// Re-reconcile a restaurant order after a line item was deleted: the
/// paid-drink cost migrates to the new earliest sibling when the payer
/// itself was removed.
pub fn reconcile_after_removal(
    catalog: &dyn CatalogAdapter,
    telemetry: &Telemetry,
    policy: ReconcilePolicy,
    restaurant_id: &str,
    removed: &CartLineItem,
    store: &mut dyn CartStore,
) -> EngineResult<()> {
    if !removed.has_paid_drinks() {
        return Ok(());
    }
    let siblings = store.list_by_restaurant(restaurant_id);
    let Some(new_payer) = drinks::payer(&siblings) else {
        return Ok(());
    };

    let drinks_catalog = catalog.restaurant_drinks(restaurant_id);
    let paid = removed.customizations.paid_drink_quantities.clone();
    let paid_total = drinks::stored_paid_total(&paid, &drinks_catalog, telemetry);

    let mut item = new_payer.clone();
    item.customizations.paid_drink_quantities = paid;
    item.customizations.normalize();
    item.drink_quantities = item.customizations.merged_drink_quantities();
    let pool = GlobalDrinkPool::from_stored(
        &item.customizations.paid_drink_quantities,
        &BTreeMap::new(),
        &removed.customizations.drinks,
    );
    item.customizations.drinks = drinks::drink_lines(
        &item.customizations.free_drink_quantities,
        &item.customizations.paid_drink_quantities,
        &pool,
        &drinks_catalog,
        telemetry,
    );

    let new_total = match policy {
        ReconcilePolicy::PreserveBaseline => pricing::to_decimal(item.line_total) + paid_total,
        ReconcilePolicy::Recompute => pricing::total_for_line_item(
            pricing::to_decimal(item.unit_price),
            item.quantity,
            pricing::stored_pack_supplement_total(&item.customizations),
            paid_total,
        ),
    };
    item.line_total = pricing::to_f64(new_total);

    telemetry.emit(ReconcileEvent::PayerSelected {
        item_id: item.id.clone(),
    });
    telemetry.emit(ReconcileEvent::PriceDeltaApplied {
        item_id: item.id.clone(),
        delta: pricing::to_f64(paid_total),
    });
    let id = item.id.clone();
    store.update_line_item(&id, item);
    Ok(())
}
