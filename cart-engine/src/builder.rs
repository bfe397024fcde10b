//! Order builder
//!
//! Turns staged selections into persisted cart line items in one commit.
//! Staged orders win over the live form: once the queue is non-empty the
//! live selection is only a draft and is not materialized. Pack variants
//! decompose into one line item per consumed unit so each pack can be
//! edited independently afterwards.

use crate::catalog::{self, CatalogAdapter};
use crate::drinks::{self, GlobalDrinkPool};
use crate::error::{EngineError, EngineResult};
use crate::pricing;
use crate::selection::{SavedOrdersQueue, SelectionState};
use crate::store::CartStore;
use crate::telemetry::{ReconcileEvent, Telemetry};
use rust_decimal::Decimal;
use shared::models::Variant;
use shared::{CartLineItem, Customizations};
use std::collections::BTreeMap;

pub struct OrderBuilder<'a> {
    catalog: &'a dyn CatalogAdapter,
    telemetry: &'a Telemetry,
}

impl<'a> OrderBuilder<'a> {
    pub fn new(catalog: &'a dyn CatalogAdapter, telemetry: &'a Telemetry) -> Self {
        Self { catalog, telemetry }
    }

    /// Materialize the commit set into the store.
    ///
    /// Returns the created line items in creation order. The whole batch is
    /// validated before anything is written, so an incomplete selection
    /// leaves the store untouched.
    pub fn commit(
        &self,
        live: &SelectionState,
        queue: &SavedOrdersQueue,
        pool: &GlobalDrinkPool,
        store: &mut dyn CartStore,
        session_id: &str,
    ) -> EngineResult<Vec<CartLineItem>> {
        let staged: Vec<&SelectionState> = if queue.has_any() {
            queue.iter().map(|o| &o.selection).collect()
        } else {
            vec![live]
        };

        for selection in &staged {
            if !selection.is_complete(self.catalog) {
                return Err(EngineError::IncompleteSelection(
                    selection.variant_id.clone().unwrap_or_default(),
                ));
            }
        }

        let mut items = Vec::new();
        // The paid pool is billed exactly once: the first materialized item
        // of the batch is the payer (it has the lowest id, ids are ordered)
        let mut payer_claimed = false;
        for selection in staged {
            self.materialize(selection, pool, session_id, &mut payer_claimed, &mut items)?;
        }

        for item in &items {
            store.add_line_item(item.clone());
        }
        self.telemetry.emit(ReconcileEvent::LineItemsCommitted {
            session_id: session_id.to_string(),
            count: items.len(),
        });
        Ok(items)
    }

    fn materialize(
        &self,
        selection: &SelectionState,
        pool: &GlobalDrinkPool,
        session_id: &str,
        payer_claimed: &mut bool,
        items: &mut Vec<CartLineItem>,
    ) -> EngineResult<()> {
        let variant_id = selection.variant_id.clone().unwrap_or_default();
        let variant = catalog::find_variant(self.catalog, &selection.menu_item_id, &variant_id)
            .unwrap_or_else(|| {
                tracing::warn!(variant_id = %variant_id, "Variant missing from catalog, using zero-price placeholder");
                placeholder_variant(&variant_id)
            });
        let drinks = self.catalog.restaurant_drinks(&selection.restaurant_id);

        let unit = pricing::unit_price(selection, &variant, self.catalog);
        let declared = self.catalog.parse_pack_supplements(&variant.description);
        let paid_total = drinks::paid_total(pool, &drinks, self.telemetry);

        if variant.is_pack {
            // One line item per consumed pack, each of quantity 1 with
            // identical pack-scoped customizations
            let pack_total = pricing::pack_supplement_total(selection, &declared);
            for _ in 0..selection.quantity.max(1) {
                let is_payer = claim_payer(payer_claimed, pool);
                let paid = if is_payer { paid_total } else { Decimal::ZERO };
                let item = self.build_item(
                    selection, &variant, pool, &drinks, session_id, unit, 1, pack_total, paid,
                    is_payer, &declared,
                )?;
                items.push(item);
            }
        } else {
            let is_payer = claim_payer(payer_claimed, pool);
            let paid = if is_payer { paid_total } else { Decimal::ZERO };
            let item = self.build_item(
                selection,
                &variant,
                pool,
                &drinks,
                session_id,
                unit,
                selection.quantity,
                Decimal::ZERO,
                paid,
                is_payer,
                &declared,
            )?;
            items.push(item);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_item(
        &self,
        selection: &SelectionState,
        variant: &Variant,
        pool: &GlobalDrinkPool,
        drinks: &[shared::models::Drink],
        session_id: &str,
        unit: Decimal,
        quantity: i32,
        pack_supplement_total: Decimal,
        paid_drinks: Decimal,
        is_payer: bool,
        declared: &BTreeMap<String, f64>,
    ) -> EngineResult<CartLineItem> {
        let free = drinks::free_allocation(
            pool,
            selection.pricing.as_ref(),
            quantity,
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
            main_item_quantity: selection.quantity,
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
            drinks: drinks::drink_lines(&free, &paid, pool, drinks, self.telemetry),
            free_drink_quantities: free,
            paid_drink_quantities: paid,
            pack_selections: selection.pack_selections.clone(),
            pack_ingredient_preferences: selection.pack_ingredient_preferences.clone(),
            pack_supplement_selections: selection.pack_supplements.clone(),
            pack_supplement_prices: pack_supplement_prices(selection, declared),
            is_special_pack: variant.is_pack,
            popup_session_id: session_id.to_string(),
            ..Default::default()
        };
        payload.normalize();

        let line_total =
            pricing::total_for_line_item(unit, quantity, pack_supplement_total, paid_drinks);
        let item = CartLineItem::new(
            &variant.name,
            pricing::to_f64(unit),
            pricing::to_f64(line_total),
            quantity,
            payload,
        );
        if is_payer && item.has_paid_drinks() {
            self.telemetry.emit(ReconcileEvent::PayerSelected {
                item_id: item.id.clone(),
            });
        }
        Ok(item)
    }
}

/// `"<slot>:<name>" → declared price` for every chosen pack supplement.
fn pack_supplement_prices(
    selection: &SelectionState,
    declared: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let mut prices = BTreeMap::new();
    for (slot, names) in &selection.pack_supplements {
        for name in names {
            let price = declared.get(name).copied().unwrap_or_else(|| {
                tracing::warn!(supplement = %name, "Pack supplement not declared by catalog, storing zero");
                0.0
            });
            prices.insert(Customizations::pack_key(*slot, name), price);
        }
    }
    prices
}

fn claim_payer(payer_claimed: &mut bool, pool: &GlobalDrinkPool) -> bool {
    if *payer_claimed || pool.paid_quantities().is_empty() {
        return false;
    }
    *payer_claimed = true;
    true
}

fn placeholder_variant(variant_id: &str) -> Variant {
    Variant {
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
