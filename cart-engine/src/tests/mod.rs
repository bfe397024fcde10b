use crate::builder::OrderBuilder;
use crate::catalog::StaticCatalog;
use crate::drinks::GlobalDrinkPool;
use crate::selection::{SavedOrdersQueue, SelectionState};
use crate::store::MemoryCartStore;
use crate::telemetry::{ReconcileEvent, Telemetry};
use shared::models::{Drink, PackSlot, PricingOption, Variant};
use shared::CartLineItem;
use std::collections::BTreeMap;

mod test_reconcile;

// ========================================================================
// Shared fixtures: a restaurant with one plain item, one pack and drinks
// ========================================================================

fn test_catalog() -> StaticCatalog {
    let mut catalog = StaticCatalog::new();
    catalog.add_variant(
        "bocadillo",
        Variant {
            id: "v-bocadillo".into(),
            name: "Bocadillo de calamares".into(),
            description: String::new(),
            base_price: 0.0,
            is_pack: false,
            is_offer: false,
            pack_slots: vec![],
            ingredients: vec![],
        },
    );
    catalog.add_pricing("bocadillo", plain_pricing());
    catalog.add_variant(
        "menu-dia",
        Variant {
            id: "v-menu".into(),
            name: "Menú del día".into(),
            description: "extra queso +1.50, huevo +0.80".into(),
            base_price: 0.0,
            is_pack: true,
            is_offer: false,
            pack_slots: vec![
                PackSlot {
                    index: 0,
                    name: "Primero".into(),
                    options: vec!["sopa".into(), "ensalada".into()],
                    ingredients: vec![],
                },
                PackSlot {
                    index: 1,
                    name: "Segundo".into(),
                    options: vec!["pollo".into(), "merluza".into()],
                    ingredients: vec![],
                },
            ],
            ingredients: vec![],
        },
    );
    catalog.add_pricing("menu-dia", pack_pricing());
    catalog.add_drink(
        "rest-1",
        Drink {
            id: "cola".into(),
            name: "Cola".into(),
            size: "33cl".into(),
            price: 1.5,
        },
    );
    catalog.add_drink(
        "rest-1",
        Drink {
            id: "agua".into(),
            name: "Agua".into(),
            size: "50cl".into(),
            price: 1.0,
        },
    );
    catalog
}

fn plain_pricing() -> PricingOption {
    let mut global_supplements = BTreeMap::new();
    global_supplements.insert("queso".to_string(), 1.0);
    global_supplements.insert("bacon".to_string(), 1.2);
    PricingOption {
        id: "p-entera".into(),
        label: "entera".into(),
        portion: Some("grande".into()),
        base_price: 6.5,
        size_surcharge: 0.5,
        free_drink_ids: vec!["agua".into(), "cola".into()],
        free_drinks_per_unit: 1,
        global_supplements,
    }
}

fn pack_pricing() -> PricingOption {
    PricingOption {
        id: "p-menu".into(),
        label: "menú".into(),
        portion: None,
        base_price: 12.0,
        size_surcharge: 2.0,
        free_drink_ids: vec!["agua".into(), "cola".into()],
        free_drinks_per_unit: 1,
        global_supplements: BTreeMap::new(),
    }
}

fn plain_selection(quantity: i32) -> SelectionState {
    let mut s = SelectionState::new("bocadillo", "rest-1");
    s.set_variant("v-bocadillo");
    s.set_pricing(plain_pricing());
    s.set_quantity(quantity).unwrap();
    s
}

fn pack_selection(quantity: i32) -> SelectionState {
    let mut s = SelectionState::new("menu-dia", "rest-1");
    s.set_variant("v-menu");
    s.set_pricing(pack_pricing());
    s.set_quantity(quantity).unwrap();
    s.set_pack_slot_option(0, "sopa");
    s.set_pack_slot_option(1, "pollo");
    s
}

fn commit(
    catalog: &StaticCatalog,
    telemetry: &Telemetry,
    store: &mut MemoryCartStore,
    selection: &SelectionState,
    pool: &GlobalDrinkPool,
) -> Vec<CartLineItem> {
    OrderBuilder::new(catalog, telemetry)
        .commit(selection, &SavedOrdersQueue::new(), pool, store, "session-1")
        .unwrap()
}
