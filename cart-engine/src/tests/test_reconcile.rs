use super::*;
use crate::reconcile::{reconcile_after_removal, EditReconciler, ReconcilePolicy};
use crate::session::{OrderSession, ReconcileLocks};
use crate::store::CartStore;
use crate::pricing;
use serde_json::json;
use shared::Customizations;

fn reload_through_json(store: &mut MemoryCartStore, id: &str) {
    let mut item = store.get(id).unwrap().clone();
    let value = serde_json::to_value(&item.customizations).unwrap();
    item.customizations = Customizations::migrate(value);
    store.update_line_item(id, item);
}

// ------------------------------------------------------------------------
// Lossless edit-restore across a storage round trip
// ------------------------------------------------------------------------
#[test]
fn test_restore_is_lossless_after_storage() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let mut store = MemoryCartStore::new();

    let mut selection = pack_selection(1);
    selection.toggle_pack_supplement(0, "extra queso");
    selection.set_pack_ingredient_preference(
        1,
        "ajo",
        shared::models::IngredientPreference::Less,
    );
    let mut pool = GlobalDrinkPool::new();
    pool.set_free("agua", 1);
    let items = commit(&catalog, &telemetry, &mut store, &selection, &pool);
    reload_through_json(&mut store, &items[0].id);

    let siblings = store.list_by_restaurant("rest-1");
    let reconciler = EditReconciler::new(&catalog, &telemetry);
    let restored = reconciler.restore(store.get(&items[0].id).unwrap(), &siblings);

    assert_eq!(restored.selection.variant_id.as_deref(), Some("v-menu"));
    assert_eq!(
        restored.selection.pack_selections.get(&0).map(String::as_str),
        Some("sopa")
    );
    assert_eq!(
        restored.selection.pack_supplements.get(&0),
        Some(&vec!["extra queso".to_string()])
    );
    assert_eq!(
        restored
            .selection
            .pack_ingredient_preferences
            .get(&1)
            .and_then(|p| p.get("ajo")),
        Some(&shared::models::IngredientPreference::Less)
    );
    assert_eq!(
        restored.selection.pricing.as_ref().map(|p| p.label.as_str()),
        Some("menú")
    );
    assert_eq!(restored.pool.free_quantities().get("agua"), Some(&1));
}

// ------------------------------------------------------------------------
// Editing a non-payer never moves the payer's total
// ------------------------------------------------------------------------
#[test]
fn test_editing_non_payer_leaves_payer_stable() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let mut store = MemoryCartStore::new();

    let mut pool = GlobalDrinkPool::new();
    pool.set_paid("cola", 2);
    commit(&catalog, &telemetry, &mut store, &plain_selection(1), &pool);
    let second = commit(
        &catalog,
        &telemetry,
        &mut store,
        &plain_selection(1),
        &GlobalDrinkPool::new(),
    );

    let siblings = store.list_by_restaurant("rest-1");
    let payer_id = siblings[0].id.clone();
    let payer_total = siblings[0].line_total;

    // Add a supplement to the second item and save the edit
    let reconciler = EditReconciler::new(&catalog, &telemetry);
    let mut restored = reconciler.restore(&second[0], &siblings);
    restored.selection.toggle_supplement("bacon");
    reconciler
        .apply(&restored.item_id, &restored.selection, &restored.pool, &mut store)
        .unwrap();

    let edited = store.get(&second[0].id).unwrap();
    assert_eq!(edited.line_total, 7.0 + 1.2);
    assert!(pricing::money_eq(
        store.get(&payer_id).unwrap().line_total,
        payer_total
    ));
}

// ------------------------------------------------------------------------
// The worked payer example: removing a paid drink from any sibling's edit
// session moves the payer's total down by exactly the drink cost
// ------------------------------------------------------------------------
#[test]
fn test_paid_drink_removal_adjusts_payer_by_delta() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let mut store = MemoryCartStore::new();

    let mut pool = GlobalDrinkPool::new();
    pool.set_paid("cola", 2);
    let items = commit(&catalog, &telemetry, &mut store, &plain_selection(1), &pool);
    let second = commit(
        &catalog,
        &telemetry,
        &mut store,
        &plain_selection(1),
        &GlobalDrinkPool::new(),
    );
    assert_eq!(store.get(&items[0].id).unwrap().line_total, 10.0); // 7 + 3

    let siblings = store.list_by_restaurant("rest-1");
    let reconciler = EditReconciler::new(&catalog, &telemetry);
    let mut restored = reconciler.restore(&second[0], &siblings);
    restored.pool.set_paid("cola", 1);
    reconciler
        .apply(&restored.item_id, &restored.selection, &restored.pool, &mut store)
        .unwrap();

    let payer = store.get(&items[0].id).unwrap();
    assert_eq!(payer.line_total, 8.5);
    assert_eq!(payer.customizations.paid_drink_quantities.get("cola"), Some(&1));
    assert!(telemetry.events().iter().any(|e| matches!(
        e,
        ReconcileEvent::PriceDeltaApplied { item_id, delta }
            if *item_id == items[0].id && pricing::money_eq(*delta, -1.5)
    )));
}

// ------------------------------------------------------------------------
// Editing the payer itself to drop the paid drinks: its total falls by the
// drink cost, siblings stay put, and no sibling keeps a paid quantity
// ------------------------------------------------------------------------
#[test]
fn test_editing_payer_drops_paid_cost_everywhere() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let mut store = MemoryCartStore::new();

    let mut pool = GlobalDrinkPool::new();
    pool.set_paid("cola", 2);
    let items = commit(&catalog, &telemetry, &mut store, &pack_selection(3), &pool);
    let totals: Vec<f64> = items.iter().map(|i| i.line_total).collect();
    assert_eq!(totals, vec![15.0, 12.0, 12.0]);

    let siblings = store.list_by_restaurant("rest-1");
    let reconciler = EditReconciler::new(&catalog, &telemetry);
    let mut restored = reconciler.restore(&items[0], &siblings);
    restored.pool.remove("cola");
    reconciler
        .apply(&restored.item_id, &restored.selection, &restored.pool, &mut store)
        .unwrap();

    let after = store.list_by_restaurant("rest-1");
    let totals: Vec<f64> = after.iter().map(|i| i.line_total).collect();
    assert_eq!(totals, vec![12.0, 12.0, 12.0]);
    assert!(after.iter().all(|i| !i.has_paid_drinks()));
}

// ------------------------------------------------------------------------
// Legacy payload: pack supplements leaked into the global list are folded
// back into their slots and not double counted
// ------------------------------------------------------------------------
#[test]
fn test_legacy_leaked_pack_supplements_recovered() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let mut store = MemoryCartStore::new();
    let items = commit(
        &catalog,
        &telemetry,
        &mut store,
        &pack_selection(1),
        &GlobalDrinkPool::new(),
    );

    // Simulate an old writer that stored the namespaced name globally
    let mut legacy = store.get(&items[0].id).unwrap().clone();
    legacy.customizations = Customizations::migrate(json!({
        "menu_item_id": "menu-dia",
        "restaurant_id": "rest-1",
        "variant": "v-menu",
        "size": "menú",
        "main_item_quantity": 1,
        "supplements": ["0:extra queso"],
        "pack_selections": {"0": "sopa", "1": "pollo"},
        "is_special_pack": true
    }));
    let legacy_id = legacy.id.clone();
    store.update_line_item(&legacy_id, legacy);

    let siblings = store.list_by_restaurant("rest-1");
    let reconciler = EditReconciler::new(&catalog, &telemetry);
    let restored = reconciler.restore(store.get(&legacy_id).unwrap(), &siblings);

    // Folded into the slot, absent from the global list
    assert_eq!(
        restored.selection.pack_supplements.get(&0),
        Some(&vec!["extra queso".to_string()])
    );
    assert!(restored.selection.supplements.is_empty());

    // Re-applying prices it once, via the declared pack price list
    reconciler
        .apply(&restored.item_id, &restored.selection, &restored.pool, &mut store)
        .unwrap();
    let reconciled = store.get(&legacy_id).unwrap();
    assert_eq!(reconciled.line_total, 13.5);
    assert_eq!(
        reconciled.customizations.pack_supplement_prices.get("0:extra queso"),
        Some(&1.5)
    );
    assert!(reconciled.customizations.supplements.is_empty());
}

// ------------------------------------------------------------------------
// Edit session end to end: restore, mutate, finish
// ------------------------------------------------------------------------
#[test]
fn test_edit_session_flow() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let locks = ReconcileLocks::new();
    let mut store = MemoryCartStore::new();
    let items = commit(
        &catalog,
        &telemetry,
        &mut store,
        &plain_selection(2),
        &GlobalDrinkPool::new(),
    );

    let siblings = store.list_by_restaurant("rest-1");
    let reconciler = EditReconciler::new(&catalog, &telemetry);
    let mut session = OrderSession::for_edit(reconciler.restore(&items[0], &siblings));
    assert!(session.is_editing());

    session.selection.set_quantity(3).unwrap();
    session.pool.set_paid("cola", 1);
    let written = session
        .finish(
            &catalog,
            &telemetry,
            ReconcilePolicy::default(),
            &locks,
            &mut store,
        )
        .unwrap();
    assert!(written.is_empty());

    let edited = store.get(&items[0].id).unwrap();
    assert_eq!(edited.quantity, 3);
    // 7 × 3 + 1.5: still the payer, same id
    assert_eq!(edited.line_total, 22.5);
}

// ------------------------------------------------------------------------
// Deleting the payer migrates the paid cost to the next sibling
// ------------------------------------------------------------------------
#[test]
fn test_payer_removal_migrates_paid_cost() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let mut store = MemoryCartStore::new();

    let mut pool = GlobalDrinkPool::new();
    pool.set_paid("cola", 2);
    let first = commit(&catalog, &telemetry, &mut store, &plain_selection(1), &pool);
    let second = commit(
        &catalog,
        &telemetry,
        &mut store,
        &plain_selection(1),
        &GlobalDrinkPool::new(),
    );

    let removed = store.get(&first[0].id).unwrap().clone();
    assert!(store.remove_line_item(&first[0].id));
    reconcile_after_removal(
        &catalog,
        &telemetry,
        ReconcilePolicy::PreserveBaseline,
        "rest-1",
        &removed,
        &mut store,
    )
    .unwrap();

    let new_payer = store.get(&second[0].id).unwrap();
    assert_eq!(new_payer.customizations.paid_drink_quantities.get("cola"), Some(&2));
    assert_eq!(new_payer.line_total, 10.0);
}

// ------------------------------------------------------------------------
// Applying the same restored edit twice converges (idempotence)
// ------------------------------------------------------------------------
#[test]
fn test_double_apply_converges() {
    let catalog = test_catalog();
    let telemetry = Telemetry::new();
    let mut store = MemoryCartStore::new();

    let mut pool = GlobalDrinkPool::new();
    pool.set_paid("cola", 1);
    pool.set_free("agua", 1);
    let items = commit(&catalog, &telemetry, &mut store, &plain_selection(2), &pool);

    let reconciler = EditReconciler::new(&catalog, &telemetry);
    for _ in 0..2 {
        let siblings = store.list_by_restaurant("rest-1");
        let restored = reconciler.restore(store.get(&items[0].id).unwrap(), &siblings);
        reconciler
            .apply(&restored.item_id, &restored.selection, &restored.pool, &mut store)
            .unwrap();
    }

    let settled = store.get(&items[0].id).unwrap();
    // 7 × 2 + 1.5, unchanged by repeated reconciliation
    assert_eq!(settled.line_total, 15.5);
    assert_eq!(settled.customizations.free_drink_quantities.get("agua"), Some(&2));
}
