//! Ordering session
//!
//! One session covers one customization popup: a live selection, the
//! saved-orders queue and the shared drink pools. Commit and reconcile run
//! under a per-restaurant lock so concurrent edits of the same order can
//! never interleave their sibling rewrites.

use crate::builder::OrderBuilder;
use crate::catalog::CatalogAdapter;
use crate::drinks::GlobalDrinkPool;
use crate::error::EngineResult;
use crate::reconcile::{EditReconciler, ReconcilePolicy, RestoredEdit};
use crate::selection::{SavedOrdersQueue, SelectionState};
use crate::store::CartStore;
use crate::telemetry::Telemetry;
use dashmap::DashMap;
use shared::{util, CartLineItem};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

pub struct OrderSession {
    pub id: String,
    pub selection: SelectionState,
    pub queue: SavedOrdersQueue,
    pub pool: GlobalDrinkPool,
    /// Id of the stored line item being edited, if any
    editing: Option<String>,
}

impl OrderSession {
    pub fn new(menu_item_id: impl Into<String>, restaurant_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            selection: SelectionState::new(menu_item_id, restaurant_id),
            queue: SavedOrdersQueue::new(),
            pool: GlobalDrinkPool::new(),
            editing: None,
        }
    }

    /// Open a session for an existing line item from its restored state.
    pub fn for_edit(restored: RestoredEdit) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            selection: restored.selection,
            queue: SavedOrdersQueue::new(),
            pool: restored.pool,
            editing: Some(restored.item_id),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Stage the live selection and reset the form for the next order.
    /// The drink pools are session-scoped and survive the reset.
    pub fn save_and_reset(&mut self) {
        self.queue.save(&self.selection);
        self.selection = SelectionState::new(
            self.selection.menu_item_id.clone(),
            self.selection.restaurant_id.clone(),
        );
    }

    /// Commit a create session, or write back an edit session.
    pub fn finish(
        &self,
        catalog: &dyn CatalogAdapter,
        telemetry: &Telemetry,
        policy: ReconcilePolicy,
        locks: &ReconcileLocks,
        store: &mut dyn CartStore,
    ) -> EngineResult<Vec<CartLineItem>> {
        let lock = locks.for_restaurant(&self.selection.restaurant_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match &self.editing {
            Some(item_id) => {
                let reconciler = EditReconciler::with_policy(catalog, telemetry, policy);
                reconciler.apply(item_id, &self.selection, &self.pool, store)?;
                Ok(Vec::new())
            }
            None => OrderBuilder::new(catalog, telemetry).commit(
                &self.selection,
                &self.queue,
                &self.pool,
                store,
                &self.id,
            ),
        }
    }
}

/// Per-restaurant mutexes serializing commit and reconcile passes.
#[derive(Default)]
pub struct ReconcileLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ReconcileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_restaurant(&self, restaurant_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(restaurant_id.to_string())
            .or_default()
            .clone()
    }
}

/// Coalescing gate for out-of-band catalog pushes.
///
/// Price and availability updates arrive on the realtime channel faster
/// than the UI can re-render; updates inside the window are dropped, and
/// everything is dropped while a commit or reconcile pass is in flight
/// (the pass reads the catalog at its start and must not see it move).
pub struct UpdateGate {
    window_ms: i64,
    last_admitted: AtomicI64,
    busy: AtomicBool,
}

impl Default for UpdateGate {
    fn default() -> Self {
        Self::new(300)
    }
}

impl UpdateGate {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            last_admitted: AtomicI64::new(0),
            busy: AtomicBool::new(false),
        }
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Whether a catalog update may be applied now. Admitting starts a new
    /// window.
    pub fn admit(&self) -> bool {
        if self.busy.load(Ordering::SeqCst) {
            return false;
        }
        let now = util::now_millis();
        let last = self.last_admitted.load(Ordering::SeqCst);
        if now - last < self.window_ms {
            return false;
        }
        self.last_admitted
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::store::MemoryCartStore;
    use shared::models::{PricingOption, Variant};
    use std::collections::BTreeMap;

    fn catalog() -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        catalog.add_variant(
            "item-1",
            Variant {
                id: "v-plain".into(),
                name: "Bocadillo".into(),
                description: String::new(),
                base_price: 0.0,
                is_pack: false,
                is_offer: false,
                pack_slots: vec![],
                ingredients: vec![],
            },
        );
        catalog
    }

    fn pricing() -> PricingOption {
        PricingOption {
            id: "p-1".into(),
            label: "entera".into(),
            portion: None,
            base_price: 10.0,
            size_surcharge: 0.0,
            free_drink_ids: vec![],
            free_drinks_per_unit: 0,
            global_supplements: BTreeMap::new(),
        }
    }

    #[test]
    fn test_save_and_reset_keeps_scope_and_pool() {
        let mut session = OrderSession::new("item-1", "rest-1");
        session.selection.set_variant("v-plain");
        session.selection.set_pricing(pricing());
        session.pool.set_free("cola", 1);
        session.save_and_reset();

        assert_eq!(session.queue.len(), 1);
        assert!(session.selection.variant_id.is_none());
        assert_eq!(session.selection.menu_item_id, "item-1");
        assert_eq!(session.pool.free_quantities().get("cola"), Some(&1));
    }

    #[test]
    fn test_finish_commits_create_session() {
        let catalog = catalog();
        let telemetry = Telemetry::new();
        let locks = ReconcileLocks::new();
        let mut store = MemoryCartStore::new();

        let mut session = OrderSession::new("item-1", "rest-1");
        session.selection.set_variant("v-plain");
        session.selection.set_pricing(pricing());

        let items = session
            .finish(
                &catalog,
                &telemetry,
                ReconcilePolicy::default(),
                &locks,
                &mut store,
            )
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].customizations.popup_session_id, session.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_locks_are_shared_per_restaurant() {
        let locks = ReconcileLocks::new();
        let a = locks.for_restaurant("rest-1");
        let b = locks.for_restaurant("rest-1");
        let c = locks.for_restaurant("rest-2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_update_gate_coalesces_and_blocks_while_busy() {
        let gate = UpdateGate::new(60_000);
        assert!(gate.admit());
        assert!(!gate.admit()); // inside the window

        let busy_gate = UpdateGate::new(0);
        busy_gate.set_busy(true);
        assert!(!busy_gate.admit());
        busy_gate.set_busy(false);
        assert!(busy_gate.admit());
    }
}
