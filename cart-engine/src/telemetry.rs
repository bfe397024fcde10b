//! Commit/reconciliation decision trace
//!
//! Every pricing-relevant decision (drink classification, payer selection,
//! delta application, placeholder substitution) is emitted both as a
//! `tracing` event and as a typed record, so tests assert on recorded
//! traces instead of scraping log output.

use std::sync::Mutex;

/// One recorded engine decision
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileEvent {
    /// A drink id was classified against the global pools
    DrinkClassified { drink_id: String, paid: bool },
    /// A line item was chosen to carry the paid-drink cost
    PayerSelected { item_id: String },
    /// A paid-drink delta was applied to a sibling's stored total
    PriceDeltaApplied { item_id: String, delta: f64 },
    /// An unknown drink id was replaced by a zero-price placeholder
    PlaceholderDrink { drink_id: String },
    /// A commit batch was materialized
    LineItemsCommitted { session_id: String, count: usize },
}

/// Decision recorder shared across one engine instance
#[derive(Debug, Default)]
pub struct Telemetry {
    events: Mutex<Vec<ReconcileEvent>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ReconcileEvent) {
        match &event {
            ReconcileEvent::DrinkClassified { drink_id, paid } => {
                tracing::debug!(drink_id = %drink_id, paid = paid, "Drink classified");
            }
            ReconcileEvent::PayerSelected { item_id } => {
                tracing::debug!(item_id = %item_id, "Payer selected");
            }
            ReconcileEvent::PriceDeltaApplied { item_id, delta } => {
                tracing::info!(item_id = %item_id, delta = delta, "Paid-drink delta applied");
            }
            ReconcileEvent::PlaceholderDrink { drink_id } => {
                tracing::warn!(drink_id = %drink_id, "Unknown drink id, using zero-price placeholder");
            }
            ReconcileEvent::LineItemsCommitted { session_id, count } => {
                tracing::info!(session_id = %session_id, count = count, "Line items committed");
            }
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Snapshot of all recorded events, in emission order.
    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}
