//! Order Customization and Cart Price Reconciliation Engine
//!
//! Turns menu-item selections (variants, sizes, supplements, ingredient
//! preferences, drinks, composite packs) into cart line items, and keeps
//! the prices of a restaurant order consistent across later edits.
//!
//! # Architecture
//!
//! ```text
//! Selection → OrderBuilder → CartLineItem(s) → CartStore
//!     ↑                            ↓
//! EditReconciler::restore ←── stored payload
//!     ↓
//! EditReconciler::apply ──→ sibling reprice (payer rule)
//! ```
//!
//! # Data Flow
//!
//! 1. An [`session::OrderSession`] collects the user's choices
//! 2. [`builder::OrderBuilder`] validates and materializes line items
//!    (packs decompose into one item per unit)
//! 3. The paid-drink pool lands on exactly one payer item per restaurant
//! 4. Editing restores the original selection from the stored payload
//! 5. [`reconcile::EditReconciler`] writes the edit back and moves the
//!    paid-drink cost wherever the payer rule now puts it

pub mod builder;
pub mod catalog;
pub mod drinks;
pub mod error;
pub mod logger;
pub mod pricing;
pub mod reconcile;
pub mod selection;
pub mod session;
pub mod store;
pub mod telemetry;

// Re-exports
pub use builder::OrderBuilder;
pub use catalog::{CatalogAdapter, StaticCatalog};
pub use drinks::{DrinkClass, GlobalDrinkPool};
pub use error::{EngineError, EngineResult};
pub use reconcile::{reconcile_after_removal, EditReconciler, ReconcilePolicy, RestoredEdit};
pub use selection::{SavedOrder, SavedOrdersQueue, SelectionState};
pub use session::{OrderSession, ReconcileLocks, UpdateGate};
pub use store::{CartStore, MemoryCartStore};
pub use telemetry::{ReconcileEvent, Telemetry};

#[cfg(test)]
mod tests;
