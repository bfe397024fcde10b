//! Shared types for the cart engine
//!
//! Catalog entities, cart line items, the persisted customizations payload
//! and id/time utilities used by the engine and by embedding applications.

pub mod cart;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use cart::{CartLineItem, Customizations, DrinkLine};
pub use models::{
    Drink, Ingredient, IngredientPreference, PackSlot, PricingOption, Variant,
};
