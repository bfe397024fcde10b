//! Catalog data model
//!
//! Read-only entities sourced from the menu catalog. The engine consumes
//! these through the catalog adapter and never mutates them.

mod drink;
mod menu;

pub use drink::Drink;
pub use menu::{Ingredient, IngredientPreference, PackSlot, PricingOption, Variant};
