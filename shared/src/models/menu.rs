//! Menu item catalog entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Preference for a single ingredient
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngredientPreference {
    Wanted,
    Less,
    None,
    #[default]
    Neutral,
}

/// Ingredient of a menu item or a pack slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    /// Whether the user may remove this ingredient
    #[serde(default = "default_true")]
    pub removable: bool,
}

fn default_true() -> bool {
    true
}

/// One sub-item slot of a composite pack
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackSlot {
    pub index: u32,
    pub name: String,
    /// Options the user picks one of; a pack is incomplete until every slot
    /// has a selection
    pub options: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

/// Menu item variant
///
/// A plain variant is sold as-is; a pack variant is a composite of several
/// sub-item slots. The free-form `description` may carry pack-supplement
/// markup (`"extra cheese +1.50"` segments) parsed by the catalog adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Base price used when no pricing option is chosen (offer items only)
    #[serde(default)]
    pub base_price: f64,
    #[serde(default)]
    pub is_pack: bool,
    /// Offer items may be ordered without choosing a size
    #[serde(default)]
    pub is_offer: bool,
    #[serde(default)]
    pub pack_slots: Vec<PackSlot>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

/// Size/portion pricing option of a menu item
///
/// Immutable catalog data: the engine reads prices and drink entitlements
/// from here and never writes back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingOption {
    pub id: String,
    /// Size label ("media", "entera", ...)
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion: Option<String>,
    pub base_price: f64,
    /// Added to the base price for plain menu items only
    #[serde(default)]
    pub size_surcharge: f64,
    /// Drink ids eligible as free drinks, in catalog display order
    #[serde(default)]
    pub free_drink_ids: Vec<String>,
    /// Free drinks granted per consumed unit (0 = no entitlement)
    #[serde(default)]
    pub free_drinks_per_unit: i32,
    /// Global supplements available at this size, name → price
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub global_supplements: BTreeMap<String, f64>,
}
