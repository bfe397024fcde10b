//! Selection model
//!
//! In-memory state of the user's current choices for one order instance.
//! Pure data plus a total mutation API: every mutator succeeds except
//! `set_quantity`, which rejects quantities below 1. Nothing is persisted
//! until the order builder commits, so discarding a selection has no side
//! effects.

mod saved;

pub use saved::{SavedOrder, SavedOrdersQueue};

use crate::catalog::{self, CatalogAdapter};
use crate::error::{EngineError, EngineResult};
use shared::models::{IngredientPreference, PricingOption};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub menu_item_id: String,
    pub restaurant_id: String,
    pub variant_id: Option<String>,
    /// Chosen size/portion; may stay empty for offer items
    pub pricing: Option<PricingOption>,
    pub quantity: i32,
    /// Global supplements, in the order the user picked them
    pub supplements: Vec<String>,
    pub removed_ingredients: BTreeSet<String>,
    pub ingredient_preferences: BTreeMap<String, IngredientPreference>,
    pub note: String,
    // Pack-scoped state, keyed by slot index. Distinct from the global
    // supplements above: these are priced once per pack, not per unit.
    pub pack_selections: BTreeMap<u32, String>,
    pub pack_ingredient_preferences: BTreeMap<u32, BTreeMap<String, IngredientPreference>>,
    pub pack_supplements: BTreeMap<u32, Vec<String>>,
}

impl SelectionState {
    pub fn new(menu_item_id: impl Into<String>, restaurant_id: impl Into<String>) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            restaurant_id: restaurant_id.into(),
            variant_id: None,
            pricing: None,
            quantity: 1,
            supplements: Vec::new(),
            removed_ingredients: BTreeSet::new(),
            ingredient_preferences: BTreeMap::new(),
            note: String::new(),
            pack_selections: BTreeMap::new(),
            pack_ingredient_preferences: BTreeMap::new(),
            pack_supplements: BTreeMap::new(),
        }
    }

    pub fn set_variant(&mut self, variant_id: impl Into<String>) {
        let variant_id = variant_id.into();
        if self.variant_id.as_deref() != Some(&variant_id) {
            // Pack state belongs to the variant that defined the slots
            self.pack_selections.clear();
            self.pack_ingredient_preferences.clear();
            self.pack_supplements.clear();
        }
        self.variant_id = Some(variant_id);
    }

    pub fn set_pricing(&mut self, pricing: PricingOption) {
        self.pricing = Some(pricing);
    }

    pub fn clear_pricing(&mut self) {
        self.pricing = None;
    }

    pub fn set_quantity(&mut self, quantity: i32) -> EngineResult<()> {
        if quantity < 1 {
            return Err(EngineError::InvalidQuantity(quantity));
        }
        self.quantity = quantity;
        Ok(())
    }

    pub fn toggle_supplement(&mut self, name: &str) {
        if let Some(pos) = self.supplements.iter().position(|s| s == name) {
            self.supplements.remove(pos);
        } else {
            self.supplements.push(name.to_string());
        }
    }

    /// Set the preference for one ingredient. `None` also marks the
    /// ingredient as removed; `Neutral` clears any stored preference.
    pub fn set_ingredient_preference(&mut self, ingredient: &str, pref: IngredientPreference) {
        match pref {
            IngredientPreference::Neutral => {
                self.ingredient_preferences.remove(ingredient);
                self.removed_ingredients.remove(ingredient);
            }
            IngredientPreference::None => {
                self.ingredient_preferences
                    .insert(ingredient.to_string(), pref);
                self.removed_ingredients.insert(ingredient.to_string());
            }
            _ => {
                self.ingredient_preferences
                    .insert(ingredient.to_string(), pref);
                self.removed_ingredients.remove(ingredient);
            }
        }
    }

    /// Select the option for a pack slot; an empty value clears the slot.
    pub fn set_pack_slot_option(&mut self, slot: u32, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.pack_selections.remove(&slot);
        } else {
            self.pack_selections.insert(slot, value);
        }
    }

    pub fn set_pack_ingredient_preference(
        &mut self,
        slot: u32,
        ingredient: &str,
        pref: IngredientPreference,
    ) {
        let slot_prefs = self.pack_ingredient_preferences.entry(slot).or_default();
        if pref == IngredientPreference::Neutral {
            slot_prefs.remove(ingredient);
            if slot_prefs.is_empty() {
                self.pack_ingredient_preferences.remove(&slot);
            }
        } else {
            slot_prefs.insert(ingredient.to_string(), pref);
        }
    }

    pub fn toggle_pack_supplement(&mut self, slot: u32, name: &str) {
        let slot_supps = self.pack_supplements.entry(slot).or_default();
        if let Some(pos) = slot_supps.iter().position(|s| s == name) {
            slot_supps.remove(pos);
            if slot_supps.is_empty() {
                self.pack_supplements.remove(&slot);
            }
        } else {
            slot_supps.push(name.to_string());
        }
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    /// Whether the selection can be committed.
    ///
    /// A variant must be chosen; non-offer variants need a size; a pack
    /// needs a non-empty selection for every slot the catalog declares.
    pub fn is_complete(&self, catalog: &dyn CatalogAdapter) -> bool {
        let Some(variant_id) = &self.variant_id else {
            return false;
        };
        let Some(variant) = catalog::find_variant(catalog, &self.menu_item_id, variant_id) else {
            // Variant vanished from the catalog (stale edit): pricing is
            // recovered via a placeholder at commit, so only the selection
            // itself gates completeness here
            return true;
        };
        if !variant.is_offer && self.pricing.is_none() {
            return false;
        }
        if variant.is_pack {
            return variant.pack_slots.iter().all(|slot| {
                self.pack_selections
                    .get(&slot.index)
                    .is_some_and(|v| !v.is_empty())
            });
        }
        true
    }
}
