//! Customizations payload - persisted on every cart line item
//!
//! JSON-compatible. Absent optional keys are treated as empty, never as
//! errors; legacy shapes are normalized once here at the boundary (see
//! [`serde_helpers`]) so business logic only ever sees the typed form.

use super::serde_helpers;
use crate::models::IngredientPreference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One drink row in the payload's display list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrinkLine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: String,
    pub price: f64,
    #[serde(default)]
    pub is_free: bool,
}

/// Structured customizations stored on a cart line item
///
/// Pack-scoped supplement prices are keyed by the `"<slot>:<name>"`
/// convention so they can never collide with (or be double counted as)
/// global supplement names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Customizations {
    #[serde(default)]
    pub menu_item_id: String,
    #[serde(default)]
    pub restaurant_id: String,
    /// Quantity the user originally ordered (packs keep it across
    /// decomposition; each decomposed unit still records it)
    #[serde(default)]
    pub main_item_quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion: Option<String>,
    /// Global supplement names (pack-scoped entries leaked here by legacy
    /// writers carry the slot prefix and are filtered on restore)
    #[serde(default, deserialize_with = "serde_helpers::lenient_string_list")]
    pub supplements: Vec<String>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_string_list")]
    pub removed_ingredients: Vec<String>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_pref_map")]
    pub ingredient_preferences: BTreeMap<String, IngredientPreference>,
    /// Display list, paid drinks first
    #[serde(default)]
    pub drinks: Vec<DrinkLine>,
    /// Merged free+paid quantities, display only
    #[serde(default, deserialize_with = "serde_helpers::lenient_qty_map")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub drink_quantities: BTreeMap<String, i32>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_qty_map")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub free_drink_quantities: BTreeMap<String, i32>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_qty_map")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub paid_drink_quantities: BTreeMap<String, i32>,
    #[serde(default, deserialize_with = "serde_helpers::slot_string_map")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pack_selections: BTreeMap<u32, String>,
    #[serde(default, deserialize_with = "serde_helpers::slot_pref_map")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pack_ingredient_preferences: BTreeMap<u32, BTreeMap<String, IngredientPreference>>,
    #[serde(default, deserialize_with = "serde_helpers::slot_list_map")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pack_supplement_selections: BTreeMap<u32, Vec<String>>,
    /// `"<slot>:<name>" → price`, as declared by the pack's catalog entry at
    /// commit time
    #[serde(default, deserialize_with = "serde_helpers::lenient_price_map")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pack_supplement_prices: BTreeMap<String, f64>,
    #[serde(default)]
    pub is_special_pack: bool,
    /// Groups the line items of one commit; diagnostics only
    #[serde(default)]
    pub popup_session_id: String,
}

impl Customizations {
    /// Namespaced key for a pack-scoped supplement.
    pub fn pack_key(slot: u32, name: &str) -> String {
        format!("{}:{}", slot, name)
    }

    /// Split a namespaced pack-supplement key back into (slot, name).
    pub fn split_pack_key(key: &str) -> Option<(u32, &str)> {
        let (slot, name) = key.split_once(':')?;
        slot.parse().ok().map(|slot| (slot, name))
    }

    /// Whether a supplement name carries the pack-slot namespace.
    pub fn is_pack_scoped(name: &str) -> bool {
        Self::split_pack_key(name).is_some()
    }

    /// Single entry point for loading a stored payload.
    ///
    /// Every field is individually lenient, so this only falls back to the
    /// empty payload when the value is not an object at all.
    pub fn migrate(value: serde_json::Value) -> Self {
        let mut payload: Customizations = match serde_json::from_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable customizations payload, using empty");
                Customizations::default()
            }
        };
        payload.normalize();
        payload
    }

    /// Drop zero/negative drink quantities and rebuild the merged display
    /// map. Paid entries with quantity 0 may exist transiently during a
    /// reconciliation pass but must never be serialized.
    pub fn normalize(&mut self) {
        self.free_drink_quantities.retain(|_, q| *q > 0);
        self.paid_drink_quantities.retain(|_, q| *q > 0);
        self.drink_quantities = self.merged_drink_quantities();
        let quantities = &self.drink_quantities;
        self.drinks.retain(|d| quantities.contains_key(&d.id));
        self.supplements.retain(|s| !s.is_empty());
    }

    /// Free and paid quantities merged for display.
    pub fn merged_drink_quantities(&self) -> BTreeMap<String, i32> {
        let mut merged = self.free_drink_quantities.clone();
        for (id, qty) in &self.paid_drink_quantities {
            if *qty > 0 {
                *merged.entry(id.clone()).or_insert(0) += qty;
            }
        }
        merged.retain(|_, q| *q > 0);
        merged
    }

    /// Global supplements only: stored list minus pack-scoped leakage.
    pub fn global_supplements(&self) -> Vec<String> {
        self.supplements
            .iter()
            .filter(|s| !Self::is_pack_scoped(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_keys_are_empty() {
        let payload = Customizations::migrate(json!({
            "menu_item_id": "item-1",
            "restaurant_id": "rest-1"
        }));
        assert_eq!(payload.menu_item_id, "item-1");
        assert!(payload.supplements.is_empty());
        assert!(payload.paid_drink_quantities.is_empty());
        assert!(!payload.is_special_pack);
    }

    #[test]
    fn test_migrate_coerces_legacy_shapes() {
        let payload = Customizations::migrate(json!({
            "menu_item_id": "item-1",
            "supplements": {"cheese": true, "bacon": false},
            "removed_ingredients": "onion",
            "paid_drink_quantities": {"cola": "2"},
            "pack_selections": ["pizza", "pasta"],
            "pack_supplement_selections": {"1": {"extra cheese": 1}}
        }));
        assert_eq!(payload.supplements, vec!["cheese"]);
        assert_eq!(payload.removed_ingredients, vec!["onion"]);
        assert_eq!(payload.paid_drink_quantities.get("cola"), Some(&2));
        assert_eq!(payload.pack_selections.get(&0).map(String::as_str), Some("pizza"));
        assert_eq!(
            payload.pack_supplement_selections.get(&1),
            Some(&vec!["extra cheese".to_string()])
        );
    }

    #[test]
    fn test_migrate_non_object_degrades_to_empty() {
        let payload = Customizations::migrate(json!("garbage"));
        assert_eq!(payload, Customizations::default());
    }

    #[test]
    fn test_normalize_strips_zero_paid_quantities() {
        let mut payload = Customizations::default();
        payload.paid_drink_quantities.insert("cola".into(), 0);
        payload.free_drink_quantities.insert("agua".into(), 2);
        payload.drinks.push(DrinkLine {
            id: "cola".into(),
            name: "Cola".into(),
            size: String::new(),
            price: 1.5,
            is_free: false,
        });
        payload.normalize();
        assert!(payload.paid_drink_quantities.is_empty());
        assert!(payload.drinks.is_empty());
        assert_eq!(payload.drink_quantities.get("agua"), Some(&2));
    }

    #[test]
    fn test_pack_key_round_trip() {
        let key = Customizations::pack_key(2, "extra cheese");
        assert_eq!(key, "2:extra cheese");
        assert_eq!(Customizations::split_pack_key(&key), Some((2, "extra cheese")));
        assert!(Customizations::is_pack_scoped(&key));
        assert!(!Customizations::is_pack_scoped("cheese"));
    }

    #[test]
    fn test_merged_quantities() {
        let mut payload = Customizations::default();
        payload.free_drink_quantities.insert("cola".into(), 1);
        payload.paid_drink_quantities.insert("cola".into(), 2);
        payload.paid_drink_quantities.insert("fanta".into(), 1);
        let merged = payload.merged_drink_quantities();
        assert_eq!(merged.get("cola"), Some(&3));
        assert_eq!(merged.get("fanta"), Some(&1));
    }
}
