//! Catalog adapter
//!
//! Read-only access to menu data. The engine consumes variants, pricing
//! options and the restaurant drink catalog through this trait and never
//! writes back; availability/price pushes from the realtime channel land on
//! the adapter's backing data out of band (see `session::UpdateGate`).

use shared::models::{Drink, PricingOption, Variant};
use std::collections::{BTreeMap, HashMap};

pub trait CatalogAdapter {
    fn variants(&self, menu_item_id: &str) -> Vec<Variant>;

    fn pricing_options(&self, menu_item_id: &str) -> Vec<PricingOption>;

    fn restaurant_drinks(&self, restaurant_id: &str) -> Vec<Drink>;

    /// Supplements available at a given size, name → price.
    fn global_supplements(&self, pricing: &PricingOption) -> BTreeMap<String, f64> {
        pricing.global_supplements.clone()
    }

    /// Pack-scoped supplements declared in a pack variant's description.
    fn parse_pack_supplements(&self, variant_description: &str) -> BTreeMap<String, f64> {
        parse_pack_supplements(variant_description)
    }
}

/// Parse pack-supplement markup out of a variant description.
///
/// Segments are split on `,` / `;` / newline; a segment whose tail is
/// `+<decimal>` declares a supplement, e.g. `"extra cheese +1.50"`.
/// Anything else is prose and is ignored.
pub fn parse_pack_supplements(description: &str) -> BTreeMap<String, f64> {
    let mut supplements = BTreeMap::new();
    for segment in description.split([',', ';', '\n']) {
        let segment = segment.trim();
        let Some((name, price)) = segment.rsplit_once('+') else {
            continue;
        };
        let name = name.trim().trim_end_matches(':').trim();
        let Ok(price) = price.trim().trim_end_matches('€').trim().parse::<f64>() else {
            continue;
        };
        if name.is_empty() || !price.is_finite() || price < 0.0 {
            continue;
        }
        supplements.insert(name.to_string(), price);
    }
    supplements
}

/// Find a variant by id across a menu item's variants.
pub fn find_variant(
    catalog: &dyn CatalogAdapter,
    menu_item_id: &str,
    variant_id: &str,
) -> Option<Variant> {
    catalog
        .variants(menu_item_id)
        .into_iter()
        .find(|v| v.id == variant_id)
}

/// Find a pricing option by its size label.
pub fn find_pricing_by_label(
    catalog: &dyn CatalogAdapter,
    menu_item_id: &str,
    label: &str,
) -> Option<PricingOption> {
    catalog
        .pricing_options(menu_item_id)
        .into_iter()
        .find(|p| p.label == label)
}

/// In-memory catalog, used by tests and by embeddings that preload menu data.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    variants: HashMap<String, Vec<Variant>>,
    pricing: HashMap<String, Vec<PricingOption>>,
    drinks: HashMap<String, Vec<Drink>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variant(&mut self, menu_item_id: &str, variant: Variant) -> &mut Self {
        self.variants
            .entry(menu_item_id.to_string())
            .or_default()
            .push(variant);
        self
    }

    pub fn add_pricing(&mut self, menu_item_id: &str, pricing: PricingOption) -> &mut Self {
        self.pricing
            .entry(menu_item_id.to_string())
            .or_default()
            .push(pricing);
        self
    }

    pub fn add_drink(&mut self, restaurant_id: &str, drink: Drink) -> &mut Self {
        self.drinks
            .entry(restaurant_id.to_string())
            .or_default()
            .push(drink);
        self
    }
}

impl CatalogAdapter for StaticCatalog {
    fn variants(&self, menu_item_id: &str) -> Vec<Variant> {
        self.variants.get(menu_item_id).cloned().unwrap_or_default()
    }

    fn pricing_options(&self, menu_item_id: &str) -> Vec<PricingOption> {
        self.pricing.get(menu_item_id).cloned().unwrap_or_default()
    }

    fn restaurant_drinks(&self, restaurant_id: &str) -> Vec<Drink> {
        self.drinks.get(restaurant_id).cloned().unwrap_or_default()
    }
}
