//! Cart store interface
//!
//! Persistence lives with the embedding application; the engine only needs
//! these four operations. `MemoryCartStore` backs tests and previews.

use shared::CartLineItem;

pub trait CartStore {
    fn add_line_item(&mut self, item: CartLineItem);

    /// Replace a stored item. Returns false when the id is unknown.
    fn update_line_item(&mut self, id: &str, item: CartLineItem) -> bool;

    /// All line items of one restaurant, in creation order.
    fn list_by_restaurant(&self, restaurant_id: &str) -> Vec<CartLineItem>;

    fn remove_line_item(&mut self, id: &str) -> bool;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    items: Vec<CartLineItem>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CartStore for MemoryCartStore {
    fn add_line_item(&mut self, item: CartLineItem) {
        self.items.push(item);
    }

    fn update_line_item(&mut self, id: &str, item: CartLineItem) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    fn list_by_restaurant(&self, restaurant_id: &str) -> Vec<CartLineItem> {
        let mut items: Vec<CartLineItem> = self
            .items
            .iter()
            .filter(|i| i.restaurant_id() == restaurant_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.creation_order());
        items
    }

    fn remove_line_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Customizations;

    fn item_for(restaurant_id: &str) -> CartLineItem {
        let mut customizations = Customizations::default();
        customizations.restaurant_id = restaurant_id.to_string();
        CartLineItem::new("Test", 10.0, 10.0, 1, customizations)
    }

    #[test]
    fn test_list_by_restaurant_filters_and_orders() {
        let mut store = MemoryCartStore::new();
        let a = item_for("rest-1");
        let b = item_for("rest-2");
        let c = item_for("rest-1");
        store.add_line_item(c.clone()); // inserted out of creation order
        store.add_line_item(a.clone());
        store.add_line_item(b);

        let listed = store.list_by_restaurant("rest-1");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[1].id, c.id);
    }

    #[test]
    fn test_update_unknown_id_returns_false() {
        let mut store = MemoryCartStore::new();
        let item = item_for("rest-1");
        assert!(!store.update_line_item("missing", item));
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryCartStore::new();
        let item = item_for("rest-1");
        let id = item.id.clone();
        store.add_line_item(item);
        assert!(store.remove_line_item(&id));
        assert!(!store.remove_line_item(&id));
        assert!(store.is_empty());
    }
}
