//! Saved-orders queue
//!
//! "Save and add another": the live selection is snapshotted here and the
//! form resets for the next one. Snapshots are immutable; once at least one
//! order is staged, only staged orders are materialized at commit and the
//! live form is just a draft.

use super::SelectionState;
use shared::util;

/// Immutable staged snapshot of a selection
#[derive(Debug, Clone, PartialEq)]
pub struct SavedOrder {
    pub selection: SelectionState,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SavedOrdersQueue {
    orders: Vec<SavedOrder>,
}

impl SavedOrdersQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a selection. The clone is deep (owned maps and sets), so
    /// later mutation of the live selection cannot reach into the snapshot.
    pub fn save(&mut self, selection: &SelectionState) -> &SavedOrder {
        self.orders.push(SavedOrder {
            selection: selection.clone(),
            created_at: util::now_millis(),
        });
        self.orders.last().expect("just pushed")
    }

    /// Remove the index-th saved order of one variant. Out of range is a
    /// no-op reporting false.
    pub fn remove(&mut self, variant_id: &str, index: usize) -> bool {
        let position = self
            .orders
            .iter()
            .enumerate()
            .filter(|(_, o)| o.selection.variant_id.as_deref() == Some(variant_id))
            .map(|(i, _)| i)
            .nth(index);
        match position {
            Some(i) => {
                self.orders.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn list(&self, variant_id: &str) -> Vec<&SavedOrder> {
        self.orders
            .iter()
            .filter(|o| o.selection.variant_id.as_deref() == Some(variant_id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedOrder> {
        self.orders.iter()
    }

    pub fn has_any(&self) -> bool {
        !self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
