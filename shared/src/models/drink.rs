//! Drink Model

use serde::{Deserialize, Serialize};

/// A drink from the restaurant's drink catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Drink {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: String,
    pub price: f64,
}

impl Drink {
    /// Zero-price placeholder for a drink id missing from the catalog.
    ///
    /// A stale id in a stored payload must not abort a commit or a
    /// reconciliation pass; it simply contributes nothing to the total.
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            size: String::new(),
            price: 0.0,
        }
    }
}
