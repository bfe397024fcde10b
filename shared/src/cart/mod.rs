//! Cart line items and the persisted customizations payload

mod line_item;
mod payload;
pub mod serde_helpers;

pub use line_item::CartLineItem;
pub use payload::{Customizations, DrinkLine};
