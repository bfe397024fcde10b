use thiserror::Error;

/// Engine errors
///
/// Only conditions the caller must act on live here. Unknown catalog
/// references and malformed stored payloads are recovered inline (zero-price
/// placeholder, empty field) and logged, never raised.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The selection cannot be committed yet; the caller re-prompts the user
    #[error("Selection is incomplete: {0}")]
    IncompleteSelection(String),

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    #[error("Line item not found: {0}")]
    LineItemNotFound(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
