//! Cart operation errors.
//!
//! Cart operations never return these to callers. Each operation maps its
//! error to a single user-facing warning via [`CartError::user_message`].

use storefront_cart_core::ProductId;
use thiserror::Error;

use crate::stock::StockError;
use crate::storage::StorageError;

/// Warning shown when a requested quantity is not available.
pub const STOCK_EXCEEDED_MESSAGE: &str = "Requested quantity exceeds available stock";
/// Generic warning for a failed add.
pub const ADD_FAILED_MESSAGE: &str = "Failed to add product";
/// Generic warning for a failed remove.
pub const REMOVE_FAILED_MESSAGE: &str = "Failed to remove product";
/// Generic warning for a failed quantity update.
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update product quantity";

/// Which cart operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    Update,
}

impl CartOperation {
    /// Generic warning for this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => ADD_FAILED_MESSAGE,
            Self::Remove => REMOVE_FAILED_MESSAGE,
            Self::Update => UPDATE_FAILED_MESSAGE,
        }
    }
}

/// Why a cart operation was not applied.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity is more than the stock allows.
    #[error("Stock exceeded for product {product_id}: requested {requested}, available {available}")]
    StockExceeded {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotFound(ProductId),

    /// Stock API lookup failed.
    #[error("Stock service error: {0}")]
    Stock(#[from] StockError),

    /// Snapshot could not be persisted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// The warning to show the user when `operation` failed with this error.
    #[must_use]
    pub const fn user_message(&self, operation: CartOperation) -> &'static str {
        match self {
            Self::StockExceeded { .. } => STOCK_EXCEEDED_MESSAGE,
            Self::NotFound(_) | Self::Stock(_) | Self::Storage(_) => operation.failure_message(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
