//! Stock and product lookups.
//!
//! # Architecture
//!
//! - The stock API is the source of truth for availability - stock records are
//!   fetched fresh for every quantity check
//! - Product metadata is cached in memory via `moka` (5 minute TTL)
//! - [`StockService`] is the seam the cart depends on; [`HttpStockClient`]
//!   is the REST implementation
//!
//! # Endpoints
//!
//! - `GET {base}/stock/{id}` - `{ "id": 1, "amount": 3 }`
//! - `GET {base}/products/{id}` - `{ "id": 1, "title": "...", "price": 139.9, "image": "..." }`

mod client;

pub use client::HttpStockClient;

use async_trait::async_trait;
use storefront_cart_core::ProductId;
use thiserror::Error;

use crate::model::{Product, StockRecord};

/// Errors that can occur when talking to the stock API.
#[derive(Debug, Error)]
pub enum StockError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API has no record for this product.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Read-only lookups the cart needs from the stock API.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Current available quantity for a product.
    async fn stock(&self, product_id: ProductId) -> Result<StockRecord, StockError>;

    /// Product metadata used to create a new line item.
    async fn product(&self, product_id: ProductId) -> Result<Product, StockError>;
}
