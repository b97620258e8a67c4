//! Cart command helpers.
//!
//! # Environment Variables
//!
//! - `CART_API_URL` - Stock/product API base URL (required)
//! - `CART_STORAGE_DIR` - Where the cart snapshot file lives

use std::sync::Arc;

use storefront_cart::{
    CartConfig, CartStore, ConfigError, FileStore, HttpStockClient, StockError, StorageError,
    StoreOptions, TracingNotifier,
};
use thiserror::Error;

/// Errors that can occur while setting up the cart.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Stock API client could not be built.
    #[error("Stock client error: {0}")]
    Stock(#[from] StockError),

    /// Storage directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Build a cart store from environment configuration.
///
/// # Errors
///
/// Returns `CommandError` if configuration is invalid or the storage
/// directory cannot be created.
pub fn open_store() -> Result<CartStore, CommandError> {
    let config = CartConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    let stock = HttpStockClient::new(&config.api)?;
    let storage = FileStore::open(&config.storage.dir)?;

    Ok(CartStore::open(
        Arc::new(stock),
        Arc::new(storage),
        Arc::new(TracingNotifier),
        StoreOptions::from(&config),
    ))
}

/// Print the cart lines followed by the item count and subtotal.
#[allow(clippy::print_stdout)]
pub async fn print_cart(store: &CartStore) {
    let cart = store.cart().await;

    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for line in &cart {
        println!(
            "{:>6}  {:<40} {:>4} x {:>10} = {:>10}",
            line.id.to_string(),
            line.title,
            line.amount,
            line.price.to_string(),
            line.line_price().to_string(),
        );
    }

    println!(
        "{} product(s), {} item(s), subtotal {}",
        cart.len(),
        store.total_quantity().await,
        store.subtotal().await
    );
}
