//! Storefront Cart - shopping cart state management.
//!
//! [`CartStore`] owns the cart line items and exposes three mutations:
//! add one unit, remove a product, and set an absolute amount. Quantities are
//! checked against a remote stock service and every successful mutation is
//! written through to a persistent key-value store before it becomes visible.
//!
//! # Collaborators
//!
//! - [`StockService`] - stock and product lookups ([`HttpStockClient`] over REST)
//! - [`KeyValueStore`] - snapshot persistence ([`FileStore`], [`MemoryStore`])
//! - [`Notifier`] - user-facing warnings ([`TracingNotifier`])
//!
//! Operations never return errors. Callers observe the outcome through
//! [`CartStore::cart`] and the notifier.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod stock;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError, HeadroomPolicy, StockApiConfig};
pub use error::{CartError, CartOperation};
pub use model::{CartLineItem, CartSnapshot, Product, StockRecord, UpdateProductAmount};
pub use notify::{Notifier, TracingNotifier};
pub use stock::{HttpStockClient, StockError, StockService};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartStore, StoreOptions};
pub use storefront_cart_core::{Price, ProductId};
