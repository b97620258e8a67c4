//! The cart state container.
//!
//! [`CartStore`] owns the cart snapshot. Every mutation validates against the
//! stock service, writes the new snapshot through to the key-value store, and
//! only then publishes it in memory. Failures never reach the caller; they are
//! logged and turned into exactly one user warning.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = CartStore::open(stock, storage, notifier, StoreOptions::default());
//!
//! store.add_product(ProductId::new(1)).await;
//! store
//!     .update_product_amount(UpdateProductAmount { product_id: ProductId::new(1), amount: 3 })
//!     .await;
//!
//! for line in store.cart().await {
//!     println!("{} x{}", line.title, line.amount);
//! }
//! ```

use std::sync::Arc;

use storefront_cart_core::{Price, ProductId};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument};

use crate::config::{CartConfig, DEFAULT_STORAGE_KEY, HeadroomPolicy};
use crate::error::{CartError, CartOperation, Result};
use crate::model::{CartLineItem, CartSnapshot, Product, UpdateProductAmount};
use crate::notify::Notifier;
use crate::stock::StockService;
use crate::storage::{KeyValueStore, load_snapshot, save_snapshot};

/// Options for opening a [`CartStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Key holding the snapshot in the key-value store
    pub key: String,
    /// Headroom policy applied to quantity checks
    pub headroom: HeadroomPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            headroom: HeadroomPolicy::default(),
        }
    }
}

impl From<&CartConfig> for StoreOptions {
    fn from(config: &CartConfig) -> Self {
        Self {
            key: config.storage.key.clone(),
            headroom: config.headroom,
        }
    }
}

/// Shopping cart with stock-checked mutations and write-through persistence.
///
/// Mutating operations are serialized: each one holds the operation gate
/// across its stock lookups, so overlapping calls on the same product see
/// each other's changes. Reads only wait for a commit in progress, never for
/// a pending lookup.
pub struct CartStore {
    stock: Arc<dyn StockService>,
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    key: String,
    headroom: HeadroomPolicy,
    gate: Mutex<()>,
    snapshot: RwLock<CartSnapshot>,
}

impl CartStore {
    /// Open a cart, loading the snapshot persisted under `options.key`.
    ///
    /// A missing or unreadable snapshot opens an empty cart.
    pub fn open(
        stock: Arc<dyn StockService>,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        options: StoreOptions,
    ) -> Self {
        let snapshot = load_snapshot(storage.as_ref(), &options.key);
        debug!(key = %options.key, items = snapshot.len(), "Cart snapshot loaded");

        Self {
            stock,
            storage,
            notifier,
            key: options.key,
            headroom: options.headroom,
            gate: Mutex::new(()),
            snapshot: RwLock::new(snapshot),
        }
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    /// Current cart contents.
    pub async fn cart(&self) -> CartSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Number of distinct products in the cart.
    pub async fn distinct_items(&self) -> usize {
        self.snapshot.read().await.len()
    }

    /// Sum of all line item amounts.
    pub async fn total_quantity(&self) -> u64 {
        self.snapshot
            .read()
            .await
            .iter()
            .map(|item| u64::from(item.amount))
            .sum()
    }

    /// Sum of all line prices.
    pub async fn subtotal(&self) -> Price {
        self.snapshot
            .read()
            .await
            .iter()
            .map(CartLineItem::line_price)
            .sum()
    }

    /// Amount of `product_id` in the cart, if present.
    pub async fn amount_of(&self, product_id: ProductId) -> Option<u32> {
        self.snapshot
            .read()
            .await
            .iter()
            .find(|item| item.id == product_id)
            .map(|item| item.amount)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product_id`, appending a new line item if needed.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) {
        let _gate = self.gate.lock().await;
        let result = self.try_add(product_id).await;
        self.report(CartOperation::Add, product_id, result);
    }

    /// Remove the line item for `product_id`.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) {
        let _gate = self.gate.lock().await;
        let result = self.try_remove(product_id).await;
        self.report(CartOperation::Remove, product_id, result);
    }

    /// Set the amount of a product already in the cart.
    ///
    /// Amounts of zero or less are ignored without a warning.
    #[instrument(skip(self), fields(product_id = %update.product_id, amount = update.amount))]
    pub async fn update_product_amount(&self, update: UpdateProductAmount) {
        if update.amount <= 0 {
            debug!("Ignoring non-positive amount");
            return;
        }

        let _gate = self.gate.lock().await;
        let result = self.try_update(update.product_id, update.amount).await;
        self.report(CartOperation::Update, update.product_id, result);
    }

    async fn try_add(&self, product_id: ProductId) -> Result<()> {
        let mut next = self.cart().await;
        let current = amount_in(&next, product_id);
        let candidate = current.map_or(1, |amount| amount.saturating_add(1));

        let stock = self.stock.stock(product_id).await?;
        warn_on_stock_id(product_id, stock.id);
        if !self.headroom.allows_add(candidate, stock.amount) {
            return Err(CartError::StockExceeded {
                product_id,
                requested: candidate,
                available: stock.amount,
            });
        }

        if current.is_some() {
            set_amount(&mut next, product_id, candidate);
        } else {
            let product = self.stock.product(product_id).await?;
            if product.id != product_id {
                tracing::warn!(
                    returned_id = %product.id,
                    "Product lookup returned a different id, keeping the requested one"
                );
            }
            next.push(CartLineItem::new(
                Product {
                    id: product_id,
                    ..product
                },
                1,
            ));
        }

        self.commit(next).await
    }

    async fn try_remove(&self, product_id: ProductId) -> Result<()> {
        let mut next = self.cart().await;
        let position = next
            .iter()
            .position(|item| item.id == product_id)
            .ok_or(CartError::NotFound(product_id))?;

        next.remove(position);
        self.commit(next).await
    }

    async fn try_update(&self, product_id: ProductId, amount: i64) -> Result<()> {
        let mut next = self.cart().await;
        if amount_in(&next, product_id).is_none() {
            return Err(CartError::NotFound(product_id));
        }

        // Anything past u32 can never be in stock.
        let requested = u32::try_from(amount).unwrap_or(u32::MAX);

        let stock = self.stock.stock(product_id).await?;
        warn_on_stock_id(product_id, stock.id);
        if !self.headroom.allows_update(requested, stock.amount) {
            return Err(CartError::StockExceeded {
                product_id,
                requested,
                available: stock.amount,
            });
        }

        set_amount(&mut next, product_id, requested);
        self.commit(next).await
    }

    /// Persist `next`, then publish it in memory.
    async fn commit(&self, next: CartSnapshot) -> Result<()> {
        save_snapshot(self.storage.as_ref(), &self.key, &next)?;
        let items = next.len();
        *self.snapshot.write().await = next;
        debug!(items, "Cart committed");
        Ok(())
    }

    fn report(&self, operation: CartOperation, product_id: ProductId, result: Result<()>) {
        let Err(err) = result else {
            return;
        };

        match &err {
            CartError::StockExceeded { .. } | CartError::NotFound(_) => {
                tracing::warn!(?operation, %product_id, error = %err, "Cart operation rejected");
            }
            CartError::Stock(_) | CartError::Storage(_) => {
                tracing::error!(?operation, %product_id, error = %err, "Cart operation failed");
            }
        }

        self.notifier.warn(err.user_message(operation));
    }
}

/// Log a stock record whose id differs from the requested product.
fn warn_on_stock_id(requested: ProductId, returned: ProductId) {
    if returned != requested {
        tracing::warn!(
            returned_id = %returned,
            "Stock lookup returned a different id, applying it to the requested one"
        );
    }
}

fn amount_in(items: &CartSnapshot, product_id: ProductId) -> Option<u32> {
    items
        .iter()
        .find(|item| item.id == product_id)
        .map(|item| item.amount)
}

fn set_amount(items: &mut CartSnapshot, product_id: ProductId, amount: u32) {
    if let Some(item) = items.iter_mut().find(|item| item.id == product_id) {
        item.amount = amount;
    }
}
