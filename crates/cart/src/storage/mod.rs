//! Persistent key-value storage for cart snapshots.
//!
//! The cart stores its whole snapshot as one JSON string under a single key.
//! Backends only need `get` and `set`:
//!
//! - [`MemoryStore`] - process-local, for tests and throwaway sessions
//! - [`FileStore`] - one file per key in a directory, survives restarts

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

use crate::model::{CartSnapshot, sanitize};

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend lock was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Durable string key-value storage.
///
/// Methods take `&self`; implementations use interior mutability.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Load the cart snapshot stored under `key`.
///
/// Missing, unreadable and malformed snapshots all load as an empty cart.
/// Line items breaking the cart invariants are dropped.
pub fn load_snapshot(store: &dyn KeyValueStore, key: &str) -> CartSnapshot {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return CartSnapshot::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read cart snapshot, starting empty");
            return CartSnapshot::new();
        }
    };

    let items: CartSnapshot = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(key, error = %e, "Malformed cart snapshot, starting empty");
            return CartSnapshot::new();
        }
    };

    let (items, dropped) = sanitize(items);
    for item in &dropped {
        tracing::warn!(
            key,
            product_id = %item.id,
            amount = item.amount,
            "Dropped invalid line item from stored snapshot"
        );
    }

    items
}

/// Serialize `snapshot` and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError` if encoding or the backend write fails.
pub fn save_snapshot(
    store: &dyn KeyValueStore,
    key: &str,
    snapshot: &CartSnapshot,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(snapshot)?;
    store.set(key, &raw)
}
