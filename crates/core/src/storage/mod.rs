//! Durable key-value storage for client state.
//!
//! The stores persist their state as JSON strings under fixed keys, the way
//! the browser build of the storefront keeps them in `localStorage`. Every
//! call is fallible and every caller treats a failure as non-fatal: the
//! in-memory state stays authoritative for the running session.
//!
//! The shopper session, admin session, and cart each own a distinct key.
//! No atomicity is promised across keys.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

use thiserror::Error;

/// Errors raised by a [`Storage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying file or directory operation failed.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// A storage key could not be mapped to a backing location.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Durable string storage keyed by name.
///
/// Implementations must be safe to share across the stores; each store only
/// ever touches its own key.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be read. A
    /// missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing an absent key is fine.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the removal fails for a present key.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn Storage>;
