//! Key-value string storage
//!
//! The notification gate persists its state through the [`Storage`] trait.
//! An empty string from [`Storage::get`] means the key is absent.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use async_trait::async_trait;

/// Persistent string store
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a value; returns an empty string when the key is absent
    async fn get(&self, key: &str) -> Result<String, StorageError>;

    /// Write a value, replacing any previous one
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
