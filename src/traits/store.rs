//! Backing store trait for serialized session records
//!
//! This trait abstracts the key-value service that holds session records,
//! allowing users to swap between in-memory, Redis, or custom implementations.

use crate::error::Result;
use async_trait::async_trait;

/// Key-value store holding raw session records
///
/// Single-key `get_bytes`, `set_bytes` and `delete` are assumed atomic at the
/// store. No cross-key transaction is offered or required.
#[async_trait]
#[allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds
pub trait BackingStore: Send + Sync {
    /// Get the raw bytes stored under `key`
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, overwriting any previous value
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Delete `key`; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys matching a glob `pattern` (`*` matches every key)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Check if the store backend is healthy
    fn is_healthy(&self) -> bool;
}
