//! Backing store implementations for session records.
//!
//! Provides an in-memory store by default, with Redis support
//! via the `redis` feature.

mod config;
mod in_memory;

#[cfg(feature = "redis")]
mod redis;

pub use config::{StoreBackend, StoreConfig};
pub use in_memory::InMemoryStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

use crate::error::Result;
use crate::traits::store::BackingStore;
use std::sync::Arc;

/// Build the backing store described by `config`
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn BackingStore>> {
    config.validate()?;

    match config.backend {
        StoreBackend::InMemory => {
            tracing::info!("Using in-memory session store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis => {
            tracing::info!(
                host = %config.host,
                port = config.port,
                database = config.database,
                "Using Redis session store"
            );
            Ok(Arc::new(RedisStore::new(&config.connection_url())?))
        }
    }
}
