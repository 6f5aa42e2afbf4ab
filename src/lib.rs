//! Tidestore - server-side session store
//!
//! Issues opaque 256-bit session identifiers, keeps a small key-value bag per
//! identifier in a shared backing store (Redis or in-memory), and enforces
//! time-based expiry.
//!
//! # Features
//!
//! - **Resilient lookup**: `get_session` never fails; absent, unknown, expired or
//!   corrupt identifiers and store outages all yield a fresh session
//! - **Write-through**: every mutation is persisted before the call returns
//! - **Pluggable stores**: implement [`BackingStore`] for your own key-value service
//! - **Deadlines**: every store call honours a configurable timeout
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tidestore::{self, Config, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> tidestore::Result<()> {
//!     let config = Config::from_env()?;
//!     tidestore::init_tracing_with_config(&config.logging);
//!
//!     let manager = SessionManager::from_config(&config.session)?;
//!
//!     // Per request, with the cookie value if the client sent one
//!     let mut session = manager.get_session(None).await;
//!     session.set("visits", &1).await?;
//!     println!("set cookie to {}", session.id());
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds properly

mod config;
mod error;
pub mod session;
pub mod store;
pub mod testing;
pub mod traits;
pub mod utils;

// Re-exports for public API
pub use config::{Config, LoggingConfig};
pub use error::{Result, SessionError};
pub use session::{
    DeletionHook, Lookup, Session, SessionConfig, SessionConfigBuilder, SessionId,
    SessionManager, SessionManagerBuilder, SessionRecord,
};
pub use store::{InMemoryStore, StoreBackend, StoreConfig};
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use traits::entropy::{EntropySource, OsEntropy};
pub use traits::store::BackingStore;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "tidestore=debug")
/// - `TIDESTORE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("TIDESTORE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install(env_filter, json_logs);
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &LoggingConfig) {
    install(EnvFilter::new(&config.level), config.json);
}

fn install(env_filter: EnvFilter, json: bool) {
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
