//! Testing utilities for code built on the session store
//!
//! Store and entropy doubles that make write-through behaviour observable:
//! - [`CountingStore`]: in-memory store that counts reads, writes and deletes and can fail on demand
//! - [`UnavailableStore`]: every call fails as if the network were down
//! - [`SlowStore`]: in-memory store that sleeps before each call, for deadline tests
//! - [`SequenceEntropy`]: deterministic identifiers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tidestore::{SessionManager, testing::CountingStore};
//!
//! #[tokio::test]
//! async fn test_login_writes_once() {
//!     let store = Arc::new(CountingStore::new());
//!     let manager = SessionManager::builder(store.clone()).build();
//!
//!     let mut session = manager.get_session(None).await;
//!     session.set("user_id", &42).await.unwrap();
//!
//!     assert_eq!(store.writes(), 1);
//! }
//! ```

mod entropy;
mod stores;

pub use entropy::SequenceEntropy;
pub use stores::{CountingStore, SlowStore, UnavailableStore};
