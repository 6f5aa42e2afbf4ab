//! Session lifecycle: identifiers, the persisted record, lookup
//! classification, the session working copy and its manager.

mod config;
mod id;
mod lookup;
mod manager;
mod record;
mod state;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use id::{SESSION_ID_BYTES, SESSION_ID_LEN, SessionId};
pub use lookup::{Lookup, classify};
pub use manager::{DEFAULT_EXPIRY, DeletionHook, SessionManager, SessionManagerBuilder};
pub use record::{RECORD_VERSION, SessionRecord};
pub use state::Session;
