//! Classification of a store fetch into the outcomes `get_session` handles.

use crate::error::Result;
use crate::session::id::SessionId;
use crate::session::record::SessionRecord;
use chrono::{DateTime, Utc};

/// Outcome of looking up a caller-supplied identifier
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A live record; the session will be renewed and returned
    Hit(SessionRecord),
    /// No usable record: absent identifier, unknown key, store failure or timeout
    Miss,
    /// A decodable record past its expiry; it is removed from the store
    Expired(SessionRecord),
    /// Bytes were present but did not decode into a record
    Corrupt(String),
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Decide what a fetch for `id` means at time `now`
///
/// Store errors (including timeouts) are folded into [`Lookup::Miss`].
pub fn classify(id: &SessionId, fetched: Result<Option<Vec<u8>>>, now: DateTime<Utc>) -> Lookup {
    let bytes = match fetched {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Lookup::Miss,
        Err(e) => {
            tracing::warn!(session_id = id.short(), error = %e, "Session fetch failed, treating as miss");
            return Lookup::Miss;
        }
    };

    match SessionRecord::decode(&bytes, id) {
        Ok(record) if record.is_expired_at(now) => Lookup::Expired(record),
        Ok(record) => Lookup::Hit(record),
        Err(e) => Lookup::Corrupt(e.to_string()),
    }
}
