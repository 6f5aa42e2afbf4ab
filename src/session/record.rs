//! Canonical persisted form of a session.
//!
//! Every process sharing a store reads and writes this one JSON encoding.
//! The `version` field guards against readers meeting a layout they do not know.

use crate::error::{Result, SessionError};
use crate::session::id::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Current record layout version
///
/// Version 1 stored the expiry in whole seconds; it is still readable.
pub const RECORD_VERSION: u32 = 2;

/// Serialized session: identifier, expiry bookkeeping and data bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub version: u32,
    pub id: SessionId,
    pub expires_after_ms: u64,
    pub last_renewed_at: DateTime<Utc>,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}

/// Just enough of a record to pick the layout to decode with
#[derive(Deserialize)]
struct RecordHeader {
    version: u32,
}

/// Layout version 1
#[derive(Deserialize)]
struct RecordV1 {
    id: SessionId,
    expires_after_secs: u64,
    last_renewed_at: DateTime<Utc>,
    #[serde(default)]
    data: BTreeMap<String, Value>,
}

impl From<RecordV1> for SessionRecord {
    fn from(old: RecordV1) -> Self {
        Self::new(
            old.id,
            Duration::from_secs(old.expires_after_secs),
            old.last_renewed_at,
            old.data,
        )
    }
}

impl SessionRecord {
    pub fn new(
        id: SessionId,
        expires_after: Duration,
        last_renewed_at: DateTime<Utc>,
        data: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            id,
            expires_after_ms: expiry_millis(expires_after),
            last_renewed_at,
            data,
        }
    }

    pub fn expires_after(&self) -> Duration {
        Duration::from_millis(self.expires_after_ms)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        past_expiry(self.last_renewed_at, self.expires_after(), now)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| SessionError::encode(format!("Failed to serialize session: {}", e)))
    }

    /// Decode bytes read from the store under `expected`
    pub fn decode(bytes: &[u8], expected: &SessionId) -> Result<Self> {
        let header: RecordHeader = serde_json::from_slice(bytes)?;

        let record: Self = match header.version {
            RECORD_VERSION => serde_json::from_slice(bytes)?,
            1 => serde_json::from_slice::<RecordV1>(bytes)?.into(),
            other => {
                return Err(SessionError::decode(format!(
                    "unsupported record version {}",
                    other
                )));
            }
        };

        if &record.id != expected {
            return Err(SessionError::decode(format!(
                "record for {} stored under {}",
                record.id.short(),
                expected.short()
            )));
        }

        Ok(record)
    }
}

/// `expiry` in whole milliseconds, rounded up so a stored expiry is never shorter
pub(crate) fn expiry_millis(expiry: Duration) -> u64 {
    let millis = expiry.as_millis() as u64;
    if expiry.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    }
}

/// True iff more than `expires_after` has elapsed since `last_renewed_at`
pub(crate) fn past_expiry(
    last_renewed_at: DateTime<Utc>,
    expires_after: Duration,
    now: DateTime<Utc>,
) -> bool {
    // A renewal stamped in the future (clock skew between hosts) counts as fresh
    match now.signed_duration_since(last_renewed_at).to_std() {
        Ok(elapsed) => elapsed > expires_after,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::entropy::OsEntropy;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record_with(data: BTreeMap<String, Value>) -> SessionRecord {
        SessionRecord::new(
            SessionId::generate(&OsEntropy),
            Duration::from_secs(7200),
            Utc::now(),
            data,
        )
    }

    #[test]
    fn test_encode_decode_preserves_values() {
        let mut data = BTreeMap::new();
        data.insert("user_id".to_string(), json!(42));
        data.insert("roles".to_string(), json!(["admin", "editor"]));
        data.insert("prefs".to_string(), json!({"theme": "dark", "beta": true}));
        data.insert("ratio".to_string(), json!(0.25));
        data.insert("nothing".to_string(), Value::Null);
        let record = record_with(data);

        let bytes = record.encode().unwrap();
        let decoded = SessionRecord::decode(&bytes, &record.id).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let id = SessionId::generate(&OsEntropy);
        let err = SessionRecord::decode(b"\x80\x02not-json", &id).unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut record = record_with(BTreeMap::new());
        record.version = RECORD_VERSION + 1;
        let bytes = serde_json::to_vec(&record).unwrap();
        let err = SessionRecord::decode(&bytes, &record.id).unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_identifier_mismatch() {
        let record = record_with(BTreeMap::new());
        let other = SessionId::generate(&OsEntropy);
        let err = SessionRecord::decode(&record.encode().unwrap(), &other).unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
    }

    #[test]
    fn test_sub_second_expiry_is_kept() {
        let record = SessionRecord::new(
            SessionId::generate(&OsEntropy),
            Duration::from_millis(1500),
            Utc::now(),
            BTreeMap::new(),
        );
        let decoded = SessionRecord::decode(&record.encode().unwrap(), &record.id).unwrap();
        assert_eq!(decoded.expires_after(), Duration::from_millis(1500));

        let renewed = decoded.last_renewed_at;
        assert!(!decoded.is_expired_at(renewed + TimeDelta::milliseconds(1100)));
        assert!(decoded.is_expired_at(renewed + TimeDelta::milliseconds(1501)));
    }

    #[test]
    fn test_expiry_millis_rounds_up() {
        assert_eq!(expiry_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(expiry_millis(Duration::from_micros(1500)), 2);
        assert_eq!(expiry_millis(Duration::from_nanos(1)), 1);
        assert_eq!(expiry_millis(Duration::from_secs(7200)), 7_200_000);
    }

    #[test]
    fn test_decode_version_one_record() {
        let id = SessionId::generate(&OsEntropy);
        let bytes = serde_json::to_vec(&json!({
            "version": 1,
            "id": id.as_str(),
            "expires_after_secs": 7200,
            "last_renewed_at": "2026-01-01T00:00:00Z",
            "data": {"user_id": 42}
        }))
        .unwrap();

        let record = SessionRecord::decode(&bytes, &id).unwrap();
        assert_eq!(record.version, RECORD_VERSION);
        assert_eq!(record.expires_after(), Duration::from_secs(7200));
        assert_eq!(record.data.get("user_id"), Some(&json!(42)));
    }

    #[test]
    fn test_expiry_boundary() {
        let record = SessionRecord::new(
            SessionId::generate(&OsEntropy),
            Duration::from_secs(60),
            Utc::now(),
            BTreeMap::new(),
        );
        let renewed = record.last_renewed_at;

        assert!(!record.is_expired_at(renewed));
        assert!(!record.is_expired_at(renewed + TimeDelta::seconds(60)));
        assert!(record.is_expired_at(renewed + TimeDelta::seconds(61)));
        assert!(!record.is_expired_at(renewed - TimeDelta::seconds(30)));
    }
}
