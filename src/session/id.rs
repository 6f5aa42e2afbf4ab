use crate::traits::entropy::EntropySource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes behind every identifier (256 bits)
pub const SESSION_ID_BYTES: usize = 32;

/// Length of the hex-encoded identifier
pub const SESSION_ID_LEN: usize = SESSION_ID_BYTES * 2;

/// Opaque session identifier
///
/// 32 bytes from an [`EntropySource`], rendered as 64 lower-case hex
/// characters. Immutable once created; doubles as the store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Mint a new identifier
    pub fn generate(entropy: &dyn EntropySource) -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        entropy.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse a caller-supplied value (typically a cookie)
    ///
    /// Returns `None` unless the value has exactly the shape `generate` produces.
    pub fn parse(value: &str) -> Option<Self> {
        let well_formed = value.len() == SESSION_ID_LEN
            && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

        well_formed.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("malformed session identifier {:?}", value))
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}
