use std::time::Duration;

/// The error type for session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Decode failure: {0}")]
    Decode(String),

    #[error("Encode failure: {0}")]
    Encode(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SessionError {
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound(key.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Timeout(after)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether `SessionManager::get_session` absorbs this error as a cache miss.
    ///
    /// Store transport failures, timeouts and undecodable records all resolve to
    /// "issue a new session". Data-key and configuration errors never reach that path.
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::Decode(_) | Self::Timeout(_)
        )
    }
}

/// Result type alias for session store operations
pub type Result<T> = std::result::Result<T, SessionError>;

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        // Classify based on error category
        if err.is_data() || err.is_syntax() || err.is_eof() {
            SessionError::Decode(format!("JSON error: {}", err))
        } else {
            SessionError::Encode(format!("JSON serialization error: {}", err))
        }
    }
}
