use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{Result, SessionError};
use crate::store::{StoreBackend, StoreConfig};
use crate::utils::get_env_with_prefix;

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Default session lifetime since last renewal (in seconds)
    #[serde(default = "default_expiry_seconds")]
    pub default_expiry_seconds: u64,

    /// Deadline for each backing store call (in milliseconds)
    ///
    /// `None` disables the deadline.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: Option<u64>,

    /// Backing store connection
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_expiry_seconds: default_expiry_seconds(),
            operation_timeout_ms: default_operation_timeout_ms(),
            store: StoreConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new SessionConfig builder
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Load session configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self {
            store: StoreConfig::from_env(),
            ..Self::default()
        };

        if let Some(expiry) = get_env_with_prefix("SESSION_EXPIRE_SECONDS") {
            if let Ok(seconds) = expiry.parse() {
                config.default_expiry_seconds = seconds;
            }
        }

        if let Some(timeout) = get_env_with_prefix("SESSION_OPERATION_TIMEOUT_MS") {
            config.operation_timeout_ms = match timeout.to_lowercase().as_str() {
                "none" | "off" => None,
                value => value.parse().ok().or(config.operation_timeout_ms),
            };
        }

        config
    }

    /// Get default expiry as Duration
    pub fn default_expiry(&self) -> Duration {
        Duration::from_secs(self.default_expiry_seconds)
    }

    /// Get the per-call store deadline as Duration
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_expiry_seconds == 0 {
            return Err(SessionError::invalid_config("session expiry must be greater than zero"));
        }

        if self.operation_timeout_ms == Some(0) {
            return Err(SessionError::invalid_config(
                "operation timeout must be greater than zero (omit it to disable)",
            ));
        }

        self.store.validate()
    }
}

/// Builder for SessionConfig
#[must_use = "builder does nothing until you call build()"]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Start from environment variables
    pub fn from_env(mut self) -> Self {
        self.config = SessionConfig::from_env();
        self
    }

    pub fn default_expiry_seconds(mut self, seconds: u64) -> Self {
        self.config.default_expiry_seconds = seconds;
        self
    }

    pub fn operation_timeout_ms(mut self, millis: u64) -> Self {
        self.config.operation_timeout_ms = Some(millis);
        self
    }

    pub fn without_operation_timeout(mut self) -> Self {
        self.config.operation_timeout_ms = None;
        self
    }

    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    pub fn backend(mut self, backend: StoreBackend) -> Self {
        self.config.store.backend = backend;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.store.key_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_expiry_seconds() -> u64 {
    7200 // 2 hours
}

fn default_operation_timeout_ms() -> Option<u64> {
    Some(2000)
}
