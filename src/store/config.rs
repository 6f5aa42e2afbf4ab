use serde::{Deserialize, Serialize};
use crate::error::{Result, SessionError};
use crate::utils::get_env_with_prefix;

/// Backing store type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-memory store (default, for dev/testing)
    InMemory,
    /// Redis store (requires redis feature)
    #[cfg(feature = "redis")]
    Redis,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::InMemory
    }
}

/// Backing store connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StoreBackend,

    /// Store host
    #[serde(default = "default_host")]
    pub host: String,

    /// Store port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logical database number
    #[serde(default)]
    pub database: u32,

    /// Full connection URL; overrides host, port and database when set
    #[serde(default)]
    pub url: Option<String>,

    /// Prefix prepended to every session identifier to form the store key
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            host: default_host(),
            port: default_port(),
            database: 0,
            url: None,
            key_prefix: String::new(),
        }
    }
}

impl StoreConfig {
    /// Load store configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(backend) = get_env_with_prefix("STORE_BACKEND") {
            config.backend = match backend.to_lowercase().as_str() {
                "redis" => {
                    #[cfg(feature = "redis")]
                    {
                        StoreBackend::Redis
                    }
                    #[cfg(not(feature = "redis"))]
                    {
                        tracing::warn!("Redis store requested but redis feature not enabled, using in-memory");
                        StoreBackend::InMemory
                    }
                }
                _ => StoreBackend::InMemory,
            };
        }

        if let Some(host) = get_env_with_prefix("STORE_HOST") {
            config.host = host;
        }

        if let Some(port) = get_env_with_prefix("STORE_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }

        if let Some(db) = get_env_with_prefix("STORE_DATABASE") {
            if let Ok(db) = db.parse() {
                config.database = db;
            }
        }

        if let Some(url) = get_env_with_prefix("STORE_URL") {
            config.url = Some(url);
        }

        if let Some(prefix) = get_env_with_prefix("STORE_KEY_PREFIX") {
            config.key_prefix = prefix;
        }

        config
    }

    /// Connection URL for the store
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.url.is_none() {
            if self.host.trim().is_empty() {
                return Err(SessionError::invalid_config("store host must not be empty"));
            }
            if self.port == 0 {
                return Err(SessionError::invalid_config("store port must be non-zero"));
            }
        }

        // The prefix is embedded in KEYS patterns during enumeration
        if self.key_prefix.contains(['*', '?', '[', ']']) {
            return Err(SessionError::invalid_config(format!(
                "store key prefix {:?} must not contain glob characters",
                self.key_prefix
            )));
        }

        Ok(())
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}
