use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::SessionConfig;
use crate::utils::get_env_with_prefix;

/// Top-level configuration for a host embedding the session store
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl LoggingConfig {
    /// Load logging configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            config.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            config.json = json.parse().unwrap_or(false);
        }

        config
    }
}

impl Config {
    /// Load the full configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let config = Self {
            session: SessionConfig::from_env(),
            logging: LoggingConfig::from_env(),
        };
        config.session.validate()?;
        Ok(config)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.session.default_expiry_seconds, 7200);
    }

    #[test]
    fn test_deserialize_nested() {
        let config: Config = serde_json::from_str(
            r#"{"logging": {"json": true}, "session": {"store": {"database": 4}}}"#,
        )
        .unwrap();
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.session.store.database, 4);
    }
}
