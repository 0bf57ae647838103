//! Server configuration resolved from process environment.
//!
//! # Invariants
//! - Blank or whitespace-only values fall back to defaults.
//! - An unparsable bind address is an error, never silently replaced.

use directory_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "DIRECTORY_DB_PATH";
pub const API_KEY_ENV: &str = "API_KEY";
pub const BIND_ADDR_ENV: &str = "DIRECTORY_BIND_ADDR";
pub const LOG_LEVEL_ENV: &str = "DIRECTORY_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DIRECTORY_LOG_DIR";

pub const DEFAULT_API_KEY: &str = "supersecret";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DB_FILE_NAME: &str = "directory.sqlite3";

/// Errors from configuration resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBindAddr { value: String, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBindAddr { value, message } => {
                write!(f, "invalid bind address `{value}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub api_key: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Rolling log directory; `None` logs to stderr instead.
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        let db_path = value(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        let api_key = value(API_KEY_ENV).unwrap_or_else(|| DEFAULT_API_KEY.to_string());
        let bind_addr = parse_bind_addr(
            &value(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;
        let log_level = value(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = value(LOG_DIR_ENV).map(PathBuf::from);

        Ok(Self {
            db_path,
            api_key,
            bind_addr,
            log_level,
            log_dir,
        })
    }
}

/// Parses a `host:port` listen address.
pub fn parse_bind_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|err: std::net::AddrParseError| ConfigError::InvalidBindAddr {
            value: raw.to_string(),
            message: err.to_string(),
        })
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_key, DEFAULT_API_KEY);
        assert_eq!(config.bind_addr, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.db_path, std::env::temp_dir().join("directory.sqlite3"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[(API_KEY_ENV, "   "), (DB_PATH_ENV, "")]).unwrap();
        assert_eq!(config.api_key, DEFAULT_API_KEY);
        assert_eq!(config.db_path, default_db_path());
    }

    #[test]
    fn values_are_trimmed() {
        let config = config_from(&[
            (API_KEY_ENV, " s3cret "),
            (DB_PATH_ENV, " /var/lib/directory.db "),
            (BIND_ADDR_ENV, "0.0.0.0:9000"),
            (LOG_DIR_ENV, "/var/log/directory"),
        ])
        .unwrap();
        assert_eq!(config.api_key, "s3cret");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/directory.db"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/directory")));
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let err = config_from(&[(BIND_ADDR_ENV, "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
        assert!(err.to_string().contains("localhost"));
    }
}
