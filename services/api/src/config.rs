//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use mentorship_core::SameDayPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub cors_origin: String,
    pub same_day_policy: SameDayPolicy,
    /// JSON file of users and tokens loaded into the in-memory store.
    pub seed_users_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            database_max_connections: 5,
            log_level: Level::INFO,
            cors_origin: "http://localhost:5173".to_string(),
            same_day_policy: SameDayPolicy::default(),
            seed_users_path: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), e.to_string())
            })?,
            None => defaults.database_max_connections,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Web and Scheduling Settings ---
        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let same_day_policy = match lookup("SAME_DAY_POLICY") {
            Some(raw) => raw
                .parse::<SameDayPolicy>()
                .map_err(|e| ConfigError::InvalidValue("SAME_DAY_POLICY".to_string(), e))?,
            None => defaults.same_day_policy,
        };

        let seed_users_path = lookup("SEED_USERS")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            cors_origin,
            same_day_policy,
            seed_users_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.same_day_policy, SameDayPolicy::RollIfPassed);
        assert!(config.seed_users_path.is_none());
    }

    #[test]
    fn values_are_parsed() {
        let config = from_pairs(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/mentorship"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("RUST_LOG", "debug"),
            ("SAME_DAY_POLICY", "always_next_week"),
            ("SEED_USERS", "seed/users.json"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/mentorship"));
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.same_day_policy, SameDayPolicy::AlwaysNextWeek);
        assert_eq!(config.seed_users_path, Some(PathBuf::from("seed/users.json")));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        match from_pairs(&[("SAME_DAY_POLICY", "whenever")]) {
            Err(ConfigError::InvalidValue(var, _)) => assert_eq!(var, "SAME_DAY_POLICY"),
            other => panic!("expected invalid value, got {:?}", other),
        }
        assert!(from_pairs(&[("BIND_ADDRESS", "nowhere")]).is_err());
    }
}
