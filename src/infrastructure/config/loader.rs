use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Largest distance from UTC, in minutes, a business offset may have.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Longest token lifetime accepted, one year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Invalid port: 0")]
    InvalidPort,

    #[error("Invalid cache ttl_secs: {0}. Must be at least 1")]
    InvalidCacheTtl(u64),

    #[error("Invalid vat_rate: {0}. Cannot be negative")]
    InvalidVatRate(f64),

    #[error("Invalid utc_offset_minutes: {0}. Must be within +/-840")]
    InvalidUtcOffset(i32),

    #[error("jwt_secret cannot be empty when require_auth is enabled")]
    EmptyJwtSecret,

    #[error("Invalid token_ttl_hours: {0}. Must be between 1 and 8760")]
    InvalidTokenTtl(i64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. salesdesk.yaml in the working directory
    /// 3. salesdesk.local.yaml (local overrides, optional)
    /// 4. Environment variables (SALESDESK_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment(&[Path::new("salesdesk.yaml"), Path::new("salesdesk.local.yaml")])
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file instead of the default ones.
    /// Environment variables still take precedence.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Self::figment(&[path])
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(files: &[&Path]) -> Figment {
        let figment = files
            .iter()
            .fold(Figment::new().merge(Serialized::defaults(Config::default())), |figment, file| {
                figment.merge(Yaml::file(file))
            });
        figment.merge(Env::prefixed("SALESDESK_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidCacheTtl(config.cache.ttl_secs));
        }

        if config.business.vat_rate.is_nan() || config.business.vat_rate < 0.0 {
            return Err(ConfigError::InvalidVatRate(config.business.vat_rate));
        }

        if config.business.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidUtcOffset(config.business.utc_offset_minutes));
        }

        if config.auth.require_auth && config.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptyJwtSecret);
        }

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&config.auth.token_ttl_hours) {
            return Err(ConfigError::InvalidTokenTtl(config.auth.token_ttl_hours));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.database.path, "data/salesdesk.db");
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let file = yaml_file(
            r"
server:
  port: 8080
database:
  path: /tmp/sales.db
business:
  utc_offset_minutes: -240
",
        );

        let config = temp_env::with_vars_unset(["SALESDESK_SERVER__PORT"], || {
            ConfigLoader::load_from_file(file.path()).unwrap()
        });
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.path, "/tmp/sales.db");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.business.utc_offset_minutes, -240);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = yaml_file("server:\n  port: 8080\n");

        let config = temp_env::with_vars(
            [
                ("SALESDESK_SERVER__PORT", Some("9090")),
                ("SALESDESK_AUTH__REQUIRE_AUTH", Some("true")),
                ("SALESDESK_AUTH__JWT_SECRET", Some("s3cret")),
            ],
            || ConfigLoader::load_from_file(file.path()).unwrap(),
        );
        assert_eq!(config.server.port, 9090);
        assert!(config.auth.require_auth);
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        let file = yaml_file("logging:\n  level: verbose\n");
        let result = temp_env::with_vars_unset(["SALESDESK_LOGGING__LEVEL"], || ConfigLoader::load_from_file(file.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(ConfigLoader::load_from_file("/nonexistent/salesdesk.yaml").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.database.path = "  ".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabasePath)));

        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        ));

        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidPort)));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogFormat(_))));

        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidRotation(_))));

        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidCacheTtl(0))));

        let mut config = Config::default();
        config.business.vat_rate = -0.1;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidVatRate(_))));

        let mut config = Config::default();
        config.business.utc_offset_minutes = 900;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidUtcOffset(900))
        ));
    }

    #[test]
    fn test_jwt_secret_required_only_with_auth() {
        let mut config = Config::default();
        config.auth.jwt_secret = String::new();
        assert!(ConfigLoader::validate(&config).is_ok());

        config.auth.require_auth = true;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyJwtSecret)));
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = Config::default();
        for hours in [0, -1, MAX_TOKEN_TTL_HOURS + 1, i64::MAX] {
            config.auth.token_ttl_hours = hours;
            assert!(matches!(
                ConfigLoader::validate(&config),
                Err(ConfigError::InvalidTokenTtl(h)) if h == hours
            ));
        }
        config.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(ConfigLoader::validate(&config).is_ok());
    }
}
