//! Configuration module for the cart store.
//!
//! Loads YAML configuration with environment variable interpolation and
//! validates it before anything connects.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cart_store::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Access configuration values
//! println!("backend: {:?}", config.persistence.backend);
//! ```
//!
//! # Example
//!
//! ```yaml
//! persistence:
//!   backend: turso
//!   db_path: ${CART_DB_PATH:-./data/shopping_cart.db}
//! cart:
//!   quantity_policy: reject_non_positive
//!   operation_timeout_ms: 5000
//! observability:
//!   log_level: debug
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::services::CartPolicy;
use crate::domain::cart::QuantityPolicy;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document store configuration.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Cart behavior configuration.
    #[serde(default)]
    pub cart: CartConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Document store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    /// Process-local store, lost on exit.
    Memory,
    /// Embedded Turso database file.
    #[default]
    Turso,
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Which gateway to connect.
    #[serde(default)]
    pub backend: PersistenceBackend,
    /// Database path for the Turso backend (`:memory:` for a transient one).
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "./data/shopping_cart.db".to_string()
}

/// Cart behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartConfig {
    /// Treatment of zero and negative quantities.
    #[serde(default)]
    pub quantity_policy: QuantityPolicy,
    /// Default per-operation deadline in milliseconds. Unset means none.
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl CartConfig {
    /// Convert to the cart store's policy.
    #[must_use]
    pub fn to_policy(&self) -> CartPolicy {
        CartPolicy {
            quantity_policy: self.quantity_policy,
            operation_timeout: self.operation_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Load configuration from a YAML file.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.persistence.backend == PersistenceBackend::Turso
        && config.persistence.db_path.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "persistence.db_path must be set for the turso backend".to_string(),
        ));
    }

    if config.cart.operation_timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError(
            "cart.operation_timeout_ms must be greater than 0".to_string(),
        ));
    }

    let level = config.observability.log_level.to_lowercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.log_level '{}' is not one of {:?}",
            config.observability.log_level, VALID_LOG_LEVELS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = load_config_from_string("{}").unwrap();
        assert_eq!(config.persistence.backend, PersistenceBackend::Turso);
        assert_eq!(config.persistence.db_path, "./data/shopping_cart.db");
        assert_eq!(config.cart.quantity_policy, QuantityPolicy::PassThrough);
        assert_eq!(config.cart.operation_timeout_ms, None);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn parses_full_document() {
        let yaml = r"
persistence:
  backend: memory
cart:
  quantity_policy: remove_non_positive
  operation_timeout_ms: 250
observability:
  log_level: debug
";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);

        let policy = config.cart.to_policy();
        assert_eq!(policy.quantity_policy, QuantityPolicy::RemoveNonPositive);
        assert_eq!(policy.operation_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn interpolation_falls_back_to_default() {
        let out = interpolate_env_vars("path: ${CART_STORE_TEST_SURELY_UNSET_VAR:-/tmp/cart.db}");
        assert_eq!(out, "path: /tmp/cart.db");
    }

    #[test]
    fn interpolation_without_default_is_empty() {
        let out = interpolate_env_vars("x${CART_STORE_TEST_SURELY_UNSET_VAR}y");
        assert_eq!(out, "xy");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = load_config_from_string("cart:\n  operation_timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_turso_path_is_rejected() {
        let yaml = "persistence:\n  backend: turso\n  db_path: \"\"\n";
        let err = load_config_from_string(yaml).unwrap_err();
        assert!(err.to_string().contains("db_path"));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = load_config_from_string("observability:\n  log_level: loud\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_policy_fails_to_parse() {
        let err = load_config_from_string("cart:\n  quantity_policy: clamp\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Some("/nonexistent/cart-store.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cart-store.yaml"));
    }
}
