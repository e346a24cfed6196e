use std::fs::read_to_string;
use std::path::Path;
use std::sync::{LazyLock, PoisonError, RwLock};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Process wide configuration, read by conversions and by the access logging in
/// [`InstanceExt`](crate::instance::InstanceExt)
pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct Configuration {
    /// Absolute tolerance used when a coefficient is narrowed during a function conversion
    #[builder(default = "1e-9")]
    pub conversion_tolerance: f64,
    /// Emit a debug event whenever an access fails because it isn't supported
    #[builder(default = "true")]
    pub log_unsupported_access: bool,
    /// Filter directive used by [`Configuration::init_logging`] when `RUST_LOG` isn't set
    #[builder(default = "String::from(\"info\")")]
    pub log_level: String,
    /// Output format used by [`Configuration::init_logging`]
    #[builder(default = "LogFormat::Pretty")]
    pub log_format: LogFormat,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            conversion_tolerance: 1e-9,
            log_unsupported_access: true,
            log_level: String::from("info"),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Enum used to specify how log events are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

impl ConfigurationBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(tolerance) = self.conversion_tolerance {
            if !tolerance.is_finite() || tolerance < 0. {
                return Err(format!(
                    "conversion_tolerance must be finite and non-negative, got {}",
                    tolerance
                ));
            }
        }
        Ok(())
    }
}

impl Configuration {
    /// Read a configuration from a JSON string, missing fields take their default values
    ///
    /// # Examples
    /// ```rust
    /// use moirs_core::configuration::{Configuration, LogFormat};
    /// let config = Configuration::from_json_str(r#"{"log_format": "json"}"#).unwrap();
    /// assert_eq!(config.log_format, LogFormat::Json);
    /// assert_eq!(config.conversion_tolerance, 1e-9);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Configuration, ConfigurationError> {
        let config: Configuration = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Read a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Configuration, ConfigurationError> {
        let contents = read_to_string(path)
            .map_err(|err| ConfigurationError::UnableToRead(err.to_string()))?;
        Self::from_json_str(&contents)
    }

    fn check(&self) -> Result<(), ConfigurationError> {
        if !self.conversion_tolerance.is_finite() || self.conversion_tolerance < 0. {
            return Err(ConfigurationError::InvalidTolerance(
                self.conversion_tolerance,
            ));
        }
        Ok(())
    }

    /// Install a global tracing subscriber using `log_level` and `log_format`
    ///
    /// The `RUST_LOG` environment variable takes priority over `log_level`. Returns false if a
    /// global subscriber was already installed, in which case nothing changes.
    pub fn init_logging(&self) -> bool {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        match self.log_format {
            LogFormat::Json => fmt().json().with_env_filter(filter).try_init().is_ok(),
            LogFormat::Pretty => fmt().with_env_filter(filter).try_init().is_ok(),
        }
    }
}

/// Get a copy of the current global configuration
///
/// A poisoned lock still holds a complete configuration, so it is read anyway.
pub fn current_configuration() -> Configuration {
    CONFIGURATION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the global configuration
pub fn set_configuration(config: Configuration) {
    let mut guard = CONFIGURATION
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = config;
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Unable to read configuration file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse configuration json")]
    UnableToParse(#[from] serde_json::Error),
    #[error("conversion_tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let built = ConfigurationBuilder::default().build().unwrap();
        assert_eq!(built, Configuration::default());
    }

    #[test]
    fn builder_rejects_negative_tolerance() {
        let res = ConfigurationBuilder::default()
            .conversion_tolerance(-1.)
            .build();
        assert!(res.is_err());
        let res = ConfigurationBuilder::default()
            .conversion_tolerance(f64::NAN)
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn json_partial_and_invalid() {
        let config =
            Configuration::from_json_str(r#"{"log_unsupported_access": false}"#).unwrap();
        assert!(!config.log_unsupported_access);
        assert_eq!(config.log_level, "info");

        assert!(matches!(
            Configuration::from_json_str(r#"{"conversion_tolerance": -0.5}"#),
            Err(ConfigurationError::InvalidTolerance(_))
        ));
        assert!(matches!(
            Configuration::from_json_str("not json"),
            Err(ConfigurationError::UnableToParse(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Configuration::from_json_file("this/file/does/not/exist.json"),
            Err(ConfigurationError::UnableToRead(_))
        ));
    }

    #[test]
    fn logging_installs_once() {
        let config = ConfigurationBuilder::default()
            .log_format(LogFormat::Json)
            .build()
            .unwrap();
        config.init_logging();
        assert!(!config.init_logging());
    }

    #[test]
    fn log_format_names() {
        let config = Configuration::from_json_str(r#"{"log_format": "json"}"#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(Configuration::from_json_str(r#"{"log_format": "xml"}"#).is_err());
    }

    #[test]
    fn global_configuration_is_replaceable() {
        // Only touches log_level, which nothing else reads during tests
        let mut config = current_configuration();
        config.log_level = String::from("debug");
        set_configuration(config.clone());
        assert_eq!(current_configuration().log_level, "debug");
    }
}
