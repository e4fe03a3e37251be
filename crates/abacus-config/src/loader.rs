//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{AbacusConfig, ConfigError, LogFormat};

/// Layered configuration loader.
///
/// # Example
///
/// ```
/// use abacus_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"", "toml")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: AbacusConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the configuration to the built-in defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AbacusConfig::default();
        self
    }

    /// Loads a TOML or JSON file, chosen by extension.
    ///
    /// Keys absent from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension, or fails to parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;

        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in the given format ("toml" or "json").
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Loads a `.env` file from the working directory into the process
    /// environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!("invalid .env file: {e}"))),
        }
    }

    /// Sets the environment variable prefix applied by [`load`](Self::load).
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `ABACUS__SERVER__HTTP_ADDR=127.0.0.1:9000` or
    /// `ABACUS__TELEMETRY__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies overrides from an explicit set of variables.
    ///
    /// Only keys starting with `PREFIX__` are considered. Unknown keys under
    /// the prefix are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParseError` for a value of the wrong type.
    pub fn with_env_vars<I, K, V>(mut self, prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = prefix.to_uppercase();
        for (key, value) in vars {
            let key = key.as_ref();
            if key.starts_with(&format!("{prefix}__")) {
                self.apply_env_var(key, value.as_ref(), &prefix)?;
            }
        }
        Ok(self)
    }

    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override fails to parse or the final
    /// configuration is invalid.
    pub fn load(mut self) -> Result<AbacusConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self = self.with_env_vars(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without applying environment overrides or
    /// validating.
    #[must_use]
    pub fn load_unvalidated(self) -> AbacusConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<AbacusConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["SERVICE", "NAME"] => config.service.name = value.to_string(),
            ["SERVICE", "DESCRIPTION"] => config.service.description = value.to_string(),
            ["SERVICE", "VERSION"] => config.service.version = value.to_string(),

            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_bool_var(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = value
                    .parse::<LogFormat>()
                    .map_err(|reason| ConfigError::env_parse_error(key, reason))?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                config.telemetry.logging.include_location = parse_bool_var(key, value)?;
            }

            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_bool_var(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => {
                config.telemetry.metrics.addr = value.to_string();
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
