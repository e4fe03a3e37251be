//! Errors raised while assembling an [`AbacusConfig`](crate::AbacusConfig).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A configuration layer failed to load, or the merged result is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--config` or `with_file` named a file that does not exist.
    #[error("config file {} does not exist", path.display())]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {}", path.display())]
    ReadError {
        /// Requested path.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: io::Error,
    },

    /// A TOML layer is malformed or has unknown keys.
    #[error("malformed TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A JSON layer is malformed or has unknown keys.
    #[error("malformed JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A value parsed but failed [`validate`](crate::AbacusConfig::validate).
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted key, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An `ABACUS__*` variable could not be applied.
    #[error("environment variable {var}: {reason}")]
    EnvParseError {
        /// Full variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Any other layer problem, such as an unknown file extension.
    #[error("config rejected: {0}")]
    ValidationError(String),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Returns the dotted key or variable name the error is about, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            Self::EnvParseError { var, .. } => Some(var),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_path() {
        let err = ConfigError::file_not_found("/etc/abacus/abacus.toml");
        assert_eq!(err.to_string(), "config file /etc/abacus/abacus.toml does not exist");
        assert_eq!(err.key(), None);
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = ConfigError::invalid_value("server.http_addr", "invalid socket address: nope");
        assert_eq!(err.to_string(), "server.http_addr: invalid socket address: nope");
        assert_eq!(err.key(), Some("server.http_addr"));
    }

    #[test]
    fn test_env_error_names_variable() {
        let err = ConfigError::env_parse_error("ABACUS__SERVER__MAX_BODY_BYTES", "expected integer");
        assert_eq!(err.key(), Some("ABACUS__SERVER__MAX_BODY_BYTES"));
        assert!(err.to_string().ends_with("expected integer"));
    }

    #[test]
    fn test_read_error_keeps_cause() {
        let cause = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read_error("/root/abacus.toml", cause);
        assert!(std::error::Error::source(&err).is_some());
    }
}
