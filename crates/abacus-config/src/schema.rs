//! Configuration schema types.
//!
//! Every section rejects unknown keys and fills missing keys with defaults.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// HTTP server section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (e.g. "0.0.0.0:8000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in milliseconds, applied to body collection and
    /// to handler execution separately.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Service identity reported by `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// One-line description.
    #[serde(default = "default_service_description")]
    pub description: String,

    /// Service version.
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            description: default_service_description(),
            version: default_service_version(),
        }
    }
}

fn default_service_name() -> String {
    "Calculator API".to_string()
}

fn default_service_description() -> String {
    "A simple calculator API with basic arithmetic operations".to_string()
}

fn default_service_version() -> String {
    "1.0.0".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(format!("expected 'json' or 'pretty', got '{s}'")),
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the telemetry crate's [`LogConfig`].
    ///
    /// [`LogConfig`]: abacus_telemetry::LogConfig
    #[must_use]
    pub fn to_log_config(&self) -> abacus_telemetry::LogConfig {
        let base = match self.format {
            LogFormat::Json => abacus_telemetry::LogConfig::production(),
            LogFormat::Pretty => abacus_telemetry::LogConfig::development(),
        };

        abacus_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            file_line_info: self.include_location,
            ..base
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

impl MetricsConfig {
    /// Converts this section into the telemetry crate's metrics config.
    #[must_use]
    pub fn to_metrics_config(&self) -> abacus_telemetry::MetricsConfig {
        abacus_telemetry::MetricsConfig {
            enabled: self.enabled,
            addr: self.addr.clone(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Telemetry section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}
