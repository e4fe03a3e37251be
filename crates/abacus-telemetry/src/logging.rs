//! Structured logging.
//!
//! Installs a global `tracing` subscriber that writes either JSON lines
//! (production) or human-readable multi-line output (development).
//!
//! # Example
//!
//! ```rust,ignore
//! use abacus_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production().with_level("abacus=debug,info"))?;
//!
//! tracing::info!(request_id = %id, status = 200, "Request completed");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g. "info", "abacus_server=debug,warn").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to log span open/close events.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
        }
    }

    /// Replaces the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Switches between JSON and pretty output.
    #[must_use]
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }
}

/// Installs the global logging subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a
/// global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::debug!(level = %config.level, json = config.json_format, "Logging initialized");
    Ok(())
}

/// Builds an [`EnvFilter`], preferring `RUST_LOG` over `directive`.
///
/// An empty or unparseable `RUST_LOG` is ignored.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if `directive` does not parse.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    select_env_filter(env.as_deref(), directive)
}

fn select_env_filter(env: Option<&str>, directive: &str) -> TelemetryResult<EnvFilter> {
    let configured = EnvFilter::try_new(directive)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level '{directive}': {e}")))?;

    Ok(env
        .map(str::trim)
        .filter(|env| !env.is_empty())
        .and_then(|env| EnvFilter::try_new(env).ok())
        .unwrap_or(configured))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_default_is_production() {
        assert_eq!(LogConfig::default(), LogConfig::production());
        assert!(LogConfig::default().json_format);
    }

    #[test]
    fn test_development_preset() {
        let config = LogConfig::development();
        assert_eq!(config.level, "debug");
        assert!(!config.json_format);
        assert!(config.file_line_info);
    }

    #[test]
    fn test_builder_overrides() {
        let config = LogConfig::production()
            .with_level("warn")
            .with_json_format(false);
        assert_eq!(config.level, "warn");
        assert!(!config.json_format);
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("abacus_server=debug,warn").is_ok());
        assert!(create_env_filter("abacus=notalevel").is_err());
    }

    #[test]
    fn test_env_overrides_directive() {
        let filter = select_env_filter(Some("trace"), "warn").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_unusable_env_falls_back_to_directive() {
        for env in [None, Some(""), Some("  "), Some("abacus=loud")] {
            let filter = select_env_filter(env, "warn").unwrap();
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN), "{env:?}");
        }
    }

    #[test]
    fn test_directive_checked_even_with_env() {
        assert!(select_env_filter(Some("debug"), "abacus=loud").is_err());
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::production()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LogConfig::production().with_level("abacus=loud");
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::LoggingInit(_))
        ));
    }
}
