//! Root configuration type.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::schema::{ServerConfig, ServiceConfig, TelemetryConfig};
use crate::ConfigError;

/// Complete Abacus configuration.
///
/// # Example
///
/// ```
/// use abacus_config::AbacusConfig;
///
/// let config = AbacusConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8000");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AbacusConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Service identity.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AbacusConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.service.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("service.name", "must not be empty"));
        }

        if self.telemetry.metrics.enabled
            && self.telemetry.metrics.addr.parse::<SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// Replaces the host part of `server.http_addr`, keeping the port.
    pub fn set_host(&mut self, host: &str) {
        let port = self
            .server
            .http_addr
            .rsplit_once(':')
            .map_or("8000", |(_, port)| port)
            .to_string();
        self.server.http_addr = join_host_port(host, &port);
    }

    /// Replaces the port part of `server.http_addr`, keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .server
            .http_addr
            .rsplit_once(':')
            .map_or("0.0.0.0", |(host, _)| host)
            .to_string();
        self.server.http_addr = join_host_port(&host, &port.to_string());
    }
}

fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AbacusConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_http_addr() {
        let mut config = AbacusConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_request_timeout() {
        let mut config = AbacusConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_service_name() {
        let mut config = AbacusConfig::default();
        config.service.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metrics_addr_checked_only_when_enabled() {
        let mut config = AbacusConfig::default();
        config.telemetry.metrics.addr = "bogus".to_string();
        assert!(config.validate().is_ok());

        config.telemetry.metrics.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_host_and_port() {
        let mut config = AbacusConfig::default();
        config.set_port(9000);
        assert_eq!(config.server.http_addr, "0.0.0.0:9000");

        config.set_host("127.0.0.1");
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");

        config.set_host("::1");
        assert_eq!(config.server.http_addr, "[::1]:9000");
        assert!(config.validate().is_ok());

        config.set_port(8001);
        assert_eq!(config.server.http_addr, "[::1]:8001");
    }

    #[test]
    fn test_durations() {
        let config = AbacusConfig::default();
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
