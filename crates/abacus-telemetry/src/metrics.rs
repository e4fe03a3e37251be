//! Prometheus metrics.
//!
//! # Example
//!
//! ```rust,ignore
//! use abacus_telemetry::metrics::{init_metrics, record_request, MetricsConfig};
//!
//! init_metrics(&MetricsConfig { enabled: true, addr: "0.0.0.0:9090".into() })?;
//! record_request("calculate", 200, Duration::from_millis(2));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus exporter.
    pub enabled: bool,

    /// Address the exporter listens on (e.g. "0.0.0.0:9090").
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Does nothing when `config.enabled` is false. Must be called from within a
/// Tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the exporter cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    describe_metrics();
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!("abacus_requests_total", "Total number of HTTP requests processed");
    describe_histogram!(
        "abacus_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "abacus_in_flight_requests",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        "abacus_evaluations_total",
        "Evaluator invocations by operation and outcome"
    );
}

/// Records a completed request.
pub fn record_request(operation: &str, status_code: u16, duration: Duration) {
    counter!(
        "abacus_requests_total",
        "operation" => operation.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "abacus_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records one evaluator outcome (`ok`, `division_by_zero`, ...).
pub fn record_evaluation(operation: &str, outcome: &'static str) {
    counter!(
        "abacus_evaluations_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Increments the in-flight requests gauge.
pub fn increment_in_flight() {
    gauge!("abacus_in_flight_requests").increment(1.0);
}

/// Decrements the in-flight requests gauge.
pub fn decrement_in_flight() {
    gauge!("abacus_in_flight_requests").decrement(1.0);
}
