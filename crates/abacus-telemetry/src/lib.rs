//! Observability for Abacus.
//!
//! - **Logging**: structured JSON or pretty logs via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `abacus_requests_total` | Counter | `operation`, `status` | Total request count |
//! | `abacus_request_duration_seconds` | Histogram | `operation` | Request latency |
//! | `abacus_in_flight_requests` | Gauge | - | Currently processing requests |
//! | `abacus_evaluations_total` | Counter | `operation`, `outcome` | Evaluator outcomes |
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.
//!
//! # Example
//!
//! ```rust,ignore
//! use abacus_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(operation = "calculate", "Processing request");
//! ```

#![doc(html_root_url = "https://docs.rs/abacus-telemetry/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
