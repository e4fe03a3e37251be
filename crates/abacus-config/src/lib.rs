//! # Abacus Config
//!
//! Typed configuration for the Abacus calculator API.
//!
//! Configuration is assembled in layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML or JSON file
//! 3. A `.env` file (optional)
//! 4. `ABACUS__SECTION__KEY` environment variables
//!
//! ## Example
//!
//! ```no_run
//! use abacus_config::ConfigLoader;
//!
//! # fn main() -> Result<(), abacus_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("abacus.toml")?
//!     .with_env_prefix("ABACUS")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example configuration
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8000"
//! request_timeout_ms = 30000
//!
//! [service]
//! name = "Calculator API"
//! version = "1.0.0"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```

#![doc(html_root_url = "https://docs.rs/abacus-config/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::AbacusConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    LogFormat, LoggingConfig, MetricsConfig, ServerConfig, ServiceConfig, TelemetryConfig,
};
