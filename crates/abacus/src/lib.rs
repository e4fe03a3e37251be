//! # Abacus
//!
//! A calculator HTTP API: add, subtract, multiply and divide two numbers.
//!
//! | Method | Path         | Response                                   |
//! |--------|--------------|--------------------------------------------|
//! | GET    | `/`          | `{"message", "version", "endpoints"}`      |
//! | GET    | `/health`    | `{"status": "healthy"}`                    |
//! | GET    | `/ready`     | readiness, 503 while shutting down         |
//! | POST   | `/calculate` | `{"result", "operation", "a", "b"}`        |
//!
//! Domain failures (division by zero, unknown operation) answer 400 with a
//! `detail` message. Malformed bodies answer 422.
//!
//! ## Example
//!
//! ```rust,no_run
//! use abacus::build_server;
//! use abacus_config::AbacusConfig;
//!
//! # async fn run() -> Result<(), abacus_server::ServerError> {
//! let server = build_server(&AbacusConfig::default());
//! server.run().await
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/abacus/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::{build_server, CALCULATE, HEALTH, SERVICE_INFO};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
