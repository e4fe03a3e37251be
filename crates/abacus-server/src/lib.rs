//! # Abacus Server
//!
//! HTTP server for the Abacus calculator API.
//!
//! - HTTP/1.1 via Hyper on Tokio
//! - Method and path routing to operation IDs
//! - Typed handlers with body validation, timeouts and panic isolation
//! - `/health` and `/ready` probes
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! ## Example
//!
//! ```rust,ignore
//! use abacus_server::{HandlerRegistry, Server};
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = HandlerRegistry::new();
//!     registry.register("calculate", calculate);
//!
//!     let mut server = Server::builder()
//!         .http_addr("0.0.0.0:8000")
//!         .handlers(registry)
//!         .build();
//!     server.router_mut().add_route(Method::POST, "/calculate", "calculate");
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/abacus-server/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod handler;
mod health;
mod router;
mod server;
mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use handler::{BoxedHandlerResult, ErasedHandler, HandlerError, HandlerRegistry, InvokeError};
pub use health::{HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus};
pub use router::{normalize_path, RouteMatch, RouteResolution, Router};
pub use server::{
    HttpResponse, ResponseBody, Server, ServerBuilder, ServerError, HEALTH_PATH, READY_PATH,
    REQUEST_ID_HEADER,
};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
