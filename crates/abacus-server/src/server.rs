//! HTTP server implementation.
//!
//! The server is built on Hyper and Tokio:
//!
//! - A TCP accept loop spawns one task per connection
//! - Each request is resolved by the [`Router`] and dispatched through the
//!   [`HandlerRegistry`]
//! - `/health` and `/ready` are answered before routing
//! - Shutdown stops accepting, marks the server not ready, then drains
//!
//! # Example
//!
//! ```rust,ignore
//! use abacus_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .http_addr("0.0.0.0:8000")
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use abacus_core::{ApiError, ErrorCategory, RequestContext, RequestId};
use abacus_telemetry::metrics;

use crate::config::{ServerConfig, ServerConfigBuilder};
use crate::handler::HandlerRegistry;
use crate::health::{HealthCheck, ReadinessCheck};
use crate::router::{normalize_path, RouteResolution, Router};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Header carrying the request ID, in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Path of the built-in liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Path of the built-in readiness probe.
pub const READY_PATH: &str = "/ready";

/// Metrics label for requests that matched no route.
const UNMATCHED_OPERATION: &str = "unmatched";

/// The Abacus HTTP server.
///
/// # Example
///
/// ```rust
/// use abacus_core::{ApiError, RequestContext};
/// use abacus_server::{HandlerRegistry, Server};
/// use http::Method;
///
/// async fn ping(_ctx: RequestContext) -> Result<&'static str, ApiError> {
///     Ok("pong")
/// }
///
/// let mut registry = HandlerRegistry::new();
/// registry.register_no_body("ping", ping);
///
/// let mut server = Server::builder()
///     .http_addr("127.0.0.1:8000")
///     .handlers(registry)
///     .build();
/// server.router_mut().add_route(Method::GET, "/ping", "ping");
///
/// assert!(server.router().has_operation("ping"));
/// ```
pub struct Server {
    config: ServerConfig,
    router: Router,
    handlers: HandlerRegistry,
    health: HealthCheck,
    readiness: ReadinessCheck,
}

impl Server {
    /// Creates a new server with the given configuration and no routes.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            handlers: HandlerRegistry::new(),
            health: HealthCheck::new(),
            readiness: ReadinessCheck::new(),
        }
    }

    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns a reference to the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns a mutable reference to the router.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Returns a reference to the handler registry.
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Returns a mutable reference to the handler registry.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Returns a reference to the readiness check.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.readiness
    }

    /// Returns a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the server until SIGTERM or SIGINT is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.run_with_listener(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then drains in-flight connections.
    ///
    /// Binding `127.0.0.1:0` beforehand gives an ephemeral port, which is
    /// what the integration tests do.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.serve_connection(stream, shutdown).await {
                                    tracing::debug!(%remote_addr, error = %e, "Connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        server.readiness.set_ready(false);

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout_secs = shutdown_timeout.as_secs_f64(),
            connections = tracker.active_connections(),
            "Waiting for connections to close"
        );

        tokio::select! {
            () = tracker.drained() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    connections = tracker.active_connections(),
                    "Shutdown timeout reached, abandoning connections"
                );
            }
        }

        tracing::info!(uptime_secs = server.health.uptime().as_secs(), "Server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                // Finish the in-flight request, then close.
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles a single HTTP request.
    ///
    /// This is the whole request pipeline short of the socket: request ID,
    /// probes, routing, body limits, timeouts, handler dispatch, logging and
    /// metrics. It never fails; every outcome is an HTTP response.
    pub async fn handle<B>(self: &Arc<Self>, req: Request<B>) -> HttpResponse
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let _in_flight = InFlight::start();

        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();
        let method = req.method().clone();
        let path = normalize_path(req.uri().path()).to_string();

        let (operation, mut response) = self.dispatch(req, &method, &path, request_id).await;

        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        let status = response.status().as_u16();
        let latency = started.elapsed();
        tracing::info!(
            %method,
            %path,
            status,
            %request_id,
            operation = %operation,
            latency_ms = latency.as_secs_f64() * 1000.0,
            "Request completed"
        );
        metrics::record_request(&operation, status, latency);

        response
    }

    async fn dispatch<B>(
        &self,
        req: Request<B>,
        method: &Method,
        path: &str,
        request_id: RequestId,
    ) -> (String, HttpResponse)
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if *method == Method::GET {
            match path {
                HEALTH_PATH => return ("health".to_string(), self.handle_health()),
                READY_PATH => return ("ready".to_string(), self.handle_ready()),
                _ => {}
            }
        }

        let route_match = match self.router.resolve(method, path) {
            RouteResolution::Matched(route_match) => route_match,
            RouteResolution::MethodNotAllowed(allowed) => {
                let error = ApiError::method_not_allowed(allowed.iter().map(Method::as_str));
                return (UNMATCHED_OPERATION.to_string(), error_response(&error));
            }
            RouteResolution::NotFound => {
                let error = ApiError::not_found(path);
                return (UNMATCHED_OPERATION.to_string(), error_response(&error));
            }
        };
        let operation_id = route_match.operation_id().to_string();

        let body = match self.collect_body(req).await {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(%request_id, operation_id = %operation_id, error = %error, "Rejected request body");
                return (operation_id, error_response(&error));
            }
        };

        let ctx = RequestContext::with_request_id(request_id).with_operation_id(&operation_id);
        let invocation = self.handlers.invoke(&operation_id, ctx, body);

        let response = match tokio::time::timeout(self.config.request_timeout(), invocation).await {
            Ok(Ok(bytes)) => json_response(StatusCode::OK, bytes),
            Ok(Err(e)) => {
                let cause = e.to_string();
                let error = e.into_api_error();
                if error.category() == ErrorCategory::Internal {
                    tracing::error!(%request_id, operation_id = %operation_id, error = %cause, "Handler failed");
                }
                error_response(&error)
            }
            Err(_) => {
                tracing::warn!(%request_id, operation_id = %operation_id, "Handler execution timed out");
                error_response(&ApiError::HandlerTimeout)
            }
        };

        (operation_id, response)
    }

    /// Collects the body under the size limit and the request timeout.
    async fn collect_body<B>(&self, req: Request<B>) -> Result<Bytes, ApiError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limit = self.config.max_body_bytes();
        let body = Limited::new(req.into_body(), limit);

        match tokio::time::timeout(self.config.request_timeout(), body.collect()).await {
            Ok(Ok(collected)) => Ok(collected.to_bytes()),
            Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
                Err(ApiError::PayloadTooLarge { limit })
            }
            Ok(Err(e)) => Err(ApiError::invalid_input(format!(
                "Failed to read request body: {e}"
            ))),
            Err(_) => Err(ApiError::RequestTimeout),
        }
    }

    fn handle_health(&self) -> HttpResponse {
        let body = serde_json::to_vec(&self.health.status())
            .unwrap_or_else(|_| br#"{"status":"healthy"}"#.to_vec());
        json_response(StatusCode::OK, Bytes::from(body))
    }

    fn handle_ready(&self) -> HttpResponse {
        let status = self.readiness.status();
        let code = if status.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        let body = serde_json::to_vec(&status)
            .unwrap_or_else(|_| format!(r#"{{"ready":{}}}"#, status.is_ready()).into_bytes());
        json_response(code, Bytes::from(body))
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

fn json_response(status: StatusCode, body: Bytes) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}

fn error_response(error: &ApiError) -> HttpResponse {
    let body = serde_json::to_vec(&error.to_body())
        .unwrap_or_else(|_| br#"{"detail":"Internal server error"}"#.to_vec());
    let mut response = json_response(error.status_code(), Bytes::from(body));

    if let ApiError::MethodNotAllowed { allowed } = error {
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            response.headers_mut().insert(ALLOW, value);
        }
    }

    response
}

/// Keeps the in-flight gauge balanced even if the request future is dropped.
struct InFlight;

impl InFlight {
    fn start() -> Self {
        metrics::increment_in_flight();
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::decrement_in_flight();
    }
}

/// Builder for configuring and creating a [`Server`].
///
/// ```rust
/// use abacus_server::Server;
/// use std::time::Duration;
///
/// let server = Server::builder()
///     .http_addr("0.0.0.0:9000")
///     .shutdown_timeout(Duration::from_secs(10))
///     .request_timeout(Duration::from_secs(5))
///     .max_body_bytes(64 * 1024)
///     .build();
///
/// assert_eq!(server.config().max_body_bytes(), 65_536);
/// ```
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config_builder: ServerConfigBuilder,
    handlers: Option<HandlerRegistry>,
    readiness: ReadinessCheck,
}

impl ServerBuilder {
    /// Creates a new server builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler registry.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.http_addr(addr);
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.shutdown_timeout(timeout);
        self
    }

    /// Sets the request timeout, applied to body collection and to handler
    /// execution separately.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.request_timeout(timeout);
        self
    }

    /// Sets the request body limit in bytes.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config_builder = self.config_builder.max_body_bytes(limit);
        self
    }

    /// Adds a named readiness check reported by `/ready`.
    #[must_use]
    pub fn readiness_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.readiness = self.readiness.add_check(name, check);
        self
    }

    /// Builds the server with the configured settings.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config_builder.build(),
            router: Router::new(),
            handlers: self.handlers.unwrap_or_default(),
            health: HealthCheck::new(),
            readiness: self.readiness,
        }
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
        /// Parse failure.
        source: AddrParseError,
    },

    /// Failed to bind to the configured address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// Underlying error.
        source: std::io::Error,
    },

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use abacus_core::{parse_json_body, FieldError, FromBody, ValidationErrors};
    use http_body_util::StreamBody;
    use hyper::body::Frame;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize)]
    struct EchoRequest {
        message: String,
    }

    impl FromBody for EchoRequest {
        fn from_body(body: &[u8]) -> Result<Self, ValidationErrors> {
            serde_json::from_value(parse_json_body(body)?).map_err(|_| {
                FieldError::at_field("message", "string_type", "Input should be a valid string")
                    .into()
            })
        }
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct EchoResponse {
        echo: String,
    }

    async fn echo_handler(
        _ctx: RequestContext,
        req: EchoRequest,
    ) -> Result<EchoResponse, ApiError> {
        Ok(EchoResponse {
            echo: format!("Echo: {}", req.message),
        })
    }

    async fn slow_handler(_ctx: RequestContext) -> Result<EchoResponse, ApiError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(EchoResponse {
            echo: "late".to_string(),
        })
    }

    async fn panicking_handler(_ctx: RequestContext) -> Result<EchoResponse, ApiError> {
        panic!("handler blew up");
    }

    fn test_server() -> Arc<Server> {
        let mut registry = HandlerRegistry::new();
        registry.register("echo", echo_handler);
        registry.register_no_body("slow", slow_handler);
        registry.register_no_body("explode", panicking_handler);

        let mut server = Server::builder()
            .http_addr("127.0.0.1:0")
            .request_timeout(Duration::from_millis(100))
            .max_body_bytes(64)
            .handlers(registry)
            .build();

        let router = server.router_mut();
        router.add_route(Method::POST, "/echo", "echo");
        router.add_route(Method::GET, "/slow", "slow");
        router.add_route(Method::GET, "/explode", "explode");
        router.add_route(Method::GET, "/orphan", "orphan");

        Arc::new(server)
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_server_builder() {
        let server = Server::builder()
            .http_addr("0.0.0.0:9090")
            .shutdown_timeout(Duration::from_secs(60))
            .build();

        assert_eq!(server.config().http_addr(), "0.0.0.0:9090");
        assert_eq!(server.config().shutdown_timeout(), Duration::from_secs(60));
        assert!(server.handlers().is_empty());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = test_server();
        let response = server.handle(request(Method::GET, "/health", "")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_json(response).await, serde_json::json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_health_endpoint_trailing_slash() {
        let server = test_server();
        let response = server.handle(request(Method::GET, "/health/", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let server = test_server();

        let response = server.handle(request(Method::GET, "/ready", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ready"], true);

        server.readiness().set_ready(false);
        let response = server.handle(request(Method::GET, "/ready", "")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_ready_endpoint_failing_check() {
        let server = Arc::new(Server::builder().readiness_check("never", || false).build());

        let response = server.handle(request(Method::GET, "/ready", "")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["checks"]["never"], false);
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = test_server();
        let response = server.handle(request(Method::GET, "/nonexistent", "")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, serde_json::json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let server = test_server();
        let response = server.handle(request(Method::GET, "/echo", "")).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": "Method Not Allowed"})
        );
    }

    #[tokio::test]
    async fn test_handler_invocation() {
        let server = test_server();
        let response = server
            .handle(request(Method::POST, "/echo", r#"{"message":"Hello"}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["echo"], "Echo: Hello");
    }

    #[tokio::test]
    async fn test_validation_error() {
        let server = test_server();
        let response = server.handle(request(Method::POST, "/echo", "not json")).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["detail"][0]["type"], "json_invalid");
    }

    #[tokio::test]
    async fn test_empty_body_is_missing() {
        let server = test_server();
        let response = server.handle(request(Method::POST, "/echo", "")).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["detail"][0]["type"], "missing");
        assert_eq!(body["detail"][0]["loc"], serde_json::json!(["body"]));
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let server = test_server();
        let big = format!(r#"{{"message":"{}"}}"#, "x".repeat(100));
        let response = server.handle(request(Method::POST, "/echo", &big)).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Request body exceeds the limit of 64 bytes");
    }

    #[tokio::test]
    async fn test_body_collection_timeout() {
        let server = test_server();
        let stalled = StreamBody::new(futures_util::stream::pending::<
            Result<Frame<Bytes>, Infallible>,
        >());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(stalled)
            .unwrap();

        let response = server.handle(req).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_handler_timeout() {
        let server = test_server();
        let response = server.handle(request(Method::GET, "/slow", "")).await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await["detail"],
            "Handler execution timed out"
        );
    }

    #[tokio::test]
    async fn test_handler_panic_is_internal_error() {
        let server = test_server();
        let response = server.handle(request(Method::GET, "/explode", "")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": "Internal server error: handler panicked"})
        );
    }

    #[tokio::test]
    async fn test_route_without_handler() {
        let server = test_server();
        let response = server.handle(request(Method::GET, "/orphan", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_request_id_echoed_when_valid() {
        let server = test_server();
        let id = "0190b5d4-7d6c-7b6e-8a4f-3c2d1e0f9a8b";
        let req = Request::builder()
            .uri("/health")
            .header(REQUEST_ID_HEADER, id)
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = server.handle(req).await;
        assert_eq!(response.headers()[REQUEST_ID_HEADER], id);
    }

    #[tokio::test]
    async fn test_request_id_replaced_when_invalid() {
        let server = test_server();
        let req = Request::builder()
            .uri("/health")
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = server.handle(req).await;
        let value = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert_ne!(value, "not-a-uuid");
        assert!(RequestId::parse(value).is_some());
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let server = Server::builder().http_addr("not-a-valid-address").build();

        let result = server.run_with_shutdown(ShutdownSignal::new()).await;
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let server = Server::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result =
            tokio::time::timeout(Duration::from_secs(5), server.run_with_shutdown(shutdown)).await;

        assert!(matches!(result, Ok(Ok(()))));
    }
}
