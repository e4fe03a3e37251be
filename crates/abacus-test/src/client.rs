//! Test client for in-memory HTTP testing.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;

use abacus_server::Server;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// A client that sends requests straight into a [`Server`]'s request
/// pipeline, without binding a port.
///
/// Requests go through everything a socket request would: probes, routing,
/// body limits, timeouts, handlers and response headers.
///
/// # Example
///
/// ```rust,ignore
/// use abacus_test::TestClient;
/// use serde_json::json;
///
/// let client = TestClient::new(app::build_server(&config));
///
/// let response = client
///     .post("/calculate")
///     .json(&json!({"a": 5, "b": 3, "operation": "add"}))
///     .send()
///     .await;
///
/// response.assert_json_field("result", &json!(8));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    server: Arc<Server>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a test client that owns `server`.
    pub fn new(server: Server) -> Self {
        Self::from_arc(Arc::new(server))
    }

    /// Creates a test client sharing an existing server.
    pub fn from_arc(server: Arc<Server>) -> Self {
        Self {
            server,
            default_headers: Vec::new(),
        }
    }

    /// Returns the server under test.
    #[must_use]
    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a request builder with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Shorthand for `POST uri` with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn post_json<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.post(uri).json(body).send().await
    }

    async fn send_internal(&self, builder: TestRequestBuilder) -> Result<TestResponse, TestError> {
        let request = builder.build()?;
        let response = self.server.handle(request).await;
        TestResponse::from_http(response).await
    }
}

/// A request builder bound to a test client.
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built. Use [`try_send`](Self::try_send)
    /// to get the error instead.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the response body
    /// cannot be read.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        self.client.send_internal(self.builder).await
    }
}
