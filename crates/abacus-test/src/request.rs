//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use http_body_util::Full;
use serde::Serialize;

use crate::error::TestError;

/// Builder for requests sent through a [`TestClient`](crate::TestClient).
///
/// Invalid headers or bodies do not panic while building; the first problem
/// is reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.record_error(TestError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.record_error(TestError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the request body as JSON and the matching Content-Type.
    ///
    /// ```rust
    /// use abacus_test::TestRequestBuilder;
    /// use http::Method;
    /// use serde_json::json;
    ///
    /// let request = TestRequestBuilder::new(Method::POST, "/calculate")
    ///     .json(&json!({"a": 5, "b": 3, "operation": "add"}))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(request.headers()["content-type"], "application/json");
    /// ```
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.record_error(TestError::Json(e)),
        }
        self.content_type("application/json")
    }

    /// Builds the HTTP request.
    ///
    /// # Errors
    ///
    /// Returns the first header or body error recorded while building, or
    /// an error for an unparsable URI.
    pub fn build(self) -> Result<Request<Full<Bytes>>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI: {e}")))?;

        let mut request = Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    fn record_error(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}
