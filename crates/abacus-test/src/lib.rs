//! # Abacus Test
//!
//! In-memory HTTP testing for Abacus. Requests are fed directly into the
//! server's request pipeline, so no port is bound and no network is used.
//!
//! ## Example
//!
//! ```ignore
//! use abacus_test::TestClient;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_divide_by_zero() {
//!     let client = TestClient::new(build_server(&AbacusConfig::default()));
//!
//!     client
//!         .post_json("/calculate", &json!({"a": 10, "b": 0, "operation": "divide"}))
//!         .await
//!         .assert_status(StatusCode::BAD_REQUEST)
//!         .assert_json_field("detail", &json!("Division by zero is not allowed"));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/abacus-test/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
