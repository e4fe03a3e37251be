//! Handler registration and dispatch.
//!
//! Handlers are typed async functions registered against an operation ID.
//! The registry erases their types: it parses the body through
//! [`FromBody`], awaits the handler, and serializes its response.
//!
//! # Example
//!
//! ```rust
//! use abacus_core::{evaluate, ApiError, CalculationRequest, CalculationResponse, RequestContext};
//! use abacus_server::HandlerRegistry;
//!
//! async fn calculate(
//!     _ctx: RequestContext,
//!     req: CalculationRequest,
//! ) -> Result<CalculationResponse, ApiError> {
//!     let result = evaluate(req.a, req.b, &req.operation)?;
//!     Ok(CalculationResponse::new(req, result))
//! }
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("calculate", calculate);
//! assert!(registry.contains("calculate"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use serde::Serialize;
use thiserror::Error;

use abacus_core::{ApiError, FromBody, RequestContext, ValidationErrors};

/// Type alias for boxed handler result.
pub type BoxedHandlerResult = Pin<Box<dyn Future<Output = Result<Bytes, HandlerError>> + Send>>;

/// A type-erased handler function.
pub type ErasedHandler = Arc<dyn Fn(RequestContext, Bytes) -> BoxedHandlerResult + Send + Sync>;

/// Errors that can occur while running a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The request body did not have the expected shape.
    #[error("request validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The handler returned an error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The handler's response could not be serialized.
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The handler panicked.
    #[error("handler panicked")]
    Panicked,
}

impl HandlerError {
    /// Converts this error into the [`ApiError`] sent to the client.
    ///
    /// Serialization failures and panics become a generic internal error;
    /// their details only go to the log.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Validation(errors) => ApiError::validation(errors),
            Self::Api(err) => err,
            Self::Serialization(_) => ApiError::internal("failed to serialize response"),
            Self::Panicked => ApiError::internal("handler panicked"),
        }
    }
}

/// Error returned when invoking a handler fails.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// No handler registered for the operation.
    #[error("no handler registered for operation: {0}")]
    HandlerNotFound(String),

    /// Handler execution failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl InvokeError {
    /// Converts this error into the [`ApiError`] sent to the client.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::HandlerNotFound(id) => {
                ApiError::internal(format!("no handler registered for operation: {id}"))
            }
            Self::Handler(err) => err.into_api_error(),
        }
    }
}

/// Registry for operation handlers.
///
/// ```rust
/// use abacus_server::HandlerRegistry;
///
/// let registry = HandlerRegistry::new();
/// assert!(registry.is_empty());
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ErasedHandler>,
}

impl HandlerRegistry {
    /// Creates a new empty handler registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for an operation that carries a request body.
    ///
    /// The body is parsed with `Req::from_body`; a parse failure never
    /// reaches the handler and is reported as [`HandlerError::Validation`].
    pub fn register<Req, Res, F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        Req: FromBody + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, ApiError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |ctx: RequestContext, body: Bytes| -> BoxedHandlerResult {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let request = Req::from_body(&body)?;
                let response = handler(ctx, request).await?;
                Ok::<_, HandlerError>(Bytes::from(serde_json::to_vec(&response)?))
            })
        });

        self.handlers.insert(operation_id.into(), erased);
    }

    /// Registers a handler that takes no request body.
    ///
    /// Any body sent with the request is ignored.
    pub fn register_no_body<Res, F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        Res: Serialize + Send + 'static,
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, ApiError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |ctx: RequestContext, _body: Bytes| -> BoxedHandlerResult {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let response = handler(ctx).await?;
                Ok::<_, HandlerError>(Bytes::from(serde_json::to_vec(&response)?))
            })
        });

        self.handlers.insert(operation_id.into(), erased);
    }

    /// Checks if a handler is registered for an operation.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invokes a handler for the given operation.
    ///
    /// A panic inside the handler is caught and returned as
    /// [`HandlerError::Panicked`].
    ///
    /// # Errors
    ///
    /// Returns an error if the handler is not found or execution fails.
    pub async fn invoke(
        &self,
        operation_id: &str,
        ctx: RequestContext,
        body: Bytes,
    ) -> Result<Bytes, InvokeError> {
        let handler = self
            .handlers
            .get(operation_id)
            .ok_or_else(|| InvokeError::HandlerNotFound(operation_id.to_string()))?;

        match AssertUnwindSafe(handler(ctx, body)).catch_unwind().await {
            Ok(result) => Ok(result?),
            Err(_) => Err(HandlerError::Panicked.into()),
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
