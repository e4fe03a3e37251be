//! Error types for Abacus.
//!
//! Two layers of errors live here:
//!
//! - [`EvalError`] - the two domain failures of the evaluator
//! - [`ApiError`] - everything the HTTP adapter can answer with, each variant
//!   carrying an [`ErrorCategory`] and a status code
//!
//! Error bodies follow the `{"detail": ...}` shape. `detail` is a plain message
//! for most errors and a list of [`FieldError`]s for request validation.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Domain failures raised by [`evaluate`](crate::evaluate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The divisor of a division was exactly zero.
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    /// The operation tag is not one of the supported operations.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// The tag as received.
        operation: String,
    },
}

impl EvalError {
    /// Creates an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Returns a short machine-readable label, used for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DivisionByZero => "division_by_zero",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
        }
    }
}

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Well-formed input the evaluator refused.
    InvalidInput,
    /// Request body failed shape or type validation.
    Validation,
    /// No route for the path.
    NotFound,
    /// Route exists but not for this method.
    MethodNotAllowed,
    /// Request body exceeded the configured limit.
    PayloadTooLarge,
    /// Body collection or handler execution timed out.
    Timeout,
    /// Unanticipated failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for the HTTP adapter.
///
/// # Example
///
/// ```
/// use abacus_core::{ApiError, EvalError};
/// use http::StatusCode;
///
/// let error = ApiError::from(EvalError::DivisionByZero);
/// assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(error.to_string(), "Division by zero is not allowed");
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// The evaluator rejected the input.
    #[error("{message}")]
    InvalidInput {
        /// Human-readable error message.
        message: String,
    },

    /// Request body validation failed.
    #[error("{errors}")]
    Validation {
        /// Field-level failures.
        errors: ValidationErrors,
    },

    /// No route matches the path.
    #[error("Not Found")]
    NotFound {
        /// The requested path.
        path: String,
    },

    /// The path exists but not for the requested method.
    #[error("Method Not Allowed")]
    MethodNotAllowed {
        /// Methods the path does accept.
        allowed: Vec<String>,
    },

    /// The request body exceeded the size limit.
    #[error("Request body exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Reading the request body timed out.
    #[error("Request body collection timed out")]
    RequestTimeout,

    /// The handler did not finish in time.
    #[error("Handler execution timed out")]
    HandlerTimeout,

    /// Unanticipated failure.
    #[error("Internal server error: {message}")]
    Internal {
        /// Wrapped cause.
        message: String,
    },
}

impl ApiError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a validation error from collected field errors.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::Validation { errors }
    }

    /// Creates a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a method not allowed error.
    pub fn method_not_allowed<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MethodNotAllowed {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::InvalidInput,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::PayloadTooLarge { .. } => ErrorCategory::PayloadTooLarge,
            Self::RequestTimeout | Self::HandlerTimeout => ErrorCategory::Timeout,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            _ => self.category().default_status_code(),
        }
    }

    /// Converts this error to a serializable `{"detail": ...}` body.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        let detail = match self {
            Self::Validation { errors } => ErrorDetail::Fields(errors.0.clone()),
            other => ErrorDetail::Message(other.to_string()),
        };
        ErrorBody { detail }
    }
}

impl From<EvalError> for ApiError {
    fn from(err: EvalError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

/// A single field validation failure.
///
/// `loc` is the path to the offending value, starting at `"body"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Machine-readable failure kind (e.g. `missing`, `number_type`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Location of the value.
    pub loc: Vec<String>,
    /// Human-readable message.
    pub msg: String,
}

impl FieldError {
    /// Creates a field error located at `body.<field>`.
    pub fn at_field(field: &str, kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
        }
    }

    /// Creates a field error located at the body itself.
    pub fn at_body(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            loc: vec!["body".to_string()],
            msg: msg.into(),
        }
    }

    /// Returns the name of the offending field, if the error is field-level.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.loc.get(1).map(String::as_str)
    }
}

/// An ordered collection of [`FieldError`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Creates a new empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error.
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Returns `true` if there are no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the errors as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "error" } else { "errors" };
        write!(f, "{} validation {noun}", self.0.len())?;
        for error in &self.0 {
            write!(f, "; {}: {}", error.loc.join("."), error.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Serializable error body for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error detail.
    pub detail: ErrorDetail,
}

/// Error detail within an [`ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// A human-readable message.
    Message(String),
    /// Field validation failures.
    Fields(Vec<FieldError>),
}

impl ErrorDetail {
    /// Returns the message, if this detail is a plain message.
    #[must_use]
    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Message(message) => Some(message),
            Self::Fields(_) => None,
        }
    }
}
