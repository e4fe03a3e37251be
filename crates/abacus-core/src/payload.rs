//! Request and response payloads.
//!
//! Request bodies are turned into typed values through [`FromBody`], which
//! reports every shape problem at once as [`ValidationErrors`] instead of
//! stopping at the first one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationErrors};
use crate::operand::Operand;

/// Conversion from a raw request body.
pub trait FromBody: Sized {
    /// Parses and validates `body`.
    ///
    /// # Errors
    ///
    /// Returns all field-level failures found in the body.
    fn from_body(body: &[u8]) -> Result<Self, ValidationErrors>;
}

/// Body of `POST /calculate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Left operand.
    pub a: Operand,
    /// Right operand.
    pub b: Operand,
    /// Operation tag, validated later by the evaluator.
    pub operation: String,
}

impl CalculationRequest {
    /// Creates a request.
    pub fn new(a: impl Into<Operand>, b: impl Into<Operand>, operation: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            operation: operation.into(),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let a = number_field(object, "a", &mut errors);
        let b = number_field(object, "b", &mut errors);
        let operation = match object.get("operation") {
            None => {
                errors.push(FieldError::at_field("operation", "missing", "Field required"));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push(FieldError::at_field(
                    "operation",
                    "string_type",
                    "Input should be a valid string",
                ));
                None
            }
        };

        match (a, b, operation) {
            (Some(a), Some(b), Some(operation)) if errors.is_empty() => Ok(Self { a, b, operation }),
            _ => Err(errors),
        }
    }
}

fn number_field(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<Operand> {
    match object.get(field) {
        None => {
            errors.push(FieldError::at_field(field, "missing", "Field required"));
            None
        }
        Some(value) => {
            let operand = Operand::from_json(value);
            if operand.is_none() {
                errors.push(FieldError::at_field(
                    field,
                    "number_type",
                    "Input should be a valid number",
                ));
            }
            operand
        }
    }
}

/// Parses a body that must be a JSON document.
///
/// An empty or blank body is a missing body, not a decode failure.
///
/// # Errors
///
/// Returns one body-level `missing` or `json_invalid` error.
pub fn parse_json_body(body: &[u8]) -> Result<Value, ValidationErrors> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FieldError::at_body("missing", "Field required").into());
    }

    serde_json::from_slice(body)
        .map_err(|_| FieldError::at_body("json_invalid", "JSON decode error").into())
}

impl FromBody for CalculationRequest {
    fn from_body(body: &[u8]) -> Result<Self, ValidationErrors> {
        let value = parse_json_body(body)?;

        match &value {
            Value::Object(object) => Self::from_object(object),
            _ => Err(FieldError::at_body(
                "model_attributes_type",
                "Input should be a valid dictionary or object to extract fields from",
            )
            .into()),
        }
    }
}

/// Successful answer of `POST /calculate`.
///
/// The operands are echoed exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    /// The computed value.
    pub result: Operand,
    /// The operation tag.
    pub operation: String,
    /// Left operand.
    pub a: Operand,
    /// Right operand.
    pub b: Operand,
}

impl CalculationResponse {
    /// Pairs a result with the request that produced it.
    #[must_use]
    pub fn new(request: CalculationRequest, result: Operand) -> Self {
        Self {
            result,
            operation: request.operation,
            a: request.a,
            b: request.b,
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name.
    pub message: String,
    /// Service version.
    pub version: String,
    /// Documented endpoint paths.
    pub endpoints: Vec<String>,
}
