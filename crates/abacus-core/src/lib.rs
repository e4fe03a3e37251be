//! # Abacus Core
//!
//! Core types for the Abacus calculator API.
//!
//! This crate holds everything that does not depend on the transport:
//!
//! - [`evaluate`] - The pure arithmetic evaluator
//! - [`Operand`] / [`Operation`] - Numeric operands and the closed operation set
//! - [`CalculationRequest`] / [`CalculationResponse`] - Wire payloads
//! - [`ApiError`] / [`EvalError`] - Error types and their HTTP status mapping
//! - [`RequestContext`] - Per-request metadata
//!
//! ## Example
//!
//! ```
//! use abacus_core::{evaluate, EvalError, Operand};
//!
//! let sum = evaluate(Operand::Int(5), Operand::Int(3), "add").unwrap();
//! assert_eq!(sum, Operand::Int(8));
//!
//! let err = evaluate(Operand::Int(5), Operand::Int(0), "divide").unwrap_err();
//! assert_eq!(err, EvalError::DivisionByZero);
//! ```

#![doc(html_root_url = "https://docs.rs/abacus-core/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod evaluator;
mod operand;
pub mod payload;

pub use context::{RequestContext, RequestId};
pub use error::{
    ApiError, ApiResult, ErrorBody, ErrorCategory, ErrorDetail, EvalError, FieldError,
    ValidationErrors,
};
pub use evaluator::{evaluate, Operation};
pub use operand::Operand;
pub use payload::{
    parse_json_body, CalculationRequest, CalculationResponse, FromBody, ServiceInfo,
};
