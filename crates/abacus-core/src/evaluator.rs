//! The arithmetic evaluator.
//!
//! [`evaluate`] is the whole computational surface of the service: a pure,
//! stateless function of two operands and an operation tag. It is safe to
//! call from any number of tasks at once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::operand::Operand;

/// The closed set of supported operations.
///
/// Tags are exact and case-sensitive.
///
/// # Example
///
/// ```
/// use abacus_core::Operation;
///
/// let op: Operation = "multiply".parse().unwrap();
/// assert_eq!(op, Operation::Multiply);
/// assert!("Multiply".parse::<Operation>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`, floating-point, rejecting a zero divisor
    Divide,
}

impl Operation {
    /// Every supported operation, in declaration order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    /// Returns the wire tag of this operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    /// Applies this operation to two operands.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::DivisionByZero`] when dividing by exactly zero.
    pub fn apply(self, a: Operand, b: Operand) -> Result<Operand, EvalError> {
        match self {
            Self::Add => Ok(a + b),
            Self::Subtract => Ok(a - b),
            Self::Multiply => Ok(a * b),
            Self::Divide if b.is_zero() => Err(EvalError::DivisionByZero),
            Self::Divide => Ok(a / b),
        }
    }
}

impl FromStr for Operation {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| EvalError::unsupported(s))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluates `a <op> b`.
///
/// The zero check on the divisor is exact equality, so a tiny non-zero
/// divisor such as `1e-300` divides normally.
///
/// # Errors
///
/// - [`EvalError::UnsupportedOperation`] if `op` is not a supported tag
/// - [`EvalError::DivisionByZero`] if `op` is `divide` and `b` is zero
///
/// # Example
///
/// ```
/// use abacus_core::{evaluate, Operand};
///
/// assert_eq!(evaluate(Operand::Int(100), Operand::Int(4), "divide"), Ok(Operand::Float(25.0)));
/// assert_eq!(
///     evaluate(Operand::Int(5), Operand::Int(3), "power").unwrap_err().to_string(),
///     "Unsupported operation: power"
/// );
/// ```
pub fn evaluate(a: Operand, b: Operand, op: &str) -> Result<Operand, EvalError> {
    op.parse::<Operation>()?.apply(a, b)
}
