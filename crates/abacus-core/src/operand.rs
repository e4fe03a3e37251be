//! Numeric operands.
//!
//! An [`Operand`] keeps track of whether a value arrived as a JSON integer or
//! as a floating-point number, so that integral arithmetic stays integral on
//! the wire (`5 + 3` answers `8`, not `8.0`).
//!
//! # Arithmetic rules
//!
//! | lhs | rhs | `+ - *` | `/` |
//! |-----|-----|---------|-----|
//! | `Int` | `Int` | `Int`, or `Float` on overflow | `Float` |
//! | `Int` | `Float` | `Float` | `Float` |
//! | `Float` | any | `Float` | `Float` |
//!
//! Division here is raw IEEE-754 division. The zero-divisor guard lives in
//! [`evaluate`](crate::evaluate).

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A numeric value, either an integer or a floating-point number.
///
/// # Example
///
/// ```
/// use abacus_core::Operand;
///
/// assert_eq!(Operand::Int(2) * Operand::Int(21), Operand::Int(42));
/// assert_eq!(Operand::Int(1) + Operand::Float(0.5), Operand::Float(1.5));
/// assert_eq!(Operand::Int(100) / Operand::Int(4), Operand::Float(25.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit IEEE-754 float.
    Float(f64),
}

impl Operand {
    /// Returns the value as an `f64`.
    ///
    /// Integers beyond 2^53 lose precision.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// Returns `true` if the value is exactly zero.
    ///
    /// `-0.0` compares equal to zero and counts as zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(v) => v == 0,
            Self::Float(v) => v == 0.0,
        }
    }

    /// Returns `true` if the value is an integer.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Returns `true` unless the value is infinite or NaN.
    #[must_use]
    pub fn is_finite(self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(v) => v.is_finite(),
        }
    }

    /// Converts a JSON value into an operand.
    ///
    /// Numbers convert directly. Booleans become `1` and `0`, and numeric
    /// strings are parsed after trimming whitespace. Returns `None` for
    /// `null`, arrays, objects and strings that do not hold a number.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float)),
            serde_json::Value::Bool(b) => Some(Self::Int(i64::from(*b))),
            serde_json::Value::String(s) => Self::parse_lax(s.trim()),
            _ => None,
        }
    }

    fn parse_lax(s: &str) -> Option<Self> {
        if let Ok(v) = s.parse::<i64>() {
            return Some(Self::Int(v));
        }

        // "5.00" is an integer written with a zero fraction.
        if let Some((whole, fraction)) = s.split_once('.') {
            if !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') {
                if let Ok(v) = whole.parse::<i64>() {
                    return Some(Self::Int(v));
                }
            }
        }

        s.parse::<f64>().ok().map(Self::Float)
    }

    fn integral(
        self,
        rhs: Self,
        checked: fn(i64, i64) -> Option<i64>,
        float: fn(f64, f64) -> f64,
    ) -> Self {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => checked(a, b)
                .map_or_else(|| Self::Float(float(a as f64, b as f64)), Self::Int),
            (a, b) => Self::Float(float(a.as_f64(), b.as_f64())),
        }
    }
}

impl Add for Operand {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.integral(rhs, i64::checked_add, |a, b| a + b)
    }
}

impl Sub for Operand {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.integral(rhs, i64::checked_sub, |a, b| a - b)
    }
}

impl Mul for Operand {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.integral(rhs, i64::checked_mul, |a, b| a * b)
    }
}

impl Div for Operand {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::Float(self.as_f64() / rhs.as_f64())
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Int(v) => serializer.serialize_i64(v),
            Self::Float(v) => serializer.serialize_f64(v),
        }
    }
}

impl<'de> Deserialize<'de> for Operand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OperandVisitor;

        impl Visitor<'_> for OperandVisitor {
            type Value = Operand;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Operand, E> {
                Ok(Operand::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Operand, E> {
                Ok(i64::try_from(v).map_or(Operand::Float(v as f64), Operand::Int))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Operand, E> {
                Ok(Operand::Float(v))
            }
        }

        deserializer.deserialize_any(OperandVisitor)
    }
}
