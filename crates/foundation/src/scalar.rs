//! Tagged scalar values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// A single numeric datum tagged with its value type.
///
/// Scalars are copied by value; they are never pinned by the execution
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "value_type", content = "value", rename_all = "UPPERCASE")]
pub enum ScalarValue {
    Fp64(f64),
    Fp32(f32),
    Int64(i64),
    Int32(i32),
    Boolean(bool),
}

impl ScalarValue {
    /// Build a scalar of the declared value type from an `f64`.
    ///
    /// Integer kinds truncate toward zero (saturating at the type bounds,
    /// NaN becomes `0`); booleans are `value != 0`.
    pub fn from_f64(value_type: ValueType, value: f64) -> Self {
        match value_type {
            ValueType::Fp64 => ScalarValue::Fp64(value),
            ValueType::Fp32 => ScalarValue::Fp32(value as f32),
            ValueType::Int64 => ScalarValue::Int64(value as i64),
            ValueType::Int32 => ScalarValue::Int32(value as i32),
            ValueType::Boolean => ScalarValue::Boolean(value != 0.0),
        }
    }

    /// Parse literal text as a scalar of the given value type.
    ///
    /// Booleans accept `true`/`false` (any case) and numeric text. Returns
    /// `None` if the text is not a valid literal for the type.
    pub fn parse_literal(value_type: ValueType, text: &str) -> Option<Self> {
        let text = text.trim();
        match value_type {
            ValueType::Fp64 => text.parse().ok().map(ScalarValue::Fp64),
            ValueType::Fp32 => text.parse().ok().map(ScalarValue::Fp32),
            ValueType::Int64 => text.parse().ok().map(ScalarValue::Int64),
            ValueType::Int32 => text.parse().ok().map(ScalarValue::Int32),
            ValueType::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Some(ScalarValue::Boolean(true)),
                "false" => Some(ScalarValue::Boolean(false)),
                other => other
                    .parse::<f64>()
                    .ok()
                    .map(|v| ScalarValue::Boolean(v != 0.0)),
            },
        }
    }

    /// The value type tag of this scalar.
    pub fn value_type(&self) -> ValueType {
        match self {
            ScalarValue::Fp64(_) => ValueType::Fp64,
            ScalarValue::Fp32(_) => ValueType::Fp32,
            ScalarValue::Int64(_) => ValueType::Int64,
            ScalarValue::Int32(_) => ValueType::Int32,
            ScalarValue::Boolean(_) => ValueType::Boolean,
        }
    }

    /// Numeric view used by the matrix kernels.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarValue::Fp64(v) => v,
            ScalarValue::Fp32(v) => v as f64,
            ScalarValue::Int64(v) => v as f64,
            ScalarValue::Int32(v) => v as f64,
            ScalarValue::Boolean(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Fp64(v) => write!(f, "{}", v),
            ScalarValue::Fp32(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            ScalarValue::Int32(v) => write!(f, "{}", v),
            ScalarValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}
