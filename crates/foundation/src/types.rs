//! Data and value type tags.
//!
//! The tags are part of the instruction wire format (`A·MATRIX·FP64`), so the
//! textual forms returned by `as_str` are stable identifiers and must not
//! change.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural kind of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    /// Two-dimensional numeric block.
    Matrix,
    /// Single numeric datum.
    Scalar,
}

impl DataType {
    /// Wire tag for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Matrix => "MATRIX",
            DataType::Scalar => "SCALAR",
        }
    }

    /// Parses a wire tag. Returns `None` for unknown tags.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag {
            "MATRIX" => Some(DataType::Matrix),
            "SCALAR" => Some(DataType::Scalar),
            _ => None,
        }
    }

    pub fn is_matrix(self) -> bool {
        self == DataType::Matrix
    }

    pub fn is_scalar(self) -> bool {
        self == DataType::Scalar
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric kind of a value.
///
/// Matrices are always stored as `f64`; the value type of a matrix operand is
/// informational. Scalars carry their value type in [`crate::ScalarValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    /// 64-bit IEEE float.
    Fp64,
    /// 32-bit IEEE float.
    Fp32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit signed integer.
    Int32,
    /// Boolean, numerically `0` or `1`.
    Boolean,
}

impl ValueType {
    /// All value types, in wire-tag order.
    pub const ALL: [ValueType; 5] = [
        ValueType::Fp64,
        ValueType::Fp32,
        ValueType::Int64,
        ValueType::Int32,
        ValueType::Boolean,
    ];

    /// Wire tag for this value type.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Fp64 => "FP64",
            ValueType::Fp32 => "FP32",
            ValueType::Int64 => "INT64",
            ValueType::Int32 => "INT32",
            ValueType::Boolean => "BOOLEAN",
        }
    }

    /// Parses a wire tag. Returns `None` for unknown tags.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|vt| vt.as_str() == tag)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
