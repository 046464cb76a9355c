use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matrix::MatrixBlock;
use crate::scalar::ScalarValue;
use crate::stable_hash::{fnv1a64_f64, fnv1a64_field, fnv1a64_u64, FNV1A_OFFSET_BASIS_64};
use crate::types::DataType;

/// Runtime payload bound to a variable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// Dense two-dimensional block.
    Matrix(MatrixBlock),
    /// Single tagged scalar.
    Scalar(ScalarValue),
}

impl Value {
    /// Structural kind of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Matrix(_) => DataType::Matrix,
            Value::Scalar(_) => DataType::Scalar,
        }
    }

    /// Attempt to get the value as a matrix block.
    pub fn as_matrix(&self) -> Option<&MatrixBlock> {
        match self {
            Value::Matrix(m) => Some(m),
            Value::Scalar(_) => None,
        }
    }

    /// Attempt to get the value as a scalar.
    pub fn as_scalar(&self) -> Option<ScalarValue> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::Matrix(_) => None,
        }
    }

    /// Stable hash of the payload, distinguishing data and value types.
    pub fn content_hash(&self) -> u64 {
        match self {
            Value::Matrix(m) => fnv1a64_u64(m.content_hash(), 0),
            Value::Scalar(s) => {
                let hash = fnv1a64_field(FNV1A_OFFSET_BASIS_64, s.value_type().as_str());
                fnv1a64_u64(fnv1a64_f64(hash, s.as_f64()), 1)
            }
        }
    }

    /// Bitwise equality; see [`MatrixBlock::bit_eq`].
    pub fn bit_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Matrix(a), Value::Matrix(b)) => a.bit_eq(b),
            (Value::Scalar(a), Value::Scalar(b)) => {
                a.value_type() == b.value_type() && a.as_f64().to_bits() == b.as_f64().to_bits()
            }
            _ => false,
        }
    }
}

impl From<MatrixBlock> for Value {
    fn from(m: MatrixBlock) -> Self {
        Value::Matrix(m)
    }
}

impl From<ScalarValue> for Value {
    fn from(s: ScalarValue) -> Self {
        Value::Scalar(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Matrix(m) => write!(f, "{}", m),
            Value::Scalar(s) => write!(f, "{} ({})", s, s.value_type()),
        }
    }
}
