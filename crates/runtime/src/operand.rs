//! Operand model.
//!
//! Operands are typed lookup keys into the execution context: they name a
//! value, they never own one. A scalar operand may instead be an inline
//! literal, in which case its name is the literal text.
//!
//! # Wire format
//!
//! `name·DATATYPE·VALUETYPE[·true]`, e.g. `A·MATRIX·FP64` or
//! `3·SCALAR·INT64·true`. The trailing flag marks a literal and is only
//! written when set.

use std::fmt;

use mtx_foundation::{DataType, ScalarValue, ValueType, VarName};
use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, Result};

/// Separator between the parts of one operand.
pub const OPERAND_DELIM: char = '·';

/// Typed reference to a value in the execution context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operand {
    /// Variable name, or the literal text when `literal` is set.
    pub name: VarName,
    pub data_type: DataType,
    pub value_type: ValueType,
    /// Inline literal; never looked up in the context.
    #[serde(default)]
    pub literal: bool,
}

impl Operand {
    /// A matrix variable operand.
    pub fn matrix(name: impl Into<VarName>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Matrix,
            value_type,
            literal: false,
        }
    }

    /// A scalar variable operand.
    pub fn scalar(name: impl Into<VarName>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Scalar,
            value_type,
            literal: false,
        }
    }

    /// An inline scalar literal.
    pub fn literal(value: ScalarValue) -> Self {
        Self {
            name: VarName::new(value.to_string()),
            data_type: DataType::Scalar,
            value_type: value.value_type(),
            literal: true,
        }
    }

    pub fn is_matrix(&self) -> bool {
        self.data_type.is_matrix()
    }

    pub fn is_scalar(&self) -> bool {
        self.data_type.is_scalar()
    }

    /// Value of a literal operand.
    ///
    /// `index` is the operand's position, used for error reporting.
    pub fn literal_value(&self, index: usize) -> Result<ScalarValue> {
        ScalarValue::parse_literal(self.value_type, self.name.as_str()).ok_or_else(|| {
            ExecutionError::InvalidLiteral {
                text: self.name.to_string(),
                value_type: self.value_type,
                index,
            }
        })
    }

    /// Decode one operand from its wire form.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(OPERAND_DELIM).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(ExecutionError::invalid_instruction(format!(
                "operand '{text}' must have 3 or 4 parts, found {}",
                parts.len()
            )));
        }
        if parts[0].is_empty() {
            return Err(ExecutionError::invalid_instruction(format!(
                "operand '{text}' has an empty name"
            )));
        }
        let data_type = DataType::parse_tag(parts[1]).ok_or_else(|| {
            ExecutionError::invalid_instruction(format!("unknown data type '{}'", parts[1]))
        })?;
        let value_type = ValueType::parse_tag(parts[2]).ok_or_else(|| {
            ExecutionError::invalid_instruction(format!("unknown value type '{}'", parts[2]))
        })?;
        let literal = match parts.get(3) {
            None | Some(&"false") => false,
            Some(&"true") => true,
            Some(flag) => {
                return Err(ExecutionError::invalid_instruction(format!(
                    "invalid literal flag '{flag}'"
                )))
            }
        };
        if literal && data_type.is_matrix() {
            return Err(ExecutionError::invalid_instruction(format!(
                "matrix operand '{}' cannot be a literal",
                parts[0]
            )));
        }

        Ok(Self {
            name: VarName::from(parts[0]),
            data_type,
            value_type,
            literal,
        })
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}",
            self.name,
            self.data_type,
            self.value_type,
            d = OPERAND_DELIM
        )?;
        if self.literal {
            write!(f, "{}true", OPERAND_DELIM)?;
        }
        Ok(())
    }
}

/// Operand positions split by data type, each in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperandPartition {
    /// Input indices of matrix operands.
    pub matrices: Vec<usize>,
    /// Input indices of scalar operands.
    pub scalars: Vec<usize>,
}

/// Classify operands by data type, preserving relative order.
pub fn partition(operands: &[Operand]) -> OperandPartition {
    let mut out = OperandPartition::default();
    for (index, operand) in operands.iter().enumerate() {
        match operand.data_type {
            DataType::Matrix => out.matrices.push(index),
            DataType::Scalar => out.scalars.push(index),
        }
    }
    out
}
