//! Execution errors.
//!
//! Every failure the core can report for a single instruction. The caller
//! gets the failure kind plus, where one exists, the index of the offending
//! operand in the instruction's input list; reporting the opcode and operand
//! names to users is the surrounding runtime's job.
//!
//! # Error Categories
//!
//! - **Resolution**: [`ExecutionError::UnboundVariable`], [`ExecutionError::TypeMismatch`],
//!   [`ExecutionError::InvalidLiteral`]
//! - **Opcode contract**: [`ExecutionError::InvalidOperandKind`],
//!   [`ExecutionError::DimensionMismatch`], [`ExecutionError::EmptyOperandList`],
//!   [`ExecutionError::InvalidOutputShape`]
//! - **Dispatch configuration**: [`ExecutionError::UnknownOpcode`],
//!   [`ExecutionError::InvalidInstruction`]
//!
//! Nothing here is retryable. Instructions are pure functions of their
//! pinned inputs, so re-execution after fixing the cause is the only
//! recovery. A pin/release imbalance is not an error value at all: it is an
//! internal invariant violation and panics.

use std::fmt;

use mtx_foundation::{DataType, ValueType, VarName};

use crate::opcode::NaryOpcode;

/// Runtime result type alias.
pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Shape an input was required to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRequirement {
    /// Same row count as the first input (`cbind`).
    Rows(usize),
    /// Same column count as the first input (`rbind`).
    Cols(usize),
    /// Identical shape to the first matrix input (`nmin` / `nmax`).
    Shape(usize, usize),
}

impl fmt::Display for ShapeRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeRequirement::Rows(rows) => write!(f, "{} rows", rows),
            ShapeRequirement::Cols(cols) => write!(f, "{} columns", cols),
            ShapeRequirement::Shape(rows, cols) => write!(f, "shape {}×{}", rows, cols),
        }
    }
}

/// Instruction execution error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    /// An input operand names a variable with no binding in the context.
    #[error("Unbound variable '{name}' (operand {index})")]
    UnboundVariable {
        /// The missing variable name.
        name: VarName,
        /// Position of the operand in the instruction's input list.
        index: usize,
    },

    /// The bound value does not have the operand's declared data type.
    #[error("Type mismatch for '{name}' (operand {index}): expected {expected}, found {found}")]
    TypeMismatch {
        name: VarName,
        index: usize,
        expected: DataType,
        found: DataType,
    },

    /// A literal operand's text is not a valid value of its declared type.
    #[error("Invalid literal '{text}' for {value_type} (operand {index})")]
    InvalidLiteral {
        text: String,
        value_type: ValueType,
        index: usize,
    },

    /// The opcode does not accept an operand of this data type.
    #[error("Invalid operand kind for {opcode}: operand {index} ('{name}') is a {found}")]
    InvalidOperandKind {
        opcode: NaryOpcode,
        index: usize,
        name: VarName,
        found: DataType,
    },

    /// An input's shape violates the opcode's shape contract.
    #[error("Dimension mismatch in {opcode}: operand {index} is {}×{}, expected {expected}", .found.0, .found.1)]
    DimensionMismatch {
        opcode: NaryOpcode,
        index: usize,
        expected: ShapeRequirement,
        /// Actual (rows, cols) of the offending operand.
        found: (usize, usize),
    },

    /// The opcode requires at least one input and got none.
    #[error("Empty operand list for {opcode}")]
    EmptyOperandList { opcode: NaryOpcode },

    /// A scalar output was declared but the computed block is not 1×1.
    #[error("Cannot bind {}×{} result of {opcode} to scalar output '{output}'", .found.0, .found.1)]
    InvalidOutputShape {
        opcode: NaryOpcode,
        output: VarName,
        found: (usize, usize),
    },

    /// The opcode string names no known operator family.
    #[error("Unknown opcode: {opcode}")]
    UnknownOpcode { opcode: String },

    /// The instruction text could not be decoded.
    #[error("Invalid instruction: {message}")]
    InvalidInstruction { message: String },
}

impl ExecutionError {
    /// Dispatch-configuration errors: the instruction stream itself is
    /// malformed, independent of any runtime data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExecutionError::UnknownOpcode { .. } | ExecutionError::InvalidInstruction { .. }
        )
    }

    /// Index of the offending input operand, if the error names one.
    pub fn operand_index(&self) -> Option<usize> {
        match self {
            ExecutionError::UnboundVariable { index, .. }
            | ExecutionError::TypeMismatch { index, .. }
            | ExecutionError::InvalidLiteral { index, .. }
            | ExecutionError::InvalidOperandKind { index, .. }
            | ExecutionError::DimensionMismatch { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub(crate) fn invalid_instruction(message: impl Into<String>) -> Self {
        ExecutionError::InvalidInstruction {
            message: message.into(),
        }
    }
}
