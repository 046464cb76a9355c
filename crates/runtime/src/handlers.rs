//! Opcode handlers.
//!
//! A handler receives the already pinned matrix inputs and resolved scalars
//! of one instruction, checks the opcode family's shape contract, and calls
//! into the [`MatrixLibrary`]. Handlers never touch the execution context:
//! pinning, release and output binding belong to the executor.

use mtx_foundation::{AppendAxis, DataType, MatrixBlock, ScalarValue};

use crate::context::PinnedMatrices;
use crate::error::{ExecutionError, Result, ShapeRequirement};
use crate::library::MatrixLibrary;
use crate::opcode::NaryOpcode;
use crate::operand::Operand;

/// Pinned inputs of one instruction execution, split by data type.
pub struct HandlerInputs<'a> {
    pub opcode: NaryOpcode,
    /// All input operands of the instruction.
    pub operands: &'a [Operand],
    /// Matrix inputs, in input order, with their operand indices.
    pub matrices: &'a PinnedMatrices,
    /// Scalar inputs, in input order, with their operand indices.
    pub scalars: &'a [(usize, ScalarValue)],
}

/// Functional interface for an opcode handler.
pub type Handler = fn(&HandlerInputs<'_>, &dyn MatrixLibrary) -> Result<MatrixBlock>;

/// Concatenates all matrix inputs along the opcode's axis.
///
/// # Errors
///
/// - [`ExecutionError::InvalidOperandKind`] for the first scalar input.
/// - [`ExecutionError::EmptyOperandList`] without matrix inputs.
/// - [`ExecutionError::DimensionMismatch`] for the first input whose row
///   count (`cbind`) or column count (`rbind`) differs from the first input.
pub(crate) fn handle_append(
    inputs: &HandlerInputs<'_>,
    library: &dyn MatrixLibrary,
) -> Result<MatrixBlock> {
    let NaryOpcode::Append(axis) = inputs.opcode else {
        return Err(ExecutionError::invalid_instruction(format!(
            "{} routed to the append handler",
            inputs.opcode
        )));
    };
    if let Some((index, _)) = inputs.scalars.first() {
        return Err(ExecutionError::InvalidOperandKind {
            opcode: inputs.opcode,
            index: *index,
            name: inputs.operands[*index].name.clone(),
            found: DataType::Scalar,
        });
    }

    let mut blocks = inputs.matrices.iter();
    let Some((_, first)) = blocks.next() else {
        return Err(ExecutionError::EmptyOperandList {
            opcode: inputs.opcode,
        });
    };

    let mut rest = Vec::with_capacity(inputs.matrices.len().saturating_sub(1));
    for (index, block) in blocks {
        let (expected, compatible) = match axis {
            AppendAxis::Columns => (
                ShapeRequirement::Rows(first.rows()),
                block.rows() == first.rows(),
            ),
            AppendAxis::Rows => (
                ShapeRequirement::Cols(first.cols()),
                block.cols() == first.cols(),
            ),
        };
        if !compatible {
            return Err(ExecutionError::DimensionMismatch {
                opcode: inputs.opcode,
                index,
                expected,
                found: block.shape(),
            });
        }
        rest.push(block);
    }

    Ok(library.append(first, &rest, axis))
}

/// Reduces all inputs element-wise with the opcode's min/max function.
///
/// # Errors
///
/// - [`ExecutionError::EmptyOperandList`] without any input.
/// - [`ExecutionError::DimensionMismatch`] for the first matrix whose shape
///   differs from the first matrix input.
pub(crate) fn handle_reduce(
    inputs: &HandlerInputs<'_>,
    library: &dyn MatrixLibrary,
) -> Result<MatrixBlock> {
    let NaryOpcode::Reduce(func) = inputs.opcode else {
        return Err(ExecutionError::invalid_instruction(format!(
            "{} routed to the reduce handler",
            inputs.opcode
        )));
    };
    if inputs.matrices.is_empty() && inputs.scalars.is_empty() {
        return Err(ExecutionError::EmptyOperandList {
            opcode: inputs.opcode,
        });
    }

    let mut blocks: Vec<&MatrixBlock> = Vec::with_capacity(inputs.matrices.len());
    for (index, block) in inputs.matrices.iter() {
        if let Some(first) = blocks.first() {
            if block.shape() != first.shape() {
                return Err(ExecutionError::DimensionMismatch {
                    opcode: inputs.opcode,
                    index,
                    expected: ShapeRequirement::Shape(first.rows(), first.cols()),
                    found: block.shape(),
                });
            }
        }
        blocks.push(block);
    }
    let scalars: Vec<ScalarValue> = inputs.scalars.iter().map(|(_, s)| *s).collect();

    Ok(library.nary_reduce(func, &blocks, &scalars))
}
