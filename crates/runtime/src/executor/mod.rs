//! Instruction executor.
//!
//! Runs one n-ary instruction against an [`ExecutionContext`]:
//!
//! 1. Validate the operand list against the opcode metadata
//! 2. Pin matrix inputs and resolve scalar inputs
//! 3. Dispatch to the opcode handler through the registry
//! 4. Release pins (always, before any error propagates)
//! 5. Convert the result to the declared output type and bind it
//!
//! On failure nothing is bound and every pin count is back where it was.

use std::sync::Arc;

use mtx_foundation::{DataType, MatrixBlock, ScalarValue, Value};
use tracing::{debug, trace};

use crate::context::ExecutionContext;
use crate::error::{ExecutionError, Result};
use crate::handlers::HandlerInputs;
use crate::instruction::Instruction;
use crate::library::{DenseLibrary, MatrixLibrary};
use crate::opcode::NaryOpcode;
use crate::operand::{partition, Operand};
use crate::registry::spec_for;

/// Result of an instruction, already converted to its declared output type.
#[derive(Debug, Clone, PartialEq)]
pub enum OpResult {
    Matrix(MatrixBlock),
    Scalar(ScalarValue),
}

impl OpResult {
    /// Convert a computed block to the output's declared data type.
    ///
    /// Matrix outputs take the block as is. Scalar outputs require a 1×1
    /// block; its single cell becomes a scalar of the declared value type.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::InvalidOutputShape`] if a scalar output is
    /// declared and the block is not 1×1.
    pub fn materialize(block: MatrixBlock, output: &Operand, opcode: NaryOpcode) -> Result<Self> {
        match output.data_type {
            DataType::Matrix => Ok(OpResult::Matrix(block)),
            DataType::Scalar => {
                if block.shape() != (1, 1) {
                    return Err(ExecutionError::InvalidOutputShape {
                        opcode,
                        output: output.name.clone(),
                        found: block.shape(),
                    });
                }
                Ok(OpResult::Scalar(ScalarValue::from_f64(
                    output.value_type,
                    block.get(0, 0),
                )))
            }
        }
    }
}

impl From<OpResult> for Value {
    fn from(result: OpResult) -> Self {
        match result {
            OpResult::Matrix(block) => Value::Matrix(block),
            OpResult::Scalar(scalar) => Value::Scalar(scalar),
        }
    }
}

/// Shared-nothing executor for n-ary instructions.
///
/// The executor holds only the matrix library; all state lives in the
/// context passed to each call, so one executor can serve many workers.
#[derive(Clone)]
pub struct InstructionExecutor {
    library: Arc<dyn MatrixLibrary>,
}

impl Default for InstructionExecutor {
    fn default() -> Self {
        Self::new(Arc::new(DenseLibrary))
    }
}

impl std::fmt::Debug for InstructionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionExecutor").finish_non_exhaustive()
    }
}

impl InstructionExecutor {
    /// Creates an executor computing through `library`.
    pub fn new(library: Arc<dyn MatrixLibrary>) -> Self {
        Self { library }
    }

    /// Execute `instruction` and bind its output in `ctx`.
    ///
    /// Returns the bound value.
    ///
    /// # Errors
    ///
    /// Any [`ExecutionError`] from validation, resolution, the opcode
    /// handler, or output materialization. The context is unchanged on
    /// error.
    pub fn execute(&self, instruction: &Instruction, ctx: &ExecutionContext) -> Result<Value> {
        let value: Value = self.compute(instruction, ctx)?.into();
        ctx.bind_output(&instruction.output().name, value.clone());
        debug!(
            opcode = %instruction.opcode(),
            output = %instruction.output().name,
            "instruction executed"
        );
        Ok(value)
    }

    /// Execute `instruction` without binding the output.
    ///
    /// Pins are taken and released exactly as in [`Self::execute`].
    pub fn compute(&self, instruction: &Instruction, ctx: &ExecutionContext) -> Result<OpResult> {
        let opcode = instruction.opcode();
        let spec = spec_for(opcode);
        self.validate_instruction(instruction)?;

        trace!(
            %opcode,
            inputs = instruction.inputs().len(),
            "resolving inputs"
        );
        let matrices = ctx.resolve_matrices(instruction.inputs())?;
        let block = ctx
            .resolve_scalars(instruction.inputs())
            .and_then(|scalars| {
                let inputs = HandlerInputs {
                    opcode,
                    operands: instruction.inputs(),
                    matrices: &matrices,
                    scalars: &scalars,
                };
                (spec.handler)(&inputs, self.library.as_ref())
            });
        ctx.release_matrices(matrices);

        OpResult::materialize(block?, instruction.output(), opcode)
    }

    /// Validates the operand list against the opcode metadata.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::EmptyOperandList`] with fewer inputs than the
    ///   opcode minimum.
    /// - [`ExecutionError::InvalidOperandKind`] for the first scalar operand
    ///   of an opcode that only takes matrices.
    fn validate_instruction(&self, instruction: &Instruction) -> Result<()> {
        let opcode = instruction.opcode();
        let meta = opcode.metadata();
        let inputs = instruction.inputs();

        if inputs.len() < meta.min_operands {
            return Err(ExecutionError::EmptyOperandList { opcode });
        }

        if !meta.accepts_scalars {
            if let Some(&index) = partition(inputs).scalars.first() {
                return Err(ExecutionError::InvalidOperandKind {
                    opcode,
                    index,
                    name: inputs[index].name.clone(),
                    found: DataType::Scalar,
                });
            }
        }
        Ok(())
    }
}
