//! N-ary instruction and its string codec.
//!
//! An instruction is `CP°<opcode>°<in1>°…°<inN>°<out>`: an execution type
//! tag, the opcode, every input operand and the output operand last.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, Result};
use crate::opcode::NaryOpcode;
use crate::operand::Operand;

/// Separator between instruction fields.
pub const INSTRUCTION_DELIM: char = '°';

/// Execution type tag for in-memory (control program) instructions.
pub const EXEC_TYPE_CP: &str = "CP";

/// One n-ary matrix instruction.
///
/// Immutable once built; the opcode is always one of the known families.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    opcode: NaryOpcode,
    inputs: Vec<Operand>,
    output: Operand,
}

impl Instruction {
    pub fn new(opcode: NaryOpcode, inputs: Vec<Operand>, output: Operand) -> Self {
        Self {
            opcode,
            inputs,
            output,
        }
    }

    /// Build an instruction from a textual opcode.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::UnknownOpcode`] if `opcode` names no family.
    pub fn named(opcode: &str, inputs: Vec<Operand>, output: Operand) -> Result<Self> {
        Ok(Self::new(opcode.parse()?, inputs, output))
    }

    /// Decode an instruction string.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::InvalidInstruction`] for a malformed string or
    ///   operand.
    /// - [`ExecutionError::UnknownOpcode`] for an unknown opcode.
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split(INSTRUCTION_DELIM).collect();
        if fields.len() < 3 {
            return Err(ExecutionError::invalid_instruction(format!(
                "instruction '{text}' needs an execution type, an opcode and an output"
            )));
        }
        if fields[0] != EXEC_TYPE_CP {
            return Err(ExecutionError::invalid_instruction(format!(
                "unsupported execution type '{}'",
                fields[0]
            )));
        }

        let opcode: NaryOpcode = fields[1].parse()?;
        let last = fields.len() - 1;
        let inputs = fields[2..last]
            .iter()
            .map(|field| Operand::parse(field))
            .collect::<Result<Vec<_>>>()?;
        let output = Operand::parse(fields[last])?;
        if output.literal {
            return Err(ExecutionError::invalid_instruction(format!(
                "output '{}' cannot be a literal",
                output.name
            )));
        }

        Ok(Self::new(opcode, inputs, output))
    }

    pub fn opcode(&self) -> NaryOpcode {
        self.opcode
    }

    pub fn inputs(&self) -> &[Operand] {
        &self.inputs
    }

    pub fn output(&self) -> &Operand {
        &self.output
    }
}

impl FromStr for Instruction {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", EXEC_TYPE_CP, INSTRUCTION_DELIM, self.opcode)?;
        for input in &self.inputs {
            write!(f, "{}{}", INSTRUCTION_DELIM, input)?;
        }
        write!(f, "{}{}", INSTRUCTION_DELIM, self.output)
    }
}
