//! JSON program files.
//!
//! A program bundles a runtime configuration, the initial input bindings,
//! an instruction stream in string form and the names to report:
//!
//! ```json
//! {
//!   "config": { "lineage": "reuse" },
//!   "inputs": {
//!     "A": { "matrix": { "rows": 1, "cols": 2, "data": [1.0, 5.0] } },
//!     "k": { "scalar": { "value_type": "INT64", "value": 3 } }
//!   },
//!   "instructions": ["CP°nmax°A·MATRIX·FP64°k·SCALAR·INT64°C·MATRIX·FP64"],
//!   "outputs": ["C"]
//! }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use mtx_foundation::{Value, VarName};
use mtx_runtime::{CacheStats, Instruction, Runtime, RuntimeConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ToolError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub config: RuntimeConfig,
    #[serde(default)]
    pub inputs: IndexMap<VarName, Value>,
    pub instructions: Vec<String>,
    /// Variables to report after the run. Empty reports nothing.
    #[serde(default)]
    pub outputs: Vec<VarName>,
}

/// Result of running a [`Program`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramReport {
    pub outputs: IndexMap<VarName, Value>,
    pub executed: usize,
    pub cache: CacheStats,
}

impl Program {
    pub fn from_json(text: &str) -> Result<Self, ToolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let text = fs::read_to_string(path).map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let program = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            inputs = program.inputs.len(),
            instructions = program.instructions.len(),
            "program loaded"
        );
        Ok(program)
    }

    /// Decode every instruction string up front.
    pub fn parse_instructions(&self) -> Result<Vec<Instruction>, ToolError> {
        self.instructions
            .iter()
            .enumerate()
            .map(|(index, text)| {
                Instruction::parse(text).map_err(|source| ToolError::Instruction {
                    index,
                    text: text.clone(),
                    source,
                })
            })
            .collect()
    }

    /// A runtime configured from this program, with its inputs bound.
    pub fn runtime(&self) -> Runtime {
        let runtime = Runtime::new(self.config.clone());
        for (name, value) in &self.inputs {
            runtime.set_input(name.clone(), value.clone());
        }
        runtime
    }

    /// Execute the instruction stream on `runtime` and collect the outputs.
    ///
    /// Instructions are all parsed before the first one runs, so a malformed
    /// stream executes nothing.
    pub fn run_on(&self, runtime: &Runtime) -> Result<ProgramReport, ToolError> {
        let instructions = self.parse_instructions()?;
        for (index, instruction) in instructions.iter().enumerate() {
            runtime
                .execute(instruction)
                .map_err(|source| ToolError::Instruction {
                    index,
                    text: self.instructions[index].clone(),
                    source,
                })?;
        }
        debug!(executed = instructions.len(), "program finished");

        let outputs = self
            .outputs
            .iter()
            .map(|name| {
                runtime
                    .get(name.as_str())
                    .map(|value| (name.clone(), value))
                    .ok_or_else(|| ToolError::MissingOutput(name.to_string()))
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;

        Ok(ProgramReport {
            outputs,
            executed: instructions.len(),
            cache: runtime.cache_stats(),
        })
    }

    /// Run on a fresh runtime from [`Program::runtime`].
    pub fn run(&self) -> Result<ProgramReport, ToolError> {
        self.run_on(&self.runtime())
    }
}
