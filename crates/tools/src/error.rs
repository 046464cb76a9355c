//! Errors surfaced by the command line tools.

use std::path::PathBuf;

use mtx_runtime::ExecutionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid program: {0}")]
    Json(#[from] serde_json::Error),

    /// Instruction `index` of the program failed to parse or execute.
    #[error("instruction {index} ('{text}'): {source}")]
    Instruction {
        index: usize,
        text: String,
        #[source]
        source: ExecutionError,
    },

    #[error("output '{0}' is not bound")]
    MissingOutput(String),
}

impl ToolError {
    /// Process exit code: 2 for malformed programs, 1 for runtime failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolError::Io { .. } | ToolError::Json(_) => 2,
            ToolError::Instruction { source, .. } if source.is_fatal() => 2,
            _ => 1,
        }
    }
}
