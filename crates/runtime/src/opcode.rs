//! Opcode definitions for n-ary matrix instructions.
//!
//! Opcodes form a closed tagged union over operator families. Each variant
//! carries only what its semantics need: a concatenation axis or a reduce
//! function. The textual opcode (`cbind`, `rbind`, `nmin`, `nmax`) is a
//! stable wire identifier and also the lineage opcode.
//!
//! # Design Rules
//!
//! 1. **Closed set** - Unknown opcode strings are rejected at the boundary
//!    with [`ExecutionError::UnknownOpcode`]; no instruction ever carries one
//! 2. **Table-driven metadata** - Operand constraints live in the registry,
//!    not in the executor
//! 3. **Fail loudly** - Contract violations are errors, never coerced

use std::fmt;
use std::str::FromStr;

use mtx_foundation::{AppendAxis, NaryFn};
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::registry::{self, spec_for};

/// N-ary matrix opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NaryOpcode {
    /// Concatenation family: `cbind` (columns) and `rbind` (rows).
    Append(AppendAxis),
    /// Variadic element-wise reduction: `nmin` and `nmax`.
    Reduce(NaryFn),
}

impl NaryOpcode {
    pub const CBIND: NaryOpcode = NaryOpcode::Append(AppendAxis::Columns);
    pub const RBIND: NaryOpcode = NaryOpcode::Append(AppendAxis::Rows);
    pub const NMIN: NaryOpcode = NaryOpcode::Reduce(NaryFn::Min);
    pub const NMAX: NaryOpcode = NaryOpcode::Reduce(NaryFn::Max);

    /// Every supported opcode.
    pub const ALL: [NaryOpcode; 4] = [Self::CBIND, Self::RBIND, Self::NMIN, Self::NMAX];

    /// Wire name of the opcode.
    pub fn as_str(self) -> &'static str {
        match self {
            NaryOpcode::Append(AppendAxis::Columns) => "cbind",
            NaryOpcode::Append(AppendAxis::Rows) => "rbind",
            NaryOpcode::Reduce(NaryFn::Min) => "nmin",
            NaryOpcode::Reduce(NaryFn::Max) => "nmax",
        }
    }

    /// Static metadata for this opcode.
    pub fn metadata(self) -> &'static OpcodeMetadata {
        &spec_for(self).metadata
    }
}

impl FromStr for NaryOpcode {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        registry::lookup(s).map(|spec| spec.opcode)
    }
}

impl fmt::Display for NaryOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for an opcode.
#[derive(Debug, Clone)]
pub struct OpcodeMetadata {
    /// Fewest inputs accepted. There is no upper bound.
    pub min_operands: usize,
    /// Whether scalar inputs are accepted next to matrices.
    pub accepts_scalars: bool,
}
