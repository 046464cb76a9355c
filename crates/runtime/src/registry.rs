//! Opcode registry linking metadata to handlers.

use std::sync::OnceLock;

use super::error::{ExecutionError, Result};
use super::handlers::{handle_append, handle_reduce, Handler};
use super::opcode::{NaryOpcode, OpcodeMetadata};

/// Metadata and handler specification for an opcode.
///
/// The executor validates instructions against `metadata` before pinning
/// anything, then calls `handler` with the pinned inputs.
#[derive(Debug, Clone)]
pub struct OpcodeSpec {
    /// The opcode this specification covers.
    pub opcode: NaryOpcode,
    /// Static metadata for validation.
    pub metadata: OpcodeMetadata,
    /// The function computing the opcode's result block.
    pub handler: Handler,
}

/// Retrieves the global list of all registered opcode specifications.
pub fn opcode_specs() -> &'static [OpcodeSpec] {
    static SPECS: OnceLock<Vec<OpcodeSpec>> = OnceLock::new();
    SPECS.get_or_init(build_specs)
}

/// Retrieves the specification for an opcode.
///
/// # Panics
///
/// Panics if the opcode has no registered specification, which means the
/// table below is out of sync with [`NaryOpcode::ALL`].
pub fn spec_for(opcode: NaryOpcode) -> &'static OpcodeSpec {
    opcode_specs()
        .iter()
        .find(|spec| spec.opcode == opcode)
        .unwrap_or_else(|| panic!("Missing opcode spec for {opcode}"))
}

/// Resolves an opcode by wire name.
///
/// # Errors
///
/// Returns [`ExecutionError::UnknownOpcode`] for names outside the table.
pub fn lookup(name: &str) -> Result<&'static OpcodeSpec> {
    opcode_specs()
        .iter()
        .find(|spec| spec.opcode.as_str() == name)
        .ok_or_else(|| ExecutionError::UnknownOpcode {
            opcode: name.to_string(),
        })
}

/// Master list of opcode specifications.
fn build_specs() -> Vec<OpcodeSpec> {
    macro_rules! op {
        ($opcode:expr, scalars: $scalars:expr, $handler:ident) => {
            OpcodeSpec {
                opcode: $opcode,
                metadata: OpcodeMetadata {
                    min_operands: 1,
                    accepts_scalars: $scalars,
                },
                handler: $handler,
            }
        };
    }

    vec![
        op!(NaryOpcode::CBIND, scalars: false, handle_append),
        op!(NaryOpcode::RBIND, scalars: false, handle_append),
        op!(NaryOpcode::NMIN, scalars: true, handle_reduce),
        op!(NaryOpcode::NMAX, scalars: true, handle_reduce),
    ]
}
