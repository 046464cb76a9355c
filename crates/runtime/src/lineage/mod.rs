//! Lineage recording.
//!
//! Every executed instruction gets a [`LineageItem`] describing how its
//! output was derived: the opcode plus the lineage of each input, with
//! literal leaves for inline constants and creation leaves for externally
//! provided variables. Items with equal content describe the same
//! computation regardless of the output name they were recorded for, which
//! is what lets the reuse cache hand back earlier results.
//!
//! Recording only reads lineage ids through a [`LineageLookup`]; it never
//! touches the execution context, takes no pins and holds no context lock.

mod item;
mod map;

#[cfg(test)]
mod tests;

use tracing::trace;

pub use item::{LineageId, LineageItem, OPCODE_LITERAL, OPCODE_READ};
pub use map::{LineageMap, COLLECT_THRESHOLD};

use crate::error::{ExecutionError, Result};
use crate::instruction::Instruction;

/// Read access to the lineage of named variables.
pub trait LineageLookup {
    fn lineage(&self, name: &str) -> Option<LineageId>;
}

/// Output of [`record_lineage`]: the item for the instruction's output plus
/// the literal leaves it references, which no lookup knows about yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageRecord {
    pub item: LineageItem,
    pub literals: Vec<LineageItem>,
}

/// Build the lineage item for `instruction`'s output.
///
/// # Errors
///
/// - [`ExecutionError::UnboundVariable`] if a non-literal input has no
///   lineage in `lookup`.
/// - [`ExecutionError::InvalidLiteral`] for unparsable literal text.
pub fn record_lineage(instruction: &Instruction, lookup: &dyn LineageLookup) -> Result<LineageRecord> {
    let mut literals = Vec::new();
    let mut inputs = Vec::with_capacity(instruction.inputs().len());

    for (index, operand) in instruction.inputs().iter().enumerate() {
        if operand.literal {
            let leaf = LineageItem::literal(&operand.literal_value(index)?);
            inputs.push(leaf.id());
            literals.push(leaf);
            continue;
        }
        let id = lookup
            .lineage(operand.name.as_str())
            .ok_or_else(|| ExecutionError::UnboundVariable {
                name: operand.name.clone(),
                index,
            })?;
        inputs.push(id);
    }

    let item = LineageItem::new(
        instruction.output().name.clone(),
        instruction.opcode().as_str(),
        inputs,
    );
    trace!(output = %item.name(), id = %item.id(), "lineage recorded");
    Ok(LineageRecord { item, literals })
}
