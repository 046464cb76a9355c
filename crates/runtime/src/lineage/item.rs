//! Lineage items.

use std::fmt;

use mtx_foundation::{
    fnv1a64_field, fnv1a64_u64, ScalarValue, Value, VarName, FNV1A_OFFSET_BASIS_64,
};

use crate::operand::OPERAND_DELIM;

/// Lineage opcode of an inline literal leaf.
pub const OPCODE_LITERAL: &str = "lit";
/// Lineage opcode of an externally provided input.
pub const OPCODE_READ: &str = "read";

/// Content hash of a lineage item.
///
/// Computed from the opcode, the leaf data and the input ids, never from the
/// output name, so the same computation gets the same id wherever it is
/// recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineageId(pub u64);

impl fmt::Display for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One node of the lineage DAG.
///
/// Inputs are referenced by id; the nodes themselves live in a
/// [`super::LineageMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageItem {
    id: LineageId,
    name: VarName,
    opcode: String,
    data: Option<String>,
    inputs: Vec<LineageId>,
}

impl LineageItem {
    /// An operation node over `inputs`, in input order.
    pub fn new(name: impl Into<VarName>, opcode: impl Into<String>, inputs: Vec<LineageId>) -> Self {
        Self::build(name.into(), opcode.into(), None, inputs)
    }

    /// A leaf carrying `data` instead of inputs.
    pub fn leaf(name: impl Into<VarName>, opcode: impl Into<String>, data: impl Into<String>) -> Self {
        Self::build(name.into(), opcode.into(), Some(data.into()), Vec::new())
    }

    /// Leaf for an inline literal: data is `<value>·<VALUETYPE>`.
    ///
    /// The value is written in its canonical form, so `3` and `3.0` given
    /// as `FP64` literals share one leaf.
    pub fn literal(value: &ScalarValue) -> Self {
        let text = value.to_string();
        let data = format!("{}{}{}", text, OPERAND_DELIM, value.value_type());
        Self::leaf(text, OPCODE_LITERAL, data)
    }

    /// Leaf for a variable provided from outside the instruction stream.
    ///
    /// Data is `<name>·<content hash>`, so rebinding a name to a different
    /// value yields different lineage.
    pub fn creation(name: impl Into<VarName>, value: &Value) -> Self {
        let name = name.into();
        let data = format!("{}{}{:016x}", name, OPERAND_DELIM, value.content_hash());
        Self::leaf(name, OPCODE_READ, data)
    }

    fn build(name: VarName, opcode: String, data: Option<String>, inputs: Vec<LineageId>) -> Self {
        let id = compute_id(&opcode, data.as_deref(), &inputs);
        Self {
            id,
            name,
            opcode,
            data,
            inputs,
        }
    }

    pub fn id(&self) -> LineageId {
        self.id
    }

    /// Output name the item was recorded for. Not part of its identity.
    pub fn name(&self) -> &VarName {
        &self.name
    }

    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn inputs(&self) -> &[LineageId] {
        &self.inputs
    }

    pub fn is_leaf(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Structural equivalence ignoring output names.
    ///
    /// Compares content, not just ids: opcode, data and the input ids in
    /// order. Input ids stand for whole sub-DAGs; the map refuses to store a
    /// second node under an id it already holds with different content.
    pub fn is_equivalent(&self, other: &LineageItem) -> bool {
        self.id == other.id
            && self.opcode == other.opcode
            && self.data == other.data
            && self.inputs == other.inputs
    }
}

fn compute_id(opcode: &str, data: Option<&str>, inputs: &[LineageId]) -> LineageId {
    let mut hash = fnv1a64_field(FNV1A_OFFSET_BASIS_64, opcode);
    hash = match data {
        Some(data) => fnv1a64_field(fnv1a64_u64(hash, 1), data),
        None => fnv1a64_u64(hash, 0),
    };
    hash = fnv1a64_u64(hash, inputs.len() as u64);
    for input in inputs {
        hash = fnv1a64_u64(hash, input.0);
    }
    LineageId(hash)
}
