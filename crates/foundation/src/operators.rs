//! Operator payloads carried by n-ary instructions.
//!
//! These enums are shared by the opcode table, the lineage recorder and the
//! matrix kernels so that every layer agrees on one closed set of semantics.

use serde::{Deserialize, Serialize};

/// Concatenation direction for `cbind` / `rbind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendAxis {
    /// Append along columns (`cbind`): inputs share their row count.
    Columns,
    /// Append along rows (`rbind`): inputs share their column count.
    Rows,
}

/// Element-wise function applied across all inputs of `nmin` / `nmax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NaryFn {
    Min,
    Max,
}

impl NaryFn {
    /// Neutral starting value of the reduction.
    pub fn identity(self) -> f64 {
        match self {
            NaryFn::Min => f64::INFINITY,
            NaryFn::Max => f64::NEG_INFINITY,
        }
    }

    /// Combine two cells. NaN on either side yields NaN.
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        if a.is_nan() || b.is_nan() {
            return f64::NAN;
        }
        match self {
            NaryFn::Min => a.min(b),
            NaryFn::Max => a.max(b),
        }
    }
}
