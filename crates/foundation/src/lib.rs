//! mtx Foundation
//!
//! Core value types shared by every mtx crate: variable names, data and
//! value type tags, dense matrix blocks, tagged scalars, n-ary reduce
//! functions, and the stable hashing used to derive lineage identifiers.
//!
//! Nothing in this crate performs I/O or holds shared state. The runtime
//! crate builds the execution context, dispatch and lineage on top of it.

pub mod ids;
pub mod matrix;
pub mod matrix_ops;
pub mod operators;
pub mod scalar;
pub mod stable_hash;
pub mod types;
pub mod value;

pub use ids::VarName;
pub use matrix::MatrixBlock;
pub use operators::{AppendAxis, NaryFn};
pub use scalar::ScalarValue;
pub use stable_hash::{
    fnv1a64, fnv1a64_f64, fnv1a64_field, fnv1a64_mix, fnv1a64_str, fnv1a64_u64,
    FNV1A_OFFSET_BASIS_64, FNV1A_PRIME_64,
};
pub use types::{DataType, ValueType};
pub use value::Value;
