//! mtx Runtime.
//!
//! Executes n-ary matrix instructions (`cbind`, `rbind`, `nmin`, `nmax`)
//! against a shared execution context, and records the lineage of every
//! result so that equivalent computations can be reused.
//!
//! # Architecture
//!
//! - [`operand`] - Typed operand references and their wire form
//! - [`opcode`] / [`registry`] / [`handlers`] - Closed opcode set, metadata
//!   table and per-family handlers
//! - [`instruction`] - Instructions and the instruction string codec
//! - [`context`] - Name → value bindings with pin-counted matrices
//! - [`executor`] - Validate, pin, dispatch, release, bind
//! - [`library`] - The matrix operator library seam
//! - [`lineage`] - Lineage items, recording and explain traces
//! - [`reuse`] - Lineage-keyed result cache
//! - [`runtime`] - [`Runtime`] facade keeping bindings and lineage in step
//!
//! # Example
//!
//! ```ignore
//! use mtx_foundation::MatrixBlock;
//! use mtx_runtime::{Runtime, RuntimeConfig};
//!
//! let rt = Runtime::new(RuntimeConfig::default());
//! rt.set_input("A", MatrixBlock::from_rows(&[[1.0, 5.0]]));
//! rt.set_input("B", MatrixBlock::from_rows(&[[4.0, 2.0]]));
//! rt.execute_str("CP°nmax°A·MATRIX·FP64°B·MATRIX·FP64°3·SCALAR·INT64·true°C·MATRIX·FP64")?;
//! println!("{}", rt.explain("C").unwrap_or_default());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod instruction;
pub mod library;
pub mod lineage;
pub mod opcode;
pub mod operand;
pub mod registry;
pub mod reuse;
pub mod runtime;

pub use config::{LineageMode, RuntimeConfig};
pub use context::{ExecutionContext, MatrixObject, PinnedMatrices};
pub use error::{ExecutionError, Result, ShapeRequirement};
pub use executor::{InstructionExecutor, OpResult};
pub use instruction::{Instruction, INSTRUCTION_DELIM};
pub use library::{DenseLibrary, MatrixLibrary};
pub use lineage::{
    record_lineage, LineageId, LineageItem, LineageLookup, LineageMap, LineageRecord,
};
pub use opcode::{NaryOpcode, OpcodeMetadata};
pub use operand::{Operand, OPERAND_DELIM};
pub use reuse::{CacheStats, ReuseCache};
pub use runtime::Runtime;
