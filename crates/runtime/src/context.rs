//! Execution context with pin-counted matrix bindings.
//!
//! The context maps variable names to values. Matrix values live in shared
//! [`MatrixObject`]s that carry a pin count; instructions pin their matrix
//! inputs for the duration of one execution through a [`PinnedMatrices`]
//! guard and release them when the guard is dropped.
//!
//! # Sharing rules
//!
//! - Readers of the same name only bump an atomic pin count; they never
//!   block each other beyond the short map read lock.
//! - Rebinding a name swaps the map entry for a fresh object. The superseded
//!   object is neither mutated nor freed while a guard still holds it, so a
//!   reader mid-execution keeps seeing the value it pinned.
//! - Pins are released on every exit path (success, error, unwinding) because
//!   release lives in `Drop`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use mtx_foundation::{DataType, MatrixBlock, ScalarValue, Value, VarName};
use tracing::{debug, trace};

use crate::error::{ExecutionError, Result};
use crate::operand::Operand;

/// A bound matrix value plus its pin count.
#[derive(Debug)]
pub struct MatrixObject {
    name: VarName,
    block: MatrixBlock,
    pins: AtomicUsize,
}

impl MatrixObject {
    fn new(name: VarName, block: MatrixBlock) -> Self {
        Self {
            name,
            block,
            pins: AtomicUsize::new(0),
        }
    }

    /// The matrix block held by this object.
    pub fn block(&self) -> &MatrixBlock {
        &self.block
    }

    /// Number of outstanding pins.
    pub fn pin_count(&self) -> usize {
        self.pins.load(Ordering::Acquire)
    }

    fn pin(&self) {
        self.pins.fetch_add(1, Ordering::AcqRel);
    }

    /// # Panics
    ///
    /// Panics if the pin count is already zero: a release without a matching
    /// resolve is a bug in the dispatch code, never a user error.
    fn unpin(&self) {
        let released = self
            .pins
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pins| pins.checked_sub(1));
        if released.is_err() {
            panic!(
                "pin/release imbalance: '{}' released more often than resolved",
                self.name
            );
        }
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Matrix(Arc<MatrixObject>),
    Scalar(ScalarValue),
}

impl Binding {
    fn data_type(&self) -> DataType {
        match self {
            Binding::Matrix(_) => DataType::Matrix,
            Binding::Scalar(_) => DataType::Scalar,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Binding::Matrix(object) => Value::Matrix(object.block.clone()),
            Binding::Scalar(scalar) => Value::Scalar(*scalar),
        }
    }
}

/// Matrix inputs pinned for one instruction execution.
///
/// Dropping the guard releases every pin it holds exactly once.
#[derive(Debug, Default)]
pub struct PinnedMatrices {
    entries: Vec<(usize, Arc<MatrixObject>)>,
}

impl PinnedMatrices {
    /// Number of pinned matrices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pinned blocks with their operand indices, in input order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &MatrixBlock)> + '_ {
        self.entries
            .iter()
            .map(|(index, object)| (*index, &object.block))
    }

    /// Pinned blocks in input order.
    pub fn blocks(&self) -> Vec<&MatrixBlock> {
        self.entries.iter().map(|(_, object)| &object.block).collect()
    }

    /// Release all pins now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PinnedMatrices {
    fn drop(&mut self) {
        for (_, object) in self.entries.drain(..) {
            object.unpin();
            trace!(name = %object.name, pins = object.pin_count(), "matrix released");
        }
    }
}

/// Name → value store shared by the instructions of one logical execution.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    bindings: RwLock<IndexMap<VarName, Binding>>,
}

impl ExecutionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<VarName, Binding>> {
        // A panic while holding the lock cannot leave the map half-updated:
        // every write is a single insert or remove.
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<VarName, Binding>> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pin every matrix-typed operand and return the blocks in input order.
    ///
    /// Scalar-typed operands are skipped. If any lookup fails, the pins taken
    /// so far in this call are released before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::UnboundVariable`] if a name has no binding.
    /// - [`ExecutionError::TypeMismatch`] if the binding is a scalar.
    pub fn resolve_matrices(&self, operands: &[Operand]) -> Result<PinnedMatrices> {
        let bindings = self.read();
        let mut pinned = PinnedMatrices::default();

        for (index, operand) in operands.iter().enumerate() {
            if !operand.is_matrix() {
                continue;
            }
            match bindings.get(operand.name.as_str()) {
                Some(Binding::Matrix(object)) => {
                    object.pin();
                    pinned.entries.push((index, Arc::clone(object)));
                }
                Some(other) => {
                    return Err(ExecutionError::TypeMismatch {
                        name: operand.name.clone(),
                        index,
                        expected: DataType::Matrix,
                        found: other.data_type(),
                    });
                }
                None => {
                    return Err(ExecutionError::UnboundVariable {
                        name: operand.name.clone(),
                        index,
                    });
                }
            }
        }
        Ok(pinned)
    }

    /// Resolve every scalar-typed operand, with its operand index.
    ///
    /// Literal operands are parsed from their text; variables are copied out
    /// of the context. Scalars are never pinned.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::UnboundVariable`] if a name has no binding.
    /// - [`ExecutionError::TypeMismatch`] if the binding is a matrix.
    /// - [`ExecutionError::InvalidLiteral`] for unparsable literal text.
    pub fn resolve_scalars(&self, operands: &[Operand]) -> Result<Vec<(usize, ScalarValue)>> {
        let bindings = self.read();
        let mut scalars = Vec::new();

        for (index, operand) in operands.iter().enumerate() {
            if !operand.is_scalar() {
                continue;
            }
            if operand.literal {
                scalars.push((index, operand.literal_value(index)?));
                continue;
            }
            match bindings.get(operand.name.as_str()) {
                Some(Binding::Scalar(scalar)) => scalars.push((index, *scalar)),
                Some(other) => {
                    return Err(ExecutionError::TypeMismatch {
                        name: operand.name.clone(),
                        index,
                        expected: DataType::Scalar,
                        found: other.data_type(),
                    });
                }
                None => {
                    return Err(ExecutionError::UnboundVariable {
                        name: operand.name.clone(),
                        index,
                    });
                }
            }
        }
        Ok(scalars)
    }

    /// Release matrices pinned by [`ExecutionContext::resolve_matrices`].
    pub fn release_matrices(&self, pinned: PinnedMatrices) {
        pinned.release();
    }

    /// Replace the binding for `name` with a fresh value.
    ///
    /// The previous value, if any, is detached from the name but stays
    /// intact for instructions that still pin it.
    pub fn bind_output(&self, name: &VarName, value: Value) {
        let binding = match value {
            Value::Matrix(block) => Binding::Matrix(Arc::new(MatrixObject::new(name.clone(), block))),
            Value::Scalar(scalar) => Binding::Scalar(scalar),
        };
        let previous = self.write().insert(name.clone(), binding);
        if let Some(Binding::Matrix(object)) = previous {
            let pins = object.pin_count();
            if pins > 0 {
                debug!(%name, pins, "rebound while pinned; superseded value kept for readers");
            }
        }
    }

    /// Bind an externally provided value (program inputs, initialization).
    pub fn set_variable(&self, name: impl Into<VarName>, value: Value) {
        let name = name.into();
        trace!(%name, data_type = %value.data_type(), "variable set");
        self.bind_output(&name, value);
    }

    /// Remove a binding, returning its value.
    ///
    /// A pinned matrix stays readable through the guards that pin it.
    pub fn remove_variable(&self, name: &str) -> Option<Value> {
        self.write()
            .shift_remove(name)
            .map(|binding| binding.to_value())
    }

    /// Current value bound to `name`.
    ///
    /// Matrix values are returned as cheap clones sharing storage with the
    /// binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().get(name).map(Binding::to_value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Pin count of the matrix currently bound to `name`.
    ///
    /// `None` if the name is unbound or bound to a scalar.
    pub fn pin_count(&self, name: &str) -> Option<usize> {
        match self.read().get(name) {
            Some(Binding::Matrix(object)) => Some(object.pin_count()),
            _ => None,
        }
    }

    /// Bound names in insertion order.
    pub fn names(&self) -> Vec<VarName> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
