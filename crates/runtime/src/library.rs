//! Matrix operator library seam.
//!
//! The executor never computes cells itself; it calls a [`MatrixLibrary`].
//! Implementations must be deterministic: identical inputs give bit-identical
//! outputs, otherwise lineage-based reuse would return results that a fresh
//! execution could not reproduce.

use mtx_foundation::{matrix_ops, AppendAxis, MatrixBlock, NaryFn, ScalarValue};

/// Numeric kernels used by the n-ary handlers.
///
/// Handlers validate shapes before calling in, so implementations may treat
/// incompatible shapes as a programming error.
pub trait MatrixLibrary: Send + Sync {
    /// Concatenate `first` with `rest`, in order, along `axis`.
    fn append(&self, first: &MatrixBlock, rest: &[&MatrixBlock], axis: AppendAxis)
        -> MatrixBlock;

    /// Element-wise `func` across all matrices, broadcasting every scalar.
    fn nary_reduce(
        &self,
        func: NaryFn,
        matrices: &[&MatrixBlock],
        scalars: &[ScalarValue],
    ) -> MatrixBlock;
}

/// Dense in-memory kernels from [`mtx_foundation::matrix_ops`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLibrary;

impl MatrixLibrary for DenseLibrary {
    fn append(
        &self,
        first: &MatrixBlock,
        rest: &[&MatrixBlock],
        axis: AppendAxis,
    ) -> MatrixBlock {
        matrix_ops::append(first, rest, axis)
    }

    fn nary_reduce(
        &self,
        func: NaryFn,
        matrices: &[&MatrixBlock],
        scalars: &[ScalarValue],
    ) -> MatrixBlock {
        let scalars: Vec<f64> = scalars.iter().map(ScalarValue::as_f64).collect();
        matrix_ops::nary_reduce(func, matrices, &scalars)
    }
}
