//! Dense Matrix Kernels
//!
//! Reference implementations of the two n-ary kernels the runtime dispatches
//! to: concatenation and element-wise min/max. Both are pure and
//! deterministic, which lineage-based reuse depends on.
//!
//! Shape requirements are asserted, not reported: callers validate shapes
//! and turn mismatches into execution errors before reaching these kernels.

use crate::matrix::MatrixBlock;
use crate::operators::{AppendAxis, NaryFn};

/// Concatenate `first` with every block in `rest`, in order.
///
/// `AppendAxis::Columns` places blocks side by side (all must share the row
/// count); `AppendAxis::Rows` stacks them (all must share the column count).
///
/// # Panics
///
/// Panics if the shapes are incompatible with `axis`.
pub fn append(first: &MatrixBlock, rest: &[&MatrixBlock], axis: AppendAxis) -> MatrixBlock {
    match axis {
        AppendAxis::Columns => append_columns(first, rest),
        AppendAxis::Rows => append_rows(first, rest),
    }
}

fn append_columns(first: &MatrixBlock, rest: &[&MatrixBlock]) -> MatrixBlock {
    let rows = first.rows();
    for (index, block) in rest.iter().enumerate() {
        assert_eq!(
            block.rows(),
            rows,
            "cbind input {} has {} rows, expected {}",
            index + 1,
            block.rows(),
            rows
        );
    }
    let cols = first.cols() + rest.iter().map(|b| b.cols()).sum::<usize>();

    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        data.extend_from_slice(first.row(row));
        for block in rest {
            data.extend_from_slice(block.row(row));
        }
    }
    MatrixBlock::from_vec(rows, cols, data)
}

fn append_rows(first: &MatrixBlock, rest: &[&MatrixBlock]) -> MatrixBlock {
    let cols = first.cols();
    for (index, block) in rest.iter().enumerate() {
        assert_eq!(
            block.cols(),
            cols,
            "rbind input {} has {} columns, expected {}",
            index + 1,
            block.cols(),
            cols
        );
    }
    let rows = first.rows() + rest.iter().map(|b| b.rows()).sum::<usize>();

    let mut data = Vec::with_capacity(rows * cols);
    data.extend_from_slice(first.data());
    for block in rest {
        data.extend_from_slice(block.data());
    }
    MatrixBlock::from_vec(rows, cols, data)
}

/// Element-wise reduction of `func` across all matrices and scalars.
///
/// Every scalar is broadcast to every cell. With no matrices the result is a
/// 1×1 block reducing the scalars alone. With no inputs at all the result is
/// a 1×1 block holding the identity of `func`.
///
/// # Panics
///
/// Panics if the matrices do not all share one shape.
pub fn nary_reduce(func: NaryFn, matrices: &[&MatrixBlock], scalars: &[f64]) -> MatrixBlock {
    let scalar_acc = scalars
        .iter()
        .fold(func.identity(), |acc, s| func.apply(acc, *s));

    let Some(first) = matrices.first() else {
        return MatrixBlock::scalar(scalar_acc);
    };

    let (rows, cols) = first.shape();
    for (index, block) in matrices.iter().enumerate().skip(1) {
        assert_eq!(
            block.shape(),
            (rows, cols),
            "reduce input {} has shape {:?}, expected {:?}",
            index,
            block.shape(),
            (rows, cols)
        );
    }

    let data = (0..rows * cols)
        .map(|cell| {
            matrices
                .iter()
                .fold(scalar_acc, |acc, block| func.apply(acc, block.data()[cell]))
        })
        .collect();
    MatrixBlock::from_vec(rows, cols, data)
}
