//! Dense matrix blocks.
//!
//! A [`MatrixBlock`] stores its cells row-major in an `Arc<[f64]>`. Cloning a
//! block only bumps the reference count; [`MatrixBlock::set`] goes through
//! `Arc::make_mut`, so every holder of an earlier clone keeps seeing the
//! original cells. The execution context relies on this: a binding is
//! replaced by a new block, never written in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::stable_hash::{fnv1a64_f64, fnv1a64_u64, FNV1A_OFFSET_BASIS_64};

/// Fixed per-block overhead used by [`MatrixBlock::in_memory_size`].
pub const BLOCK_HEADER_BYTES: usize = 44;

/// Dense two-dimensional block of `f64` cells.
#[derive(Clone, Debug)]
pub struct MatrixBlock {
    rows: usize,
    cols: usize,
    data: Arc<[f64]>,
}

impl Serialize for MatrixBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("MatrixBlock", 3)?;
        state.serialize_field("rows", &self.rows)?;
        state.serialize_field("cols", &self.cols)?;
        state.serialize_field("data", self.data.as_ref())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for MatrixBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            rows: usize,
            cols: usize,
            data: Vec<f64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let len = raw.rows.checked_mul(raw.cols).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "dimensions {}×{} overflow the cell count",
                raw.rows, raw.cols
            ))
        })?;
        if raw.data.len() != len {
            return Err(serde::de::Error::custom(format!(
                "data length {} does not match dimensions {}×{}",
                raw.data.len(),
                raw.rows,
                raw.cols
            )));
        }
        Ok(MatrixBlock {
            rows: raw.rows,
            cols: raw.cols,
            data: raw.data.into(),
        })
    }
}

impl MatrixBlock {
    /// Create a block filled with zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a block with every cell set to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        let data: Arc<[f64]> = vec![value; cell_count(rows, cols)].into();
        Self { rows, cols, data }
    }

    /// Create a block from row-major data (moves data).
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows or `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            cell_count(rows, cols),
            "Data length {} does not match dimensions {}×{}",
            data.len(),
            rows,
            cols
        );
        Self {
            rows,
            cols,
            data: data.into(),
        }
    }

    /// Create a block from a list of equally long rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows have different lengths.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            assert_eq!(
                row.len(),
                cols,
                "Row {} has {} columns, expected {}",
                index,
                row.len(),
                cols
            );
            data.extend_from_slice(row);
        }
        Self::from_vec(rows.len(), cols, data)
    }

    /// A 1×1 block holding `value`.
    pub fn scalar(value: f64) -> Self {
        Self::filled(1, 1, value)
    }

    /// Get the cell at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(
            row < self.rows && col < self.cols,
            "Index ({}, {}) out of bounds for {}×{} block",
            row,
            col,
            self.rows,
            self.cols
        );
        self.data[row * self.cols + col]
    }

    /// Set the cell at (row, col) using copy-on-write.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(
            row < self.rows && col < self.cols,
            "Index ({}, {}) out of bounds for {}×{} block",
            row,
            col,
            self.rows,
            self.cols
        );
        Arc::make_mut(&mut self.data)[row * self.cols + col] = value;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major cell slice.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Cells of one row.
    pub fn row(&self, row: usize) -> &[f64] {
        assert!(row < self.rows, "Row {} out of bounds for {} rows", row, self.rows);
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Exact number of non-zero cells. NaN counts as non-zero.
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|v| **v != 0.0).count()
    }

    /// Fraction of non-zero cells, `0.0` for an empty block.
    pub fn sparsity(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.nnz() as f64 / self.len() as f64
        }
    }

    /// Approximate dense in-memory footprint in bytes.
    pub fn in_memory_size(&self) -> usize {
        BLOCK_HEADER_BYTES + self.len() * std::mem::size_of::<f64>()
    }

    /// Bitwise equality: same shape and identical bit patterns in every cell.
    ///
    /// Unlike `==`, two NaN cells with the same payload compare equal.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    /// Stable FNV-1a hash of the shape and the bit pattern of every cell.
    pub fn content_hash(&self) -> u64 {
        let mut hash = fnv1a64_u64(FNV1A_OFFSET_BASIS_64, self.rows as u64);
        hash = fnv1a64_u64(hash, self.cols as u64);
        self.data.iter().fold(hash, |hash, v| fnv1a64_f64(hash, *v))
    }

    /// True when both blocks share the same cell storage.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

fn cell_count(rows: usize, cols: usize) -> usize {
    rows.checked_mul(cols)
        .unwrap_or_else(|| panic!("Dimensions {}×{} overflow the cell count", rows, cols))
}

impl PartialEq for MatrixBlock {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.data.as_ref() == other.data.as_ref()
    }
}

impl fmt::Display for MatrixBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix({}×{}) [", self.rows, self.cols)?;
        for row in 0..self.rows {
            if row > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for col in 0..self.cols {
                if col > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.get(row, col))?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
