//! Dense row-major sample matrix.
//!
//! Every sample array in popclass-rs is a [`Matrix`] with shape
//! `(n_samples, n_parameters)`: one row per sample, one column per parameter.
//! Column selection returns a new matrix with columns in the caller-requested
//! order, which is how parameter alignment is materialized.

use crate::{Error, Result};

/// Row-major `f64` matrix with shape `(rows, cols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a matrix from a row-major flat buffer.
    pub fn from_flat(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::Validation(format!(
                "Matrix buffer length mismatch: expected {} ({rows}x{cols}), got {}",
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a matrix from per-sample rows. All rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::Validation(format!(
                    "Matrix row length mismatch: row {i} has {} values, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self { data, rows: n_rows, cols: n_cols })
    }

    /// Create a matrix from per-parameter columns. All columns must have equal length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let n_cols = columns.len();
        let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        for (j, col) in columns.iter().enumerate() {
            if col.len() != n_rows {
                return Err(Error::Validation(format!(
                    "Matrix column length mismatch: column {j} has {} values, expected {n_rows}",
                    col.len()
                )));
            }
        }
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for i in 0..n_rows {
            for col in columns {
                data.push(col[i]);
            }
        }
        Ok(Self { data, rows: n_rows, cols: n_cols })
    }

    /// Number of rows (samples).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (parameters).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// One sample as a contiguous slice of length `cols`.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Iterator over sample rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Materialize one column.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, col)).collect()
    }

    /// Underlying row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// True if any stored value is NaN.
    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|x| x.is_nan())
    }

    /// True if every stored value is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// New matrix holding the given columns of `self`, in the given order.
    ///
    /// Indices may repeat or reorder; each must be within `cols`.
    pub fn select_columns(&self, indices: &[usize]) -> Result<Self> {
        for &idx in indices {
            if idx >= self.cols {
                return Err(Error::Validation(format!(
                    "column index out of range: {idx} >= {}",
                    self.cols
                )));
            }
        }
        let mut data = Vec::with_capacity(self.rows * indices.len());
        for i in 0..self.rows {
            let row = self.row(i);
            for &idx in indices {
                data.push(row[idx]);
            }
        }
        Ok(Self { data, rows: self.rows, cols: indices.len() })
    }

    /// Stack matrices vertically. All inputs must share a column count.
    pub fn vstack(parts: &[&Matrix]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(Error::Validation("vstack requires at least one matrix".into()));
        };
        let cols = first.cols;
        let mut data = Vec::new();
        let mut rows = 0;
        for (i, m) in parts.iter().enumerate() {
            if m.cols != cols {
                return Err(Error::Validation(format!(
                    "vstack column mismatch: part {i} has {} columns, expected {cols}",
                    m.cols
                )));
            }
            data.extend_from_slice(&m.data);
            rows += m.rows;
        }
        Ok(Self { data, rows, cols })
    }
}
