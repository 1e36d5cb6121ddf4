//! Dense row-major matrix format

use std::fmt;

use ndarray::Array2;

use crate::error::{DataflowError, Result};

/// A dense matrix of 32-bit signed integers stored in row-major order
///
/// `data[r * n_cols + c]` holds the element at row `r`, column `c`.
/// The length of `data` always equals `n_rows * n_cols`.
#[derive(Clone, PartialEq, Eq)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<i32>,
}

impl DenseMatrix {
    /// Creates a new dense matrix from row-major data
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `data.len() != n_rows * n_cols`.
    pub fn new(n_rows: usize, n_cols: usize, data: Vec<i32>) -> Result<Self> {
        let expected = n_rows * n_cols;
        if data.len() != expected {
            return Err(DataflowError::shape("dense data length", expected, data.len()));
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
        })
    }

    /// Creates an all-zero matrix
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0; n_rows * n_cols],
        }
    }

    /// Builds a matrix from a slice of equally sized rows
    pub fn from_rows<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(DataflowError::shape("dense row length", n_cols, row.len()));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Returns the element at (`row`, `col`)
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the matrix.
    pub fn get(&self, row: usize, col: usize) -> i32 {
        assert!(row < self.n_rows && col < self.n_cols, "position out of bounds");
        self.data[row * self.n_cols + col]
    }

    /// Returns row `row` as a slice
    pub fn row(&self, row: usize) -> &[i32] {
        let start = row * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<i32> {
        self.data
    }

    /// Number of nonzero elements
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Copies the matrix into an `ndarray::Array2`
    pub fn to_ndarray(&self) -> Array2<i32> {
        Array2::from_shape_fn((self.n_rows, self.n_cols), |(r, c)| {
            self.data[r * self.n_cols + c]
        })
    }

    /// Copies an `ndarray::Array2` regardless of its memory order
    pub fn from_ndarray(array: &Array2<i32>) -> Self {
        let (n_rows, n_cols) = array.dim();
        Self {
            n_rows,
            n_cols,
            data: array.iter().copied().collect(),
        }
    }
}

impl fmt::Debug for DenseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DenseMatrix {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;

        let max_rows_to_print = 8.min(self.n_rows);
        let max_cols_to_print = 8.min(self.n_cols);

        for i in 0..max_rows_to_print {
            write!(f, "    ")?;
            for v in &self.row(i)[..max_cols_to_print] {
                write!(f, "{:>6}", v)?;
            }
            if self.n_cols > max_cols_to_print {
                write!(f, " ...")?;
            }
            writeln!(f)?;
        }

        if self.n_rows > max_rows_to_print {
            writeln!(f, "    ... ({} more rows)", self.n_rows - max_rows_to_print)?;
        }

        write!(f, "}}")
    }
}
