//! Capacity-bounded staging buffers
//!
//! Every dataflow copies its operands into fixed-size local buffers before
//! computing, and accumulates into a fixed-size output buffer. Capacities
//! come from [`StorageConfig`]; a load that does not fit fails with
//! `CapacityExceeded` instead of growing the buffer.

use num_traits::Zero;
use tracing::trace;

use crate::error::{DataflowError, Result};
use crate::matrix::{CompressedMatrix, DenseMatrix, StorageConfig};

/// A fixed-capacity local copy of one operand array
#[derive(Debug)]
pub struct StagingBuffer<T> {
    data: Box<[T]>,
    len: usize,
}

impl<T: Copy + Zero> StagingBuffer<T> {
    /// Allocates `capacity` zeroed slots, of which the first `len` are in use
    pub fn zeroed(name: &str, len: usize, capacity: usize) -> Result<Self> {
        if len > capacity {
            return Err(DataflowError::CapacityExceeded {
                buffer: name.to_string(),
                requested: len,
                capacity,
            });
        }
        Ok(Self {
            data: vec![T::zero(); capacity].into_boxed_slice(),
            len,
        })
    }

    /// Copies the first `declared` elements of `src` into a buffer of `capacity`
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if `declared > capacity`
    /// - `ShapeMismatch` if `src` holds fewer than `declared` elements
    pub fn load(name: &str, src: &[T], declared: usize, capacity: usize) -> Result<Self> {
        let mut buffer = Self::zeroed(name, declared, capacity)?;
        if src.len() < declared {
            return Err(DataflowError::shape("staged source length", declared, src.len()));
        }
        buffer.data[..declared].copy_from_slice(&src[..declared]);
        trace!(buffer = name, declared, capacity, "staged");
        Ok(buffer)
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data[..self.len]
    }
}

/// A dense operand staged with per-dimension bounds
#[derive(Debug)]
pub struct StagedDense {
    rows: usize,
    cols: usize,
    cells: StagingBuffer<i32>,
}

impl StagedDense {
    /// Stages a `rows × cols` dense operand into a `row_cap × col_cap` buffer
    pub fn load(
        name: &str,
        matrix: &DenseMatrix,
        rows: usize,
        cols: usize,
        row_cap: usize,
        col_cap: usize,
    ) -> Result<Self> {
        check_bound(&format!("{name} rows"), rows, row_cap)?;
        check_bound(&format!("{name} cols"), cols, col_cap)?;
        if matrix.n_rows() != rows {
            return Err(DataflowError::shape("dense operand rows", rows, matrix.n_rows()));
        }
        if matrix.n_cols() != cols {
            return Err(DataflowError::shape("dense operand cols", cols, matrix.n_cols()));
        }

        let cells = StagingBuffer::load(name, matrix.as_slice(), rows * cols, row_cap * col_cap)?;
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.cells.as_slice()[row * self.cols + col]
    }

    /// Element at (`row`, `col`), or zero outside the declared shape
    #[inline]
    pub fn get_masked(&self, row: usize, col: usize) -> i32 {
        if row < self.rows && col < self.cols {
            self.get(row, col)
        } else {
            0
        }
    }
}

/// A compressed operand staged as separate pointer, index and value buffers
#[derive(Debug)]
pub struct StagedCompressed {
    ptr: StagingBuffer<usize>,
    idx: StagingBuffer<usize>,
    val: StagingBuffer<i32>,
}

impl StagedCompressed {
    /// Stages `primary + 1` pointers and `declared_nnz` index/value pairs
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if `primary > primary_cap` or `declared_nnz > nnz_cap`
    /// - `ShapeMismatch` if the matrix disagrees with the declared counts
    pub fn load(
        name: &str,
        matrix: &CompressedMatrix,
        primary: usize,
        declared_nnz: usize,
        primary_cap: usize,
        nnz_cap: usize,
    ) -> Result<Self> {
        if matrix.primary_dim() != primary {
            return Err(DataflowError::shape(
                "compressed primary dimension",
                primary,
                matrix.primary_dim(),
            ));
        }

        let ptr = StagingBuffer::load(
            &format!("{name}.ptr"),
            matrix.ptr(),
            primary + 1,
            primary_cap + 1,
        )?;
        let idx =
            StagingBuffer::load(&format!("{name}.idx"), matrix.idx(), declared_nnz, nnz_cap)?;
        let val =
            StagingBuffer::load(&format!("{name}.val"), matrix.val(), declared_nnz, nnz_cap)?;

        let end = ptr.as_slice()[primary];
        if end != declared_nnz {
            return Err(DataflowError::shape("declared nonzero count", declared_nnz, end));
        }

        Ok(Self { ptr, idx, val })
    }

    pub fn nnz(&self) -> usize {
        self.val.len()
    }

    /// Entries of `slot` as parallel index/value slices
    #[inline]
    pub fn slot(&self, slot: usize) -> (&[usize], &[i32]) {
        let ptr = self.ptr.as_slice();
        let range = ptr[slot]..ptr[slot + 1];
        (&self.idx.as_slice()[range.clone()], &self.val.as_slice()[range])
    }
}

/// Dense `m × n` output accumulator, zeroed at allocation
#[derive(Debug)]
pub struct OutputAccumulator {
    n_rows: usize,
    n_cols: usize,
    cells: StagingBuffer<i32>,
}

impl OutputAccumulator {
    /// Allocates a zeroed accumulator within the configured output capacity
    pub fn zeroed(n_rows: usize, n_cols: usize, storage: &StorageConfig) -> Result<Self> {
        check_bound("O rows", n_rows, storage.m_dim)?;
        check_bound("O cols", n_cols, storage.n_dim)?;
        let cells = StagingBuffer::zeroed("O", n_rows * n_cols, storage.m_dim * storage.n_dim)?;
        Ok(Self {
            n_rows,
            n_cols,
            cells,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.cells.as_slice()[row * self.n_cols + col]
    }

    /// Adds `value` into (`row`, `col`) with wrapping arithmetic
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: i32) {
        let n_cols = self.n_cols;
        let cell = &mut self.cells.as_mut_slice()[row * n_cols + col];
        *cell = cell.wrapping_add(value);
    }

    /// Row-major cells, `n_cols` per row
    pub fn cells_mut(&mut self) -> &mut [i32] {
        self.cells.as_mut_slice()
    }

    /// Consumes the accumulator into a dense row-major result
    pub fn flatten(self) -> DenseMatrix {
        let (n_rows, n_cols) = (self.n_rows, self.n_cols);
        DenseMatrix::new(n_rows, n_cols, self.cells.as_slice().to_vec())
            .unwrap_or_else(|e| unreachable!("accumulator sized from its dims: {e}"))
    }

    /// Writes the result into an external row-major buffer of exactly `m × n`
    pub fn flatten_into(&self, out: &mut [i32]) -> Result<()> {
        let cells = self.cells.as_slice();
        if out.len() != cells.len() {
            return Err(DataflowError::shape("output buffer length", cells.len(), out.len()));
        }
        out.copy_from_slice(cells);
        Ok(())
    }
}

fn check_bound(buffer: &str, requested: usize, capacity: usize) -> Result<()> {
    if requested > capacity {
        return Err(DataflowError::CapacityExceeded {
            buffer: buffer.to_string(),
            requested,
            capacity,
        });
    }
    Ok(())
}
