//! Conversions between dense and compressed representations
//!
//! Besides CSR/CSC, two traversal-order encodings are supported: a bitmask
//! with one presence bit per element, and run-length coding of zero runs.
//! Both walk the matrix row by row for [`Axis::Row`] and column by column
//! for [`Axis::Column`].

use crate::error::{DataflowError, Result};
use crate::matrix::{Axis, CompressedMatrix, DenseMatrix};

/// Compresses a dense matrix along `axis`, keeping nonzeros only
///
/// Secondary indices come out strictly ascending within every slot.
pub fn dense_to_compressed(dense: &DenseMatrix, axis: Axis) -> CompressedMatrix {
    let (primary, secondary) = match axis {
        Axis::Row => (dense.n_rows(), dense.n_cols()),
        Axis::Column => (dense.n_cols(), dense.n_rows()),
    };

    let mut ptr = Vec::with_capacity(primary + 1);
    let mut idx = Vec::new();
    let mut val = Vec::new();
    ptr.push(0);

    for p in 0..primary {
        for s in 0..secondary {
            let v = match axis {
                Axis::Row => dense.get(p, s),
                Axis::Column => dense.get(s, p),
            };
            if v != 0 {
                idx.push(s);
                val.push(v);
            }
        }
        ptr.push(idx.len());
    }

    // Structure is correct by construction
    CompressedMatrix::new(dense.n_rows(), dense.n_cols(), axis, ptr, idx, val)
        .unwrap_or_else(|e| unreachable!("dense compression produced invalid structure: {e}"))
}

/// Expands a compressed matrix into dense row-major form
///
/// Repeated indices within a slot are summed with wrapping arithmetic.
pub fn compressed_to_dense(matrix: &CompressedMatrix) -> DenseMatrix {
    let n_cols = matrix.n_cols();
    let mut data = vec![0i32; matrix.n_rows() * n_cols];

    for slot in 0..matrix.primary_dim() {
        for (secondary, value) in matrix.slot(slot) {
            let (r, c) = match matrix.axis() {
                Axis::Row => (slot, secondary),
                Axis::Column => (secondary, slot),
            };
            let cell = &mut data[r * n_cols + c];
            *cell = cell.wrapping_add(value);
        }
    }

    DenseMatrix::new(matrix.n_rows(), n_cols, data)
        .unwrap_or_else(|e| unreachable!("dense buffer sized from matrix dims: {e}"))
}

/// Nonzero values in traversal order plus one presence bit per element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmaskMatrix {
    n_rows: usize,
    n_cols: usize,
    axis: Axis,
    mask: Vec<bool>,
    val: Vec<i32>,
}

impl BitmaskMatrix {
    /// Creates a bitmask matrix, checking the mask length and the number of set bits
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        axis: Axis,
        mask: Vec<bool>,
        val: Vec<i32>,
    ) -> Result<Self> {
        if mask.len() != n_rows * n_cols {
            return Err(DataflowError::shape("bitmask length", n_rows * n_cols, mask.len()));
        }
        let set = mask.iter().filter(|&&bit| bit).count();
        if set != val.len() {
            return Err(DataflowError::shape("bitmask values", set, val.len()));
        }
        Ok(Self {
            n_rows,
            n_cols,
            axis,
            mask,
            val,
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn val(&self) -> &[i32] {
        &self.val
    }
}

/// Zero runs and values in traversal order
///
/// Each pair `(run, value)` skips `run` zeros and then stores `value`. A run
/// never exceeds `max_run`; longer gaps are split by storing an explicit zero.
/// Trailing zeros are not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLengthMatrix {
    n_rows: usize,
    n_cols: usize,
    axis: Axis,
    max_run: usize,
    pairs: Vec<(usize, i32)>,
}

impl RunLengthMatrix {
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        axis: Axis,
        max_run: usize,
        pairs: Vec<(usize, i32)>,
    ) -> Self {
        Self {
            n_rows,
            n_cols,
            axis,
            max_run,
            pairs,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn max_run(&self) -> usize {
        self.max_run
    }

    pub fn pairs(&self) -> &[(usize, i32)] {
        &self.pairs
    }
}

/// Encodes every element of `dense` as a presence bit, keeping nonzero values
pub fn dense_to_bitmask(dense: &DenseMatrix, axis: Axis) -> BitmaskMatrix {
    let mut mask = Vec::with_capacity(dense.n_rows() * dense.n_cols());
    let mut val = Vec::with_capacity(dense.nnz());
    for v in traversal(dense, axis) {
        mask.push(v != 0);
        if v != 0 {
            val.push(v);
        }
    }

    BitmaskMatrix {
        n_rows: dense.n_rows(),
        n_cols: dense.n_cols(),
        axis,
        mask,
        val,
    }
}

/// Expands a bitmask matrix into dense row-major form
pub fn bitmask_to_dense(matrix: &BitmaskMatrix) -> DenseMatrix {
    let mut dense = vec![0i32; matrix.n_rows * matrix.n_cols];
    let set = matrix.mask.iter().enumerate().filter(|&(_, &bit)| bit);
    for ((position, _), &value) in set.zip(&matrix.val) {
        let (r, c) = element_at(position, matrix.axis, matrix.n_rows, matrix.n_cols);
        dense[r * matrix.n_cols + c] = value;
    }

    DenseMatrix::new(matrix.n_rows, matrix.n_cols, dense)
        .unwrap_or_else(|e| unreachable!("dense buffer sized from matrix dims: {e}"))
}

/// Run-length encodes the zeros of `dense`, splitting runs longer than `max_run`
pub fn dense_to_rlc(dense: &DenseMatrix, axis: Axis, max_run: usize) -> RunLengthMatrix {
    let mut pairs = Vec::with_capacity(dense.nnz());
    let mut run = 0;
    for v in traversal(dense, axis) {
        if v != 0 {
            pairs.push((run, v));
            run = 0;
        } else if run == max_run {
            pairs.push((max_run, 0));
            run = 0;
        } else {
            run += 1;
        }
    }

    RunLengthMatrix::new(dense.n_rows(), dense.n_cols(), axis, max_run, pairs)
}

/// Expands a run-length encoded matrix into dense row-major form
///
/// # Errors
///
/// `IndexOutOfBounds` if the runs step past the last element.
pub fn rlc_to_dense(matrix: &RunLengthMatrix) -> Result<DenseMatrix> {
    let size = matrix.n_rows * matrix.n_cols;
    let mut dense = vec![0i32; size];
    let mut cursor = 0;
    for (pair, &(run, value)) in matrix.pairs.iter().enumerate() {
        cursor += run;
        if cursor >= size {
            return Err(DataflowError::IndexOutOfBounds {
                index: cursor,
                position: pair,
                bound: size,
            });
        }
        let (r, c) = element_at(cursor, matrix.axis, matrix.n_rows, matrix.n_cols);
        dense[r * matrix.n_cols + c] = value;
        cursor += 1;
    }

    DenseMatrix::new(matrix.n_rows, matrix.n_cols, dense)
}

/// Elements of `dense` in row-major order for `Row`, column-major for `Column`
fn traversal(dense: &DenseMatrix, axis: Axis) -> Box<dyn Iterator<Item = i32> + '_> {
    match axis {
        Axis::Row => Box::new(dense.as_slice().iter().copied()),
        Axis::Column => Box::new(
            (0..dense.n_cols())
                .flat_map(move |c| (0..dense.n_rows()).map(move |r| dense.get(r, c))),
        ),
    }
}

/// Row and column of the `position`-th element in traversal order
fn element_at(position: usize, axis: Axis, n_rows: usize, n_cols: usize) -> (usize, usize) {
    match axis {
        Axis::Row => (position / n_cols, position % n_cols),
        Axis::Column => (position % n_rows, position / n_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DenseMatrix {
        DenseMatrix::from_rows(&[[1, 0, 2], [0, 0, 0], [0, 3, 4]]).unwrap()
    }

    #[test]
    fn test_dense_to_csr() {
        let csr = dense_to_compressed(&sample(), Axis::Row);
        assert_eq!(csr.ptr(), &[0, 2, 2, 4]);
        assert_eq!(csr.idx(), &[0, 2, 1, 2]);
        assert_eq!(csr.val(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_dense_to_csc() {
        let csc = dense_to_compressed(&sample(), Axis::Column);
        assert_eq!(csc.ptr(), &[0, 1, 2, 4]);
        assert_eq!(csc.idx(), &[0, 2, 0, 2]);
        assert_eq!(csc.val(), &[1, 3, 2, 4]);
        assert!(csc.is_sorted());
    }

    #[test]
    fn test_compressed_to_dense_both_axes() {
        let dense = sample();
        for axis in [Axis::Row, Axis::Column] {
            assert_eq!(compressed_to_dense(&dense_to_compressed(&dense, axis)), dense);
        }
    }

    #[test]
    fn test_duplicates_are_summed() {
        let m = CompressedMatrix::csr(1, 2, vec![0, 3], vec![1, 0, 1], vec![2, 5, 3]).unwrap();
        let dense = compressed_to_dense(&m);
        assert_eq!(dense.row(0), &[5, 5]);
    }

    #[test]
    fn test_bitmask_follows_axis() {
        let rows = dense_to_bitmask(&sample(), Axis::Row);
        let bits: Vec<u8> = rows.mask().iter().map(|&b| u8::from(b)).collect();
        assert_eq!(bits, vec![1, 0, 1, 0, 0, 0, 0, 1, 1]);
        assert_eq!(rows.val(), &[1, 2, 3, 4]);

        let cols = dense_to_bitmask(&sample(), Axis::Column);
        let bits: Vec<u8> = cols.mask().iter().map(|&b| u8::from(b)).collect();
        assert_eq!(bits, vec![1, 0, 0, 0, 0, 1, 1, 0, 1]);
        assert_eq!(cols.val(), &[1, 3, 2, 4]);

        for m in [rows, cols] {
            assert_eq!(bitmask_to_dense(&m), sample());
        }
    }

    #[test]
    fn test_bitmask_new_checks_counts() {
        assert!(BitmaskMatrix::new(1, 2, Axis::Row, vec![true, false], vec![7]).is_ok());
        assert!(BitmaskMatrix::new(1, 2, Axis::Row, vec![true], vec![7]).is_err());
        assert!(BitmaskMatrix::new(1, 2, Axis::Row, vec![true, true], vec![7]).is_err());
    }

    #[test]
    fn test_rlc_splits_long_runs() {
        // Row order: 1 0 2 0 0 0 0 3 4
        let rlc = dense_to_rlc(&sample(), Axis::Row, 2);
        assert_eq!(rlc.pairs(), &[(0, 1), (1, 2), (2, 0), (1, 3), (0, 4)]);
        assert_eq!(rlc_to_dense(&rlc).unwrap(), sample());

        // Column order: 1 0 0 0 0 3 2 0 4
        let rlc = dense_to_rlc(&sample(), Axis::Column, 7);
        assert_eq!(rlc.pairs(), &[(0, 1), (4, 3), (0, 2), (1, 4)]);
        assert_eq!(rlc_to_dense(&rlc).unwrap(), sample());
    }

    #[test]
    fn test_rlc_drops_trailing_zeros() {
        let dense = DenseMatrix::from_rows(&[[5, 0], [0, 0]]).unwrap();
        let rlc = dense_to_rlc(&dense, Axis::Row, 1);
        assert_eq!(rlc.pairs(), &[(0, 5), (1, 0)]);
        assert_eq!(rlc_to_dense(&rlc).unwrap(), dense);
    }

    #[test]
    fn test_rlc_past_the_end_is_rejected() {
        let rlc = RunLengthMatrix::new(2, 2, Axis::Row, 4, vec![(1, 3), (2, 9)]);
        let err = rlc_to_dense(&rlc).unwrap_err();
        assert!(matches!(
            err,
            DataflowError::IndexOutOfBounds { index: 4, position: 1, bound: 4 }
        ));
    }
}
