//! Utilities for converting between our matrix formats and external libraries

use sprs::CsMat;

use crate::error::Result;
use crate::matrix::{Axis, CompressedMatrix};

/// Converts a compressed matrix to sprs `CsMat`, keeping its orientation
///
/// sprs requires strictly ascending indices within every slot, so unsorted
/// input is rejected with `UnsortedSecondaryIndex` rather than panicking
/// inside sprs.
pub fn to_sprs(matrix: &CompressedMatrix) -> Result<CsMat<i32>> {
    matrix.check_sorted("sprs export")?;

    let shape = (matrix.n_rows(), matrix.n_cols());
    let (ptr, idx, val) = (
        matrix.ptr().to_vec(),
        matrix.idx().to_vec(),
        matrix.val().to_vec(),
    );

    Ok(match matrix.axis() {
        Axis::Row => CsMat::new(shape, ptr, idx, val),
        Axis::Column => CsMat::new_csc(shape, ptr, idx, val),
    })
}

/// Converts a sprs `CsMat` into our format, keeping its orientation
pub fn from_sprs(matrix: CsMat<i32>) -> Result<CompressedMatrix> {
    let axis = if matrix.is_csr() { Axis::Row } else { Axis::Column };
    let (n_rows, n_cols) = matrix.shape();
    let (ptr, idx, val) = matrix.into_raw_storage();

    CompressedMatrix::new(n_rows, n_cols, axis, ptr, idx, val)
}
