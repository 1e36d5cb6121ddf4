//! Reference implementation of dense matrix multiplication
//!
//! This provides a baseline for correctness testing of every dataflow.
//! It is the plain triple loop with wrapping 32-bit accumulation.

use crate::error::{DataflowError, Result};
use crate::matrix::DenseMatrix;

/// Multiplies two dense matrices with the textbook i-j-k loop
///
/// Not optimized; used as the oracle the dataflows are checked against.
pub fn reference_matmul(a: &DenseMatrix, b: &DenseMatrix) -> Result<DenseMatrix> {
    if a.n_cols() != b.n_rows() {
        return Err(DataflowError::shape("reduction dimension", a.n_cols(), b.n_rows()));
    }

    let (m_dim, k_dim, n_dim) = (a.n_rows(), a.n_cols(), b.n_cols());
    let mut out = vec![0i32; m_dim * n_dim];

    for i in 0..m_dim {
        for j in 0..n_dim {
            let mut sum = 0i32;
            for k in 0..k_dim {
                sum = sum.wrapping_add(a.get(i, k).wrapping_mul(b.get(k, j)));
            }
            out[i * n_dim + j] = sum;
        }
    }

    DenseMatrix::new(m_dim, n_dim, out)
}
