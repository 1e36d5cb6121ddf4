//! Merge-based sparse × sparse dataflow (ExTensor-like)
//!
//! A is compressed by row and B by column, both keyed by the reduction
//! index `k`. Each output cell is the sorted-list intersection of A's run
//! for row `m` and B's run for column `n`.
//!
//! Both runs must be strictly ascending in `k`. With `validate_sorted` on
//! this is checked up front; with it off, unsorted input silently yields
//! wrong sums.

use std::cmp::Ordering;

use tracing::debug;

use crate::dataflow::expect_compressed;
use crate::error::Result;
use crate::matrix::{Axis, CompressedMatrix, DataflowConfig, DenseMatrix, KernelArgs};
use crate::parallel::{for_each_block, run_in_pool};
use crate::staging::{OutputAccumulator, StagedCompressed};

/// Multiplies row-compressed `A` by column-compressed `B`
///
/// # Errors
///
/// Besides the staging errors, returns `UnsortedSecondaryIndex` when
/// `config.validate_sorted` is set and a run is not strictly ascending.
pub fn merge_intersect(
    a: &CompressedMatrix,
    b: &CompressedMatrix,
    args: &KernelArgs,
    config: &DataflowConfig,
) -> Result<DenseMatrix> {
    config.validate()?;
    let KernelArgs {
        m_dim,
        k_dim,
        n_dim,
        mk_nnz,
        kn_nnz,
    } = *args;
    let storage = &config.storage;

    expect_compressed("A", a, Axis::Row, m_dim, k_dim)?;
    expect_compressed("B", b, Axis::Column, k_dim, n_dim)?;
    if config.validate_sorted {
        a.check_sorted("A")?;
        b.check_sorted("B")?;
    }
    debug!(
        m_dim,
        k_dim,
        n_dim,
        mk_nnz,
        kn_nnz,
        parallel = config.parallel,
        "merge start"
    );

    let local_a = StagedCompressed::load("A", a, m_dim, mk_nnz, storage.m_dim, storage.mk_nnz)?;
    let local_b = StagedCompressed::load("B", b, n_dim, kn_nnz, storage.n_dim, storage.kn_nnz)?;
    let mut local_o = OutputAccumulator::zeroed(m_dim, n_dim, storage)?;

    let num_macs = config.num_macs;
    let cells = local_o.cells_mut();

    run_in_pool(config, || {
        for_each_block(cells, num_macs * n_dim, config.parallel, |m_o, lane| {
            let lane_rows = lane.len() / n_dim;
            for n in 0..n_dim {
                let (b_idx, b_val) = local_b.slot(n);
                for m_i in 0..lane_rows {
                    let (a_idx, a_val) = local_a.slot(m_o * num_macs + m_i);
                    let cell = &mut lane[m_i * n_dim + n];
                    *cell = cell.wrapping_add(merge_dot(a_idx, a_val, b_idx, b_val));
                }
            }
        })
    })?;

    debug!("merge done");
    Ok(local_o.flatten())
}

/// Sparse dot product of two runs sorted ascending by index
///
/// Two cursors advance independently: on equal indices the product is
/// accumulated and both move, otherwise only the smaller one moves. Stops
/// when either run is exhausted.
pub fn merge_dot(a_idx: &[usize], a_val: &[i32], b_idx: &[usize], b_val: &[i32]) -> i32 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0i32;

    while i < a_idx.len() && j < b_idx.len() {
        match a_idx[i].cmp(&b_idx[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum = sum.wrapping_add(a_val[i].wrapping_mul(b_val[j]));
                i += 1;
                j += 1;
            }
        }
    }

    sum
}
