//! Gather-accumulate sparse × sparse dataflow (MatRaptor-like)
//!
//! A is compressed along the reduction axis (for each `k`, the rows `m`
//! holding a nonzero) and B by column. For every output column `n`, each
//! nonzero `(k, b)` of B's column is broadcast over A's run for `k`,
//! adding `a * b` into `O[m][n]`. There is no intersection test, so run
//! order does not matter.

use tracing::debug;

use crate::dataflow::expect_compressed;
use crate::error::Result;
use crate::matrix::{Axis, CompressedMatrix, DataflowConfig, DenseMatrix, KernelArgs};
use crate::parallel::{map_indices, run_in_pool};
use crate::staging::{OutputAccumulator, StagedCompressed};

/// Multiplies `A` compressed by column (`ptr` over `k`) by column-compressed `B`
pub fn gather_accumulate(
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

    expect_compressed("A", a, Axis::Column, m_dim, k_dim)?;
    expect_compressed("B", b, Axis::Column, k_dim, n_dim)?;
    debug!(
        m_dim,
        k_dim,
        n_dim,
        mk_nnz,
        kn_nnz,
        parallel = config.parallel,
        "gather start"
    );

    let local_a = StagedCompressed::load("A", a, k_dim, mk_nnz, storage.k_dim, storage.mk_nnz)?;
    let local_b = StagedCompressed::load("B", b, n_dim, kn_nnz, storage.n_dim, storage.kn_nnz)?;
    let mut local_o = OutputAccumulator::zeroed(m_dim, n_dim, storage)?;

    // Output columns are strided in the row-major accumulator, so each lane
    // of columns is gathered into its own buffer and scattered after the join.
    let num_macs = config.num_macs;
    let n_lanes = n_dim.div_ceil(num_macs);
    let lanes = run_in_pool(config, || {
        map_indices(n_lanes, config.parallel, |n_o| {
            let first = n_o * num_macs;
            let last = (first + num_macs).min(n_dim);
            (first..last)
                .map(|n| gather_column(&local_a, &local_b, n, m_dim))
                .collect::<Vec<_>>()
        })
    })?;

    for (n_o, lane) in lanes.into_iter().enumerate() {
        for (n_i, column) in lane.into_iter().enumerate() {
            let n = n_o * num_macs + n_i;
            for (m, value) in column.into_iter().enumerate() {
                local_o.add(m, n, value);
            }
        }
    }

    debug!("gather done");
    Ok(local_o.flatten())
}

/// Accumulates output column `n` by broadcasting each B nonzero over A's run
fn gather_column(a: &StagedCompressed, b: &StagedCompressed, n: usize, m_dim: usize) -> Vec<i32> {
    let mut column = vec![0i32; m_dim];
    let (b_idx, b_val) = b.slot(n);

    for (&k, &b_value) in b_idx.iter().zip(b_val) {
        let (a_rows, a_val) = a.slot(k);
        for (&m, &a_value) in a_rows.iter().zip(a_val) {
            column[m] = column[m].wrapping_add(a_value.wrapping_mul(b_value));
        }
    }

    column
}
