//! Weight-stationary sparse × dense dataflow (EIE-like)
//!
//! A is compressed by row and held stationary; B is dense. Output rows are
//! processed in lanes of `num_macs`. For every output column, each row in
//! the lane walks its own nonzero run and accumulates
//! `val[z] * B[idx[z]][n]`.

use tracing::debug;

use crate::dataflow::expect_compressed;
use crate::error::Result;
use crate::matrix::{Axis, CompressedMatrix, DataflowConfig, DenseMatrix, KernelArgs};
use crate::parallel::{for_each_block, run_in_pool};
use crate::staging::{OutputAccumulator, StagedCompressed, StagedDense};

/// Multiplies row-compressed `A` (`m_dim × k_dim`, `mk_nnz` entries) by dense `B`
///
/// Rows of `A` with no entries produce zero rows in the output.
pub fn weight_stationary(
    a: &CompressedMatrix,
    b: &DenseMatrix,
    args: &KernelArgs,
    config: &DataflowConfig,
) -> Result<DenseMatrix> {
    config.validate()?;
    let KernelArgs {
        m_dim,
        k_dim,
        n_dim,
        mk_nnz,
        ..
    } = *args;
    let storage = &config.storage;

    expect_compressed("A", a, Axis::Row, m_dim, k_dim)?;
    debug!(
        m_dim,
        k_dim,
        n_dim,
        mk_nnz,
        num_macs = config.num_macs,
        parallel = config.parallel,
        "weight-stationary start"
    );

    let local_a = StagedCompressed::load("A", a, m_dim, mk_nnz, storage.m_dim, storage.mk_nnz)?;
    let local_b = StagedDense::load("B", b, k_dim, n_dim, storage.k_dim, storage.n_dim)?;
    let mut local_o = OutputAccumulator::zeroed(m_dim, n_dim, storage)?;

    let num_macs = config.num_macs;
    let cells = local_o.cells_mut();

    run_in_pool(config, || {
        for_each_block(cells, num_macs * n_dim, config.parallel, |m_o, lane| {
            compute_lane(&local_a, &local_b, lane, m_o * num_macs, n_dim);
        })
    })?;

    debug!("weight-stationary done");
    Ok(local_o.flatten())
}

/// Computes one lane of rows starting at `m_base`
fn compute_lane(
    a: &StagedCompressed,
    b: &StagedDense,
    lane: &mut [i32],
    m_base: usize,
    n_dim: usize,
) {
    let lane_rows = lane.len() / n_dim;

    for n in 0..n_dim {
        for m_i in 0..lane_rows {
            let (idx, val) = a.slot(m_base + m_i);
            if idx.is_empty() {
                // Empty run: the zeroed cell is already the answer
                continue;
            }
            // The running sum restarts at the first nonzero of the run,
            // whatever reduction index that nonzero carries
            let mut sum = 0i32;
            for (&k, &v) in idx.iter().zip(val) {
                sum = sum.wrapping_add(v.wrapping_mul(b.get(k, n)));
            }
            lane[m_i * n_dim + n] = sum;
        }
    }
}
