//! Tiled dense dataflow (TPU-like systolic tiling)
//!
//! The output is cut into `mac_x × mac_y` tiles. For each tile the full
//! reduction dimension is walked once, and every `k` step updates all
//! `mac_x * mac_y` cells of the tile. Tile positions past the declared
//! dimensions read as zero and are never stored.

use tracing::debug;

use crate::error::Result;
use crate::matrix::{DataflowConfig, DenseMatrix, KernelArgs};
use crate::parallel::{for_each_block, run_in_pool};
use crate::staging::{OutputAccumulator, StagedDense};

/// Multiplies dense `A` (`m_dim × k_dim`) by dense `B` (`k_dim × n_dim`)
///
/// # Errors
///
/// `CapacityExceeded` when a dimension exceeds its staging capacity,
/// `ShapeMismatch` when an operand disagrees with `args`.
pub fn dense_tiled(
    a: &DenseMatrix,
    b: &DenseMatrix,
    args: &KernelArgs,
    config: &DataflowConfig,
) -> Result<DenseMatrix> {
    config.validate()?;
    let KernelArgs {
        m_dim,
        k_dim,
        n_dim,
        ..
    } = *args;
    let storage = &config.storage;

    debug!(
        m_dim,
        k_dim,
        n_dim,
        mac_x = config.mac_x,
        mac_y = config.mac_y,
        parallel = config.parallel,
        "dense-tiled start"
    );

    let local_a = StagedDense::load("A", a, m_dim, k_dim, storage.m_dim, storage.k_dim)?;
    let local_b = StagedDense::load("B", b, k_dim, n_dim, storage.k_dim, storage.n_dim)?;
    let mut local_o = OutputAccumulator::zeroed(m_dim, n_dim, storage)?;

    let (mac_x, mac_y) = (config.mac_x, config.mac_y);
    let cells = local_o.cells_mut();

    // One block = one band of mac_x output rows; bands touch disjoint cells
    run_in_pool(config, || {
        for_each_block(cells, mac_x * n_dim, config.parallel, |m_o, band| {
            compute_band(&local_a, &local_b, band, m_o * mac_x, n_dim, mac_y);
        })
    })?;

    debug!("dense-tiled done");
    Ok(local_o.flatten())
}

/// Computes every tile of one band of output rows starting at `m_base`
fn compute_band(
    a: &StagedDense,
    b: &StagedDense,
    band: &mut [i32],
    m_base: usize,
    n_dim: usize,
    mac_y: usize,
) {
    let band_rows = band.len() / n_dim;
    let k_dim = a.cols();

    for n_o in 0..n_dim.div_ceil(mac_y) {
        for k in 0..k_dim {
            for m_i in 0..band_rows {
                let m = m_base + m_i;
                let a_val = a.get_masked(m, k);
                for n_i in 0..mac_y {
                    let n = n_o * mac_y + n_i;
                    if n >= n_dim {
                        break;
                    }
                    let b_val = b.get_masked(k, n);
                    let cell = &mut band[m_i * n_dim + n];
                    *cell = cell.wrapping_add(a_val.wrapping_mul(b_val));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::reference_matmul;

    fn args_for(a: &DenseMatrix, b: &DenseMatrix) -> KernelArgs {
        KernelArgs::new(a.n_rows(), a.n_cols(), b.n_cols(), 0, 0)
    }

    #[test]
    fn test_two_by_two() {
        let a = DenseMatrix::from_rows(&[[0, 2], [3, 0]]).unwrap();
        let b = DenseMatrix::from_rows(&[[1, 0], [0, 4]]).unwrap();
        let o = dense_tiled(&a, &b, &args_for(&a, &b), &DataflowConfig::default()).unwrap();
        assert_eq!(o.as_slice(), &[0, 8, 3, 0]);
    }

    #[test]
    fn test_partial_tiles() {
        // 5×3 · 3×7 leaves ragged tiles on both output axes with 4×4 tiles
        let a = DenseMatrix::new(5, 3, (1..=15).collect()).unwrap();
        let b = DenseMatrix::new(3, 7, (0..21).map(|v| v - 10).collect()).unwrap();
        let expected = reference_matmul(&a, &b).unwrap();

        for (mac_x, mac_y) in [(1, 1), (4, 4), (2, 3), (8, 8)] {
            let config = DataflowConfig {
                mac_x,
                mac_y,
                ..DataflowConfig::default()
            };
            let o = dense_tiled(&a, &b, &args_for(&a, &b), &config).unwrap();
            assert_eq!(o, expected, "tile {mac_x}×{mac_y}");
        }
    }

    #[test]
    fn test_empty_reduction_dimension() {
        let a = DenseMatrix::zeros(3, 0);
        let b = DenseMatrix::zeros(0, 2);
        let o = dense_tiled(&a, &b, &args_for(&a, &b), &DataflowConfig::default()).unwrap();
        assert_eq!(o, DenseMatrix::zeros(3, 2));
    }

    #[test]
    fn test_capacity_exceeded() {
        let a = DenseMatrix::zeros(49, 1);
        let b = DenseMatrix::zeros(1, 1);
        let err = dense_tiled(&a, &b, &args_for(&a, &b), &DataflowConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::DataflowError::CapacityExceeded { requested: 49, capacity: 48, .. }
        ));
    }
}
