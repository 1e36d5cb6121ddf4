//! Seeded random workload generation
//!
//! Produces dense operands with an exact nonzero count, the way the
//! hardware testbenches are populated: `nnz` values drawn from
//! `GEN_VALUE_MIN..=GEN_VALUE_MAX`, padded with zeros and shuffled.
//! Real workloads take A from a Matrix Market file and generate only B.

use std::path::Path;

use rand::distributions::{Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::constants::{GEN_VALUE_MAX, GEN_VALUE_MIN};
use crate::error::{DataflowError, Result};
use crate::matrix::{reference_matmul, DenseMatrix, KernelArgs};
use crate::utils::read_matrix_market;

/// Dense operands of one workload plus their reference product
#[derive(Debug, Clone)]
pub struct Workload {
    pub args: KernelArgs,
    pub a: DenseMatrix,
    pub b: DenseMatrix,
    pub golden: DenseMatrix,
}

/// Generates random operands from a fixed seed
pub struct WorkloadGenerator {
    rng: ChaCha8Rng,
}

impl WorkloadGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generates a `n_rows × n_cols` matrix with exactly `nnz` nonzeros
    pub fn random_matrix(
        &mut self,
        n_rows: usize,
        n_cols: usize,
        nnz: usize,
    ) -> Result<DenseMatrix> {
        let size = n_rows * n_cols;
        if nnz > size {
            return Err(DataflowError::InvalidConfig(format!(
                "{nnz} nonzeros do not fit a {n_rows}×{n_cols} matrix"
            )));
        }

        let val_dist = Uniform::from(GEN_VALUE_MIN..=GEN_VALUE_MAX);
        let mut data: Vec<i32> = (0..nnz).map(|_| val_dist.sample(&mut self.rng)).collect();
        data.resize(size, 0);
        data.shuffle(&mut self.rng);

        DenseMatrix::new(n_rows, n_cols, data)
    }

    /// Generates A (`m×k`, `mk_nnz` nonzeros) and B (`k×n`, `kn_nnz` nonzeros)
    /// and computes the golden output
    pub fn workload(&mut self, args: &KernelArgs) -> Result<Workload> {
        let a = self.random_matrix(args.m_dim, args.k_dim, args.mk_nnz)?;
        let b = self.random_matrix(args.k_dim, args.n_dim, args.kn_nnz)?;
        let golden = reference_matmul(&a, &b)?;
        debug!(?args, "generated workload");

        Ok(Workload {
            args: *args,
            a,
            b,
            golden,
        })
    }

    /// Reads A from a Matrix Market file and generates a random `k×n_dim` B
    ///
    /// `m` and `k` come from the file's size line and `mk_nnz` from the
    /// nonzeros actually stored, after mirroring when `undirected` is set.
    pub fn from_matrix_market(
        &mut self,
        path: &Path,
        undirected: bool,
        n_dim: usize,
        kn_nnz: usize,
    ) -> Result<Workload> {
        let a = read_matrix_market(path, undirected)?;
        let args = KernelArgs::new(a.n_rows(), a.n_cols(), n_dim, a.nnz(), kn_nnz);
        let b = self.random_matrix(args.k_dim, args.n_dim, args.kn_nnz)?;
        let golden = reference_matmul(&a, &b)?;
        debug!(path = %path.display(), ?args, "generated matrix market workload");

        Ok(Workload { args, a, b, golden })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_exact_nnz_and_value_range() {
        let mut generator = WorkloadGenerator::new(7);
        let m = generator.random_matrix(6, 5, 11).unwrap();
        assert_eq!(m.nnz(), 11);
        assert!(m
            .as_slice()
            .iter()
            .all(|&v| v == 0 || (GEN_VALUE_MIN..=GEN_VALUE_MAX).contains(&v)));
    }

    #[test]
    fn test_full_and_empty() {
        let mut generator = WorkloadGenerator::new(1);
        assert_eq!(generator.random_matrix(3, 3, 9).unwrap().nnz(), 9);
        assert_eq!(generator.random_matrix(3, 3, 0).unwrap().nnz(), 0);
        assert!(generator.random_matrix(3, 3, 10).is_err());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let args = KernelArgs::new(4, 5, 3, 8, 6);
        let w1 = WorkloadGenerator::new(42).workload(&args).unwrap();
        let w2 = WorkloadGenerator::new(42).workload(&args).unwrap();
        assert_eq!(w1.a, w2.a);
        assert_eq!(w1.b, w2.b);
        assert_eq!(w1.golden, w2.golden);
        assert_eq!(w1.b.nnz(), 6);
    }

    #[test]
    fn test_matrix_market_workload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Symmetric 4-node path graph, lower triangle only
        write!(
            file,
            "%%MatrixMarket matrix coordinate real symmetric\n4 4 3\n2 1 1.2\n3 2 1\n4 3 2.5\n"
        )
        .unwrap();

        let w = WorkloadGenerator::new(3)
            .from_matrix_market(file.path(), true, 5, 7)
            .unwrap();
        assert_eq!(w.args, KernelArgs::new(4, 4, 5, 6, 7));
        assert_eq!(w.a.row(0), &[0, 2, 0, 0]);
        assert_eq!(w.a.row(1), &[2, 0, 1, 0]);
        assert_eq!(w.a.row(3), &[0, 0, 3, 0]);
        assert_eq!((w.b.n_rows(), w.b.n_cols(), w.b.nnz()), (4, 5, 7));
        assert_eq!(w.golden, reference_matmul(&w.a, &w.b).unwrap());
    }

    #[test]
    fn test_matrix_market_missing_file() {
        let err = WorkloadGenerator::new(0)
            .from_matrix_market(Path::new("no/such/graph.mtx"), false, 2, 1)
            .unwrap_err();
        assert!(matches!(err, DataflowError::Io { .. }));
    }
}
