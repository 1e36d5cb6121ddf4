//! # Dataflow matrix multiplication
//!
//! Integer matrix multiplication `O = A·B` computed by four dataflows modelled
//! on accelerator designs. All four produce the same dense `M×N` output and
//! differ only in the operand representations they consume and in the
//! traversal they use.
//!
//! ## Overview
//!
//! | Strategy | A | B | Traversal |
//! |---|---|---|---|
//! | dense-tiled | dense | dense | output tiles of `mac_x × mac_y` |
//! | weight-stationary | CSR | dense | lanes of A rows, one sum per nonzero run |
//! | merge | CSR | CSC | sorted-run intersection per output cell |
//! | gather | CSC | CSC | B nonzeros broadcast over A columns |
//!
//! Every invocation validates its arguments, stages operands into
//! capacity-bounded buffers, accumulates into a zeroed output and flattens
//! the result. Arithmetic wraps on `i32` overflow.
//!
//! ## Usage
//!
//! ```
//! use dataflow_mm::{multiply, DataflowConfig, DenseMatrix, Strategy};
//!
//! let a = DenseMatrix::from_rows(&[[0, 2], [3, 0]]).unwrap();
//! let b = DenseMatrix::from_rows(&[[1, 0], [0, 4]]).unwrap();
//!
//! let o = multiply(Strategy::MergeBasedSparseSparse, &a, &b, &DataflowConfig::default()).unwrap();
//! assert_eq!(o.as_slice(), &[0, 8, 3, 0]);
//! ```
//!
//! Operands already in compressed form go through [`Strategy::compute`] or
//! the per-strategy functions in [`dataflow`] with explicit [`KernelArgs`].
//! Workloads come from [`WorkloadGenerator`], either random or with A read
//! from a Matrix Market file, and hardware parameters can be loaded with
//! [`DataflowConfig::from_param_file`].

pub mod constants;
pub mod dataflow;
pub mod error;
pub mod matrix;
mod parallel;
pub mod staging;
pub mod testvec;
pub mod utils;
pub mod workload;

// Re-export primary components
pub use dataflow::{
    dense_tiled, gather_accumulate, merge_intersect, weight_stationary, Operand, OwnedOperand,
    Strategy,
};
pub use error::{DataflowError, Result};
pub use matrix::{
    bitmask_to_dense, compressed_to_dense, dense_to_bitmask, dense_to_compressed, dense_to_rlc,
    reference_matmul, rlc_to_dense, Axis, BitmaskMatrix, CompressedMatrix, DataflowConfig,
    DenseMatrix, KernelArgs, Layout, RunLengthMatrix, StorageConfig, SystemParameters,
};
pub use testvec::{compare_golden, Mismatch, TestVectorSet};
pub use utils::{from_sprs, read_matrix_market, to_sprs};
pub use workload::{Workload, WorkloadGenerator};

/// Multiplies two dense matrices with the given strategy
///
/// The operands are converted into the layouts the strategy consumes and the
/// kernel arguments are derived from their shapes and nonzero counts.
///
/// # Errors
///
/// `ShapeMismatch` if the reduction dimensions differ, `CapacityExceeded`
/// if a dimension or nonzero count exceeds the configured storage, and
/// `InvalidConfig` for a malformed configuration.
pub fn multiply(
    strategy: Strategy,
    a: &DenseMatrix,
    b: &DenseMatrix,
    config: &DataflowConfig,
) -> Result<DenseMatrix> {
    strategy.multiply_dense(a, b, config)
}

/// Version information for the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
