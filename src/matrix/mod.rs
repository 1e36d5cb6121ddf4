// Matrix data structures and operations

use std::fmt;

pub mod compressed;
pub mod config;
pub mod conversion;
pub mod dense;
pub mod reference;

pub use compressed::{Axis, CompressedMatrix};
pub use config::{DataflowConfig, KernelArgs, StorageConfig, SystemParameters};
pub use conversion::{
    bitmask_to_dense, compressed_to_dense, dense_to_bitmask, dense_to_compressed, dense_to_rlc,
    rlc_to_dense, BitmaskMatrix, RunLengthMatrix,
};
pub use dense::DenseMatrix;
pub use reference::reference_matmul;

/// Physical representation of an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Row-major dense storage
    Dense,
    /// Compressed along the given primary axis
    Compressed(Axis),
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Dense => write!(f, "dense"),
            Layout::Compressed(Axis::Row) => write!(f, "CSR"),
            Layout::Compressed(Axis::Column) => write!(f, "CSC"),
        }
    }
}
