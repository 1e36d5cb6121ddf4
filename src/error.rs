//! Error taxonomy shared by the staging layer, the dataflows and the test-vector I/O.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::matrix::Layout;

#[derive(Error, Debug)]
pub enum DataflowError {
    #[error("{buffer}: {requested} exceeds staging capacity of {capacity}")]
    CapacityExceeded {
        buffer: String,
        requested: usize,
        capacity: usize,
    },
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid pointer array: ptr[{position}] = {value} after {previous}")]
    InvalidPointer {
        position: usize,
        value: usize,
        previous: usize,
    },
    #[error("index {index} at position {position} out of bounds for axis of size {bound}")]
    IndexOutOfBounds {
        index: usize,
        position: usize,
        bound: usize,
    },
    #[error("{operand}: slot {slot} is not strictly ascending at position {position}")]
    UnsortedSecondaryIndex {
        operand: &'static str,
        slot: usize,
        position: usize,
    },
    #[error("{operand}: expected {expected} operand, got {got}")]
    OperandLayout {
        operand: &'static str,
        expected: Layout,
        got: Layout,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DataflowError>;

impl DataflowError {
    pub(crate) fn shape(context: &'static str, expected: usize, got: usize) -> Self {
        DataflowError::ShapeMismatch {
            context,
            expected,
            got,
        }
    }

    pub(crate) fn parse(path: &Path, message: String) -> Self {
        DataflowError::Parse {
            path: PathBuf::from(path),
            message,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        DataflowError::Io {
            path: PathBuf::from(path),
            source,
        }
    }
}
