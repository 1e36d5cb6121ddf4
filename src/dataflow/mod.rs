//! Dataflow implementations for integer matrix multiplication
//!
//! Four peer strategies compute the same dense product `O = A·B` and
//! differ in which operand representation they consume and in how they
//! traverse it:
//!
//! - [`dense_tiled`]: dense × dense, output tiled in `mac_x × mac_y` blocks
//! - [`weight_stationary`]: CSR × dense, row lanes over A's nonzero runs
//! - [`merge_intersect`]: CSR × CSC, sorted-run intersection per output cell
//! - [`gather_accumulate`]: CSC × CSC, B nonzeros broadcast over A's runs
//!
//! Every strategy stages its operands into capacity-bounded buffers,
//! accumulates into a zeroed output accumulator and flattens it.

pub mod dense_tiled;
pub mod gather;
pub mod merge;
pub mod weight_stationary;

use std::fmt;
use std::str::FromStr;

pub use dense_tiled::dense_tiled;
pub use gather::gather_accumulate;
pub use merge::{merge_dot, merge_intersect};
pub use weight_stationary::weight_stationary;

use crate::error::{DataflowError, Result};
use crate::matrix::{
    dense_to_compressed, Axis, CompressedMatrix, DataflowConfig, DenseMatrix, KernelArgs, Layout,
};

/// A borrowed operand in either representation
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Dense(&'a DenseMatrix),
    Compressed(&'a CompressedMatrix),
}

impl Operand<'_> {
    pub fn layout(&self) -> Layout {
        match self {
            Operand::Dense(_) => Layout::Dense,
            Operand::Compressed(m) => Layout::Compressed(m.axis()),
        }
    }

    /// Stored nonzeros; zero for dense operands, which carry no count
    fn declared_nnz(&self) -> usize {
        match self {
            Operand::Dense(_) => 0,
            Operand::Compressed(m) => m.nnz(),
        }
    }
}

impl<'a> From<&'a DenseMatrix> for Operand<'a> {
    fn from(m: &'a DenseMatrix) -> Self {
        Operand::Dense(m)
    }
}

impl<'a> From<&'a CompressedMatrix> for Operand<'a> {
    fn from(m: &'a CompressedMatrix) -> Self {
        Operand::Compressed(m)
    }
}

/// An owned operand, as produced by [`Strategy::prepare`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedOperand {
    Dense(DenseMatrix),
    Compressed(CompressedMatrix),
}

impl OwnedOperand {
    /// Converts a dense matrix into the requested layout
    pub fn from_dense(matrix: &DenseMatrix, layout: Layout) -> Self {
        match layout {
            Layout::Dense => OwnedOperand::Dense(matrix.clone()),
            Layout::Compressed(axis) => OwnedOperand::Compressed(dense_to_compressed(matrix, axis)),
        }
    }

    pub fn as_operand(&self) -> Operand<'_> {
        match self {
            OwnedOperand::Dense(m) => Operand::Dense(m),
            OwnedOperand::Compressed(m) => Operand::Compressed(m),
        }
    }
}

/// The four compute strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Dense × dense, tiled (TPU-like)
    DenseTiled,
    /// CSR × dense, weight stationary (EIE-like)
    WeightStationarySparseDense,
    /// CSR × CSC, merge-intersection (ExTensor-like)
    MergeBasedSparseSparse,
    /// CSC × CSC, gather-accumulate (MatRaptor-like)
    GatherAccumulateSparseSparse,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::DenseTiled,
        Strategy::WeightStationarySparseDense,
        Strategy::MergeBasedSparseSparse,
        Strategy::GatherAccumulateSparseSparse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::DenseTiled => "dense-tiled",
            Strategy::WeightStationarySparseDense => "weight-stationary",
            Strategy::MergeBasedSparseSparse => "merge",
            Strategy::GatherAccumulateSparseSparse => "gather",
        }
    }

    /// Layouts expected for A and B
    pub fn operand_layouts(&self) -> (Layout, Layout) {
        match self {
            Strategy::DenseTiled => (Layout::Dense, Layout::Dense),
            Strategy::WeightStationarySparseDense => (Layout::Compressed(Axis::Row), Layout::Dense),
            Strategy::MergeBasedSparseSparse => (
                Layout::Compressed(Axis::Row),
                Layout::Compressed(Axis::Column),
            ),
            Strategy::GatherAccumulateSparseSparse => (
                Layout::Compressed(Axis::Column),
                Layout::Compressed(Axis::Column),
            ),
        }
    }

    /// Runs the strategy on operands in its expected layouts
    ///
    /// # Errors
    ///
    /// `OperandLayout` if either operand has the wrong representation, plus
    /// whatever the underlying dataflow reports.
    pub fn compute(
        &self,
        a: Operand<'_>,
        b: Operand<'_>,
        args: &KernelArgs,
        config: &DataflowConfig,
    ) -> Result<DenseMatrix> {
        let (expected_a, expected_b) = self.operand_layouts();
        check_layout("A", a, expected_a)?;
        check_layout("B", b, expected_b)?;

        match (self, a, b) {
            (Strategy::DenseTiled, Operand::Dense(a), Operand::Dense(b)) => {
                dense_tiled(a, b, args, config)
            }
            (Strategy::WeightStationarySparseDense, Operand::Compressed(a), Operand::Dense(b)) => {
                weight_stationary(a, b, args, config)
            }
            (Strategy::MergeBasedSparseSparse, Operand::Compressed(a), Operand::Compressed(b)) => {
                merge_intersect(a, b, args, config)
            }
            (
                Strategy::GatherAccumulateSparseSparse,
                Operand::Compressed(a),
                Operand::Compressed(b),
            ) => gather_accumulate(a, b, args, config),
            _ => unreachable!("layouts checked above"),
        }
    }

    /// Converts dense A and B into this strategy's layouts
    pub fn prepare(&self, a: &DenseMatrix, b: &DenseMatrix) -> (OwnedOperand, OwnedOperand) {
        let (layout_a, layout_b) = self.operand_layouts();
        (
            OwnedOperand::from_dense(a, layout_a),
            OwnedOperand::from_dense(b, layout_b),
        )
    }

    /// Converts dense operands, derives the kernel arguments and computes
    pub fn multiply_dense(
        &self,
        a: &DenseMatrix,
        b: &DenseMatrix,
        config: &DataflowConfig,
    ) -> Result<DenseMatrix> {
        if a.n_cols() != b.n_rows() {
            return Err(DataflowError::shape("reduction dimension", a.n_cols(), b.n_rows()));
        }
        let (a_op, b_op) = self.prepare(a, b);
        let (a_op, b_op) = (a_op.as_operand(), b_op.as_operand());
        let args = KernelArgs::new(
            a.n_rows(),
            a.n_cols(),
            b.n_cols(),
            a_op.declared_nnz(),
            b_op.declared_nnz(),
        );
        self.compute(a_op, b_op, &args, config)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = DataflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dense-tiled" | "tpu" | "tpu-like" => Ok(Strategy::DenseTiled),
            "weight-stationary" | "eie" | "eie-like" => Ok(Strategy::WeightStationarySparseDense),
            "merge" | "extensor" | "extensor-like" => Ok(Strategy::MergeBasedSparseSparse),
            "gather" | "matraptor" | "matraptor-like" => Ok(Strategy::GatherAccumulateSparseSparse),
            other => Err(DataflowError::InvalidConfig(format!("unknown strategy `{other}`"))),
        }
    }
}

fn check_layout(operand: &'static str, op: Operand<'_>, expected: Layout) -> Result<()> {
    let got = op.layout();
    if got != expected {
        return Err(DataflowError::OperandLayout {
            operand,
            expected,
            got,
        });
    }
    Ok(())
}

/// Checks a compressed operand's axis and logical shape against the declared dims
pub(crate) fn expect_compressed(
    operand: &'static str,
    matrix: &CompressedMatrix,
    axis: Axis,
    n_rows: usize,
    n_cols: usize,
) -> Result<()> {
    check_layout(operand, Operand::Compressed(matrix), Layout::Compressed(axis))?;
    if matrix.n_rows() != n_rows {
        return Err(DataflowError::shape("compressed operand rows", n_rows, matrix.n_rows()));
    }
    if matrix.n_cols() != n_cols {
        return Err(DataflowError::shape("compressed operand cols", n_cols, matrix.n_cols()));
    }
    Ok(())
}
