//! Compressed sparse matrix format, keyed by either matrix axis
//!
//! A single type covers both CSR (primary axis = rows) and CSC
//! (primary axis = columns). The dataflows pick whichever orientation
//! their traversal needs for each operand.

use std::fmt;
use std::ops::Range;

use crate::error::{DataflowError, Result};
use crate::utils::exclusive_scan;

/// Matrix axis used as the primary (compressed) axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Compressed by row: slots are rows, indices are columns (CSR)
    Row,
    /// Compressed by column: slots are columns, indices are rows (CSC)
    Column,
}

impl Axis {
    /// The other axis
    pub fn other(self) -> Self {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }
}

/// A sparse matrix compressed along one axis
///
/// The format stores a sparse matrix using three arrays:
/// - ptr: Array of size primary_dim + 1 containing offsets into idx and val
/// - idx: Array of size nnz containing secondary-axis positions
/// - val: Array of size nnz containing the non-zero values
///
/// Entries within a slot keep the order the caller supplied. Nothing is
/// sorted internally; dataflows that need ascending order check it with
/// [`CompressedMatrix::check_sorted`].
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedMatrix {
    n_rows: usize,
    n_cols: usize,
    axis: Axis,
    ptr: Vec<usize>,
    idx: Vec<usize>,
    val: Vec<i32>,
}

impl CompressedMatrix {
    /// Creates a compressed matrix after validating its structure
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if `ptr.len() != primary_dim + 1`, if `idx` and `val`
    ///   differ in length, or if `ptr[primary_dim] != idx.len()`
    /// - `InvalidPointer` if `ptr` does not start at zero or decreases
    /// - `IndexOutOfBounds` if an index is not below the secondary dimension
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        axis: Axis,
        ptr: Vec<usize>,
        idx: Vec<usize>,
        val: Vec<i32>,
    ) -> Result<Self> {
        let (primary, secondary) = match axis {
            Axis::Row => (n_rows, n_cols),
            Axis::Column => (n_cols, n_rows),
        };

        if ptr.len() != primary + 1 {
            return Err(DataflowError::shape("ptr length", primary + 1, ptr.len()));
        }
        if idx.len() != val.len() {
            return Err(DataflowError::shape("val length", idx.len(), val.len()));
        }
        if ptr[0] != 0 {
            return Err(DataflowError::InvalidPointer {
                position: 0,
                value: ptr[0],
                previous: 0,
            });
        }
        for (i, pair) in ptr.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(DataflowError::InvalidPointer {
                    position: i + 1,
                    value: pair[1],
                    previous: pair[0],
                });
            }
        }
        if ptr[primary] != idx.len() {
            return Err(DataflowError::shape("ptr end", idx.len(), ptr[primary]));
        }
        if let Some(position) = idx.iter().position(|&i| i >= secondary) {
            return Err(DataflowError::IndexOutOfBounds {
                index: idx[position],
                position,
                bound: secondary,
            });
        }

        Ok(Self {
            n_rows,
            n_cols,
            axis,
            ptr,
            idx,
            val,
        })
    }

    /// Creates a row-compressed (CSR) matrix
    pub fn csr(
        n_rows: usize,
        n_cols: usize,
        ptr: Vec<usize>,
        idx: Vec<usize>,
        val: Vec<i32>,
    ) -> Result<Self> {
        Self::new(n_rows, n_cols, Axis::Row, ptr, idx, val)
    }

    /// Creates a column-compressed (CSC) matrix
    pub fn csc(
        n_rows: usize,
        n_cols: usize,
        ptr: Vec<usize>,
        idx: Vec<usize>,
        val: Vec<i32>,
    ) -> Result<Self> {
        Self::new(n_rows, n_cols, Axis::Column, ptr, idx, val)
    }

    /// Creates a matrix with no stored entries
    pub fn empty(n_rows: usize, n_cols: usize, axis: Axis) -> Self {
        let primary = match axis {
            Axis::Row => n_rows,
            Axis::Column => n_cols,
        };
        Self {
            n_rows,
            n_cols,
            axis,
            ptr: vec![0; primary + 1],
            idx: Vec::new(),
            val: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Size of the compressed axis (number of slots)
    pub fn primary_dim(&self) -> usize {
        self.ptr.len() - 1
    }

    /// Size of the axis the indices refer to
    pub fn secondary_dim(&self) -> usize {
        match self.axis {
            Axis::Row => self.n_cols,
            Axis::Column => self.n_rows,
        }
    }

    /// Returns the number of stored entries
    pub fn nnz(&self) -> usize {
        self.val.len()
    }

    pub fn ptr(&self) -> &[usize] {
        &self.ptr
    }

    pub fn idx(&self) -> &[usize] {
        &self.idx
    }

    pub fn val(&self) -> &[i32] {
        &self.val
    }

    /// Offsets of slot `slot` in `idx`/`val`
    pub fn slot_range(&self, slot: usize) -> Range<usize> {
        self.ptr[slot]..self.ptr[slot + 1]
    }

    /// Returns an iterator over the entries of slot `slot`
    ///
    /// Each item is a tuple (secondary index, value) in stored order.
    pub fn slot(&self, slot: usize) -> impl Iterator<Item = (usize, i32)> + '_ {
        assert!(slot < self.primary_dim(), "Slot index out of bounds");
        let range = self.slot_range(slot);
        self.idx[range.clone()]
            .iter()
            .copied()
            .zip(self.val[range].iter().copied())
    }

    /// Whether every slot holds strictly ascending secondary indices
    pub fn is_sorted(&self) -> bool {
        self.first_unsorted().is_none()
    }

    /// Fails with `UnsortedSecondaryIndex` at the first slot whose indices
    /// are not strictly ascending
    pub fn check_sorted(&self, operand: &'static str) -> Result<()> {
        match self.first_unsorted() {
            None => Ok(()),
            Some((slot, position)) => Err(DataflowError::UnsortedSecondaryIndex {
                operand,
                slot,
                position,
            }),
        }
    }

    fn first_unsorted(&self) -> Option<(usize, usize)> {
        (0..self.primary_dim()).find_map(|slot| {
            let range = self.slot_range(slot);
            let start = range.start;
            self.idx[range]
                .windows(2)
                .position(|w| w[1] <= w[0])
                .map(|offset| (slot, start + offset + 1))
        })
    }

    /// Re-compresses the same logical matrix along `axis`
    ///
    /// Uses a stable counting sort: within each new slot, entries appear in
    /// the order of their old slot, so a matrix whose slots are walked in
    /// ascending order yields ascending indices.
    pub fn to_axis(&self, axis: Axis) -> Self {
        if axis == self.axis {
            return self.clone();
        }

        let mut counts = vec![0usize; self.secondary_dim()];
        for &i in &self.idx {
            counts[i] += 1;
        }
        let ptr = exclusive_scan(&counts);

        let mut next = ptr.clone();
        let mut idx = vec![0usize; self.nnz()];
        let mut val = vec![0i32; self.nnz()];
        for slot in 0..self.primary_dim() {
            for (secondary, value) in self.slot(slot) {
                let dst = next[secondary];
                idx[dst] = slot;
                val[dst] = value;
                next[secondary] += 1;
            }
        }

        Self {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            axis,
            ptr,
            idx,
            val,
        }
    }

    /// Reinterprets the storage as the transpose of this matrix
    ///
    /// The CSR arrays of `A` are exactly the CSC arrays of `Aᵀ`, so no data moves.
    pub fn transpose(self) -> Self {
        Self {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            axis: self.axis.other(),
            ptr: self.ptr,
            idx: self.idx,
            val: self.val,
        }
    }
}

impl fmt::Debug for CompressedMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CompressedMatrix {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        writeln!(f, "  axis: {:?}", self.axis)?;
        writeln!(f, "  nnz: {}", self.nnz())?;

        let max_slots_to_print = 5.min(self.primary_dim());

        if max_slots_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for i in 0..max_slots_to_print {
                write!(f, "    slot {}: ", i)?;
                let range = self.slot_range(i);

                if range.is_empty() {
                    writeln!(f, "(empty)")?;
                } else {
                    let max_elements = 5.min(range.len());

                    for (idx, val) in self.slot(i).take(max_elements) {
                        write!(f, "({}, {}) ", idx, val)?;
                    }

                    if range.len() > max_elements {
                        write!(f, "... ({} more)", range.len() - max_elements)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.primary_dim() > max_slots_to_print {
                writeln!(
                    f,
                    "    ... ({} more slots)",
                    self.primary_dim() - max_slots_to_print
                )?;
            }
        }

        write!(f, "}}")
    }
}
