//! Matrix Market coordinate files as dense integer operands
//!
//! Real-valued entries are rounded up to the next integer. Pattern files
//! (entries without a value column) store 1 at every listed coordinate.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{DataflowError, Result};
use crate::matrix::DenseMatrix;

/// Reads a Matrix Market coordinate file into a dense matrix
///
/// With `undirected` set, every off-diagonal entry `(r, c)` is mirrored to
/// `(c, r)`, as needed for symmetric adjacency matrices stored as one triangle.
/// A coordinate listed twice keeps its last value.
pub fn read_matrix_market(path: &Path, undirected: bool) -> Result<DenseMatrix> {
    let text = fs::read_to_string(path).map_err(|source| DataflowError::io(path, source))?;
    let matrix = parse_matrix_market(&text, undirected)
        .map_err(|message| DataflowError::parse(path, message))?;
    debug!(
        path = %path.display(),
        n_rows = matrix.n_rows(),
        n_cols = matrix.n_cols(),
        nnz = matrix.nnz(),
        "matrix market read"
    );
    Ok(matrix)
}

/// Parses the contents of a Matrix Market coordinate file
pub fn parse_matrix_market(
    text: &str,
    undirected: bool,
) -> std::result::Result<DenseMatrix, String> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('%'));

    // Header: rows cols entries
    let header = lines.next().ok_or_else(|| "missing size line".to_string())?;
    let (n_rows, n_cols, declared) = match header.split_whitespace().collect::<Vec<_>>()[..] {
        [rows, cols, entries] => (
            parse_count(rows, "rows")?,
            parse_count(cols, "columns")?,
            parse_count(entries, "entries")?,
        ),
        _ => return Err(format!("invalid size line `{header}`")),
    };

    let mut data = vec![0i32; n_rows * n_cols];
    let mut entries = 0;
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (row, col) = match fields[..] {
            [row, col, ..] => (
                parse_coordinate(row, n_rows, "row")?,
                parse_coordinate(col, n_cols, "column")?,
            ),
            _ => return Err(format!("invalid entry `{line}`")),
        };
        let value = match fields.get(2) {
            Some(value) => parse_value(value)?,
            None => 1,
        };

        data[row * n_cols + col] = value;
        if undirected && row != col {
            if col >= n_rows || row >= n_cols {
                return Err(format!(
                    "entry ({}, {}) has no mirror in a {n_rows}×{n_cols} matrix",
                    row + 1,
                    col + 1
                ));
            }
            data[col * n_cols + row] = value;
        }
        entries += 1;
    }

    if entries != declared {
        warn!(declared, found = entries, "matrix market entry count differs from size line");
    }
    DenseMatrix::new(n_rows, n_cols, data).map_err(|e| e.to_string())
}

fn parse_count(token: &str, what: &str) -> std::result::Result<usize, String> {
    token
        .parse::<usize>()
        .map_err(|_| format!("invalid number of {what} `{token}`"))
}

/// Converts a 1-based coordinate to a 0-based position below `bound`
fn parse_coordinate(token: &str, bound: usize, what: &str) -> std::result::Result<usize, String> {
    let one_based = token
        .parse::<usize>()
        .map_err(|_| format!("invalid {what} index `{token}`"))?;
    match one_based.checked_sub(1) {
        Some(position) if position < bound => Ok(position),
        _ => Err(format!("{what} index {one_based} outside 1..={bound}")),
    }
}

fn parse_value(token: &str) -> std::result::Result<i32, String> {
    let value = token
        .parse::<f64>()
        .map_err(|_| format!("invalid value `{token}`"))?
        .ceil();
    if !value.is_finite() || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(format!("value `{token}` does not fit i32"));
    }
    Ok(value as i32)
}
