//! Test-vector directories
//!
//! A test-vector set is a directory with the workload configuration, the
//! dense operands, their compressed forms and the golden output:
//!
//! ```text
//! matrix.cfg                      // comments, then M,N,K,MK_NNZ,KN_NNZ
//! input_A.csv, input_B.csv        dense, one row per line
//! input_{A,B}_{csr,csc}_{val,idx,ptr}.csv
//! output_O.csv                    golden M×N output
//! ```
//!
//! Integer lists accept commas and/or whitespace as separators.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::constants::{CFG_COMMENT_PREFIX, CFG_FILE, DENSE_A_FILE, DENSE_B_FILE, GOLDEN_FILE};
use crate::dataflow::{Operand, Strategy};
use crate::error::{DataflowError, Result};
use crate::matrix::{
    dense_to_compressed, Axis, CompressedMatrix, DataflowConfig, DenseMatrix, KernelArgs, Layout,
};
use crate::workload::Workload;

/// All operand forms of one workload together with its golden output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVectorSet {
    pub args: KernelArgs,
    pub a: DenseMatrix,
    pub b: DenseMatrix,
    pub a_csr: CompressedMatrix,
    pub a_csc: CompressedMatrix,
    pub b_csr: CompressedMatrix,
    pub b_csc: CompressedMatrix,
    pub golden: DenseMatrix,
}

/// One output cell that differs from the golden output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub row: usize,
    pub col: usize,
    pub expected: i32,
    pub got: i32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "O[{}][{}]: expected {}, got {}",
            self.row, self.col, self.expected, self.got
        )
    }
}

impl TestVectorSet {
    /// Builds every compressed form from the dense operands of a workload
    pub fn from_workload(workload: &Workload) -> Self {
        let Workload { args, a, b, golden } = workload;
        Self {
            args: *args,
            a_csr: dense_to_compressed(a, Axis::Row),
            a_csc: dense_to_compressed(a, Axis::Column),
            b_csr: dense_to_compressed(b, Axis::Row),
            b_csc: dense_to_compressed(b, Axis::Column),
            a: a.clone(),
            b: b.clone(),
            golden: golden.clone(),
        }
    }

    /// Loads a test-vector directory
    ///
    /// Compressed operand files are optional; any form whose `ptr` file is
    /// missing is derived from the dense operand instead.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let cfg_path = dir.join(CFG_FILE);
        let args = parse_kernel_args(&read_file(&cfg_path)?)
            .map_err(|message| DataflowError::parse(&cfg_path, message))?;
        let KernelArgs {
            m_dim,
            k_dim,
            n_dim,
            ..
        } = args;

        let a = read_dense(&dir.join(DENSE_A_FILE), m_dim, k_dim)?;
        let b = read_dense(&dir.join(DENSE_B_FILE), k_dim, n_dim)?;
        let golden = read_dense(&dir.join(GOLDEN_FILE), m_dim, n_dim)?;

        let set = Self {
            args,
            a_csr: read_compressed_or(dir, "A", Axis::Row, &a)?,
            a_csc: read_compressed_or(dir, "A", Axis::Column, &a)?,
            b_csr: read_compressed_or(dir, "B", Axis::Row, &b)?,
            b_csc: read_compressed_or(dir, "B", Axis::Column, &b)?,
            a,
            b,
            golden,
        };
        debug!(dir = %dir.display(), ?args, "loaded test vectors");
        Ok(set)
    }

    /// Writes the set in the layout read by [`TestVectorSet::load_dir`]
    pub fn write_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|source| DataflowError::io(dir, source))?;

        let KernelArgs {
            m_dim,
            k_dim,
            n_dim,
            mk_nnz,
            kn_nnz,
        } = self.args;
        let cfg = format!(
            "{CFG_COMMENT_PREFIX} M,N,K,MK_NNZ,KN_NNZ\n{m_dim},{n_dim},{k_dim},{mk_nnz},{kn_nnz}\n"
        );
        write_file(&dir.join(CFG_FILE), &cfg)?;

        write_file(&dir.join(DENSE_A_FILE), &dense_csv(&self.a))?;
        write_file(&dir.join(DENSE_B_FILE), &dense_csv(&self.b))?;
        write_file(&dir.join(GOLDEN_FILE), &dense_csv(&self.golden))?;

        for (operand, matrix) in [
            ("A", &self.a_csr),
            ("A", &self.a_csc),
            ("B", &self.b_csr),
            ("B", &self.b_csc),
        ] {
            let axis = matrix.axis();
            write_file(&dir.join(compressed_file(operand, axis, "ptr")), &join(matrix.ptr()))?;
            write_file(&dir.join(compressed_file(operand, axis, "idx")), &join(matrix.idx()))?;
            write_file(&dir.join(compressed_file(operand, axis, "val")), &join(matrix.val()))?;
        }

        debug!(dir = %dir.display(), "wrote test vectors");
        Ok(())
    }

    /// Operands in the layouts the strategy consumes
    pub fn operands(&self, strategy: Strategy) -> (Operand<'_>, Operand<'_>) {
        let (layout_a, layout_b) = strategy.operand_layouts();
        (
            pick(layout_a, &self.a, &self.a_csr, &self.a_csc),
            pick(layout_b, &self.b, &self.b_csr, &self.b_csc),
        )
    }

    /// Runs one strategy on the set's operands and declared arguments
    pub fn run(&self, strategy: Strategy, config: &DataflowConfig) -> Result<DenseMatrix> {
        let (a, b) = self.operands(strategy);
        strategy.compute(a, b, &self.args, config)
    }

    /// Runs one strategy and compares its output with the golden output
    pub fn verify(&self, strategy: Strategy, config: &DataflowConfig) -> Result<Vec<Mismatch>> {
        let output = self.run(strategy, config)?;
        compare_golden(&output, &self.golden)
    }
}

/// Lists every cell where `output` differs from `golden`
pub fn compare_golden(output: &DenseMatrix, golden: &DenseMatrix) -> Result<Vec<Mismatch>> {
    if output.n_rows() != golden.n_rows() {
        return Err(DataflowError::shape("golden rows", golden.n_rows(), output.n_rows()));
    }
    if output.n_cols() != golden.n_cols() {
        return Err(DataflowError::shape("golden cols", golden.n_cols(), output.n_cols()));
    }

    let n_cols = golden.n_cols();
    let mismatches: Vec<Mismatch> = output
        .as_slice()
        .iter()
        .zip(golden.as_slice())
        .enumerate()
        .filter(|(_, (got, expected))| got != expected)
        .map(|(i, (&got, &expected))| Mismatch {
            row: i / n_cols,
            col: i % n_cols,
            expected,
            got,
        })
        .collect();

    if let Some(first) = mismatches.first() {
        warn!(count = mismatches.len(), %first, "output differs from golden");
    }
    Ok(mismatches)
}

/// Parses integers separated by commas and/or whitespace
pub fn parse_int_list(text: &str) -> std::result::Result<Vec<i64>, String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| format!("invalid integer `{token}`"))
        })
        .collect()
}

/// Parses a configuration file whose last non-comment line is `M,N,K,MK_NNZ,KN_NNZ`
pub fn parse_kernel_args(text: &str) -> std::result::Result<KernelArgs, String> {
    let line = text
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty() && !line.starts_with(CFG_COMMENT_PREFIX))
        .ok_or_else(|| "no configuration line".to_string())?;

    let values = parse_int_list(line)?;
    let values: Vec<usize> = values
        .into_iter()
        .map(|v| usize::try_from(v).map_err(|_| format!("negative value {v}")))
        .collect::<std::result::Result<_, _>>()?;

    match values[..] {
        [m_dim, n_dim, k_dim, mk_nnz, kn_nnz] => {
            Ok(KernelArgs::new(m_dim, k_dim, n_dim, mk_nnz, kn_nnz))
        }
        _ => Err(format!(
            "expected 5 values (M,N,K,MK_NNZ,KN_NNZ), found {}",
            values.len()
        )),
    }
}

fn pick<'a>(
    layout: Layout,
    dense: &'a DenseMatrix,
    csr: &'a CompressedMatrix,
    csc: &'a CompressedMatrix,
) -> Operand<'a> {
    match layout {
        Layout::Dense => Operand::Dense(dense),
        Layout::Compressed(Axis::Row) => Operand::Compressed(csr),
        Layout::Compressed(Axis::Column) => Operand::Compressed(csc),
    }
}

fn compressed_file(operand: &str, axis: Axis, part: &str) -> String {
    let format = match axis {
        Axis::Row => "csr",
        Axis::Column => "csc",
    };
    format!("input_{operand}_{format}_{part}.csv")
}

fn read_compressed_or(
    dir: &Path,
    operand: &str,
    axis: Axis,
    dense: &DenseMatrix,
) -> Result<CompressedMatrix> {
    let ptr_path = dir.join(compressed_file(operand, axis, "ptr"));
    if !ptr_path.exists() {
        return Ok(dense_to_compressed(dense, axis));
    }

    let ptr = read_indices(&ptr_path)?;
    let idx = read_indices(&dir.join(compressed_file(operand, axis, "idx")))?;
    let val = read_values(&dir.join(compressed_file(operand, axis, "val")))?;
    CompressedMatrix::new(dense.n_rows(), dense.n_cols(), axis, ptr, idx, val)
}

fn read_dense(path: &Path, n_rows: usize, n_cols: usize) -> Result<DenseMatrix> {
    let data = read_values(path)?;
    if data.len() != n_rows * n_cols {
        return Err(DataflowError::parse(
            path,
            format!("expected {n_rows}×{n_cols} values, found {}", data.len()),
        ));
    }
    DenseMatrix::new(n_rows, n_cols, data)
}

fn read_values(path: &Path) -> Result<Vec<i32>> {
    read_ints(path)?
        .into_iter()
        .map(|v| {
            i32::try_from(v).map_err(|_| DataflowError::parse(path, format!("{v} overflows i32")))
        })
        .collect()
}

fn read_indices(path: &Path) -> Result<Vec<usize>> {
    read_ints(path)?
        .into_iter()
        .map(|v| {
            usize::try_from(v)
                .map_err(|_| DataflowError::parse(path, format!("negative index {v}")))
        })
        .collect()
}

fn read_ints(path: &Path) -> Result<Vec<i64>> {
    parse_int_list(&read_file(path)?).map_err(|message| DataflowError::parse(path, message))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| DataflowError::io(path, source))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| DataflowError::io(path, source))
}

fn dense_csv(matrix: &DenseMatrix) -> String {
    let mut out = String::new();
    for row in 0..matrix.n_rows() {
        out.push_str(&join(matrix.row(row)));
        out.push('\n');
    }
    out
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadGenerator;
    use tempfile::tempdir;

    #[test]
    fn test_parse_int_list_separators() {
        assert_eq!(parse_int_list("1,2, 3\n4\t5").unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(parse_int_list("-7 , 8,").unwrap(), vec![-7, 8]);
        assert!(parse_int_list("").unwrap().is_empty());
        assert!(parse_int_list("1,x").is_err());
    }

    #[test]
    fn test_parse_kernel_args_uses_last_line() {
        let text = "// M,N,K,MK_NNZ,KN_NNZ\n// 1,1,1,1,1\n48,24,48,306,550\n\n";
        let args = parse_kernel_args(text).unwrap();
        assert_eq!(args, KernelArgs::new(48, 48, 24, 306, 550));
    }

    #[test]
    fn test_parse_kernel_args_errors() {
        assert!(parse_kernel_args("// only comments\n").is_err());
        assert!(parse_kernel_args("1,2,3,4").is_err());
        assert!(parse_kernel_args("1,2,-3,4,5").is_err());
    }

    #[test]
    fn test_compare_golden() {
        let golden = DenseMatrix::from_rows(&[[0, 8], [3, 0]]).unwrap();
        let output = DenseMatrix::from_rows(&[[0, 8], [3, 1]]).unwrap();
        assert!(compare_golden(&golden, &golden).unwrap().is_empty());

        let mismatches = compare_golden(&output, &golden).unwrap();
        assert_eq!(
            mismatches,
            vec![Mismatch {
                row: 1,
                col: 1,
                expected: 0,
                got: 1
            }]
        );
        assert!(compare_golden(&DenseMatrix::zeros(2, 3), &golden).is_err());
    }

    #[test]
    fn test_write_then_load_dir() {
        let dir = tempdir().unwrap();
        let args = KernelArgs::new(5, 4, 3, 9, 7);
        let workload = WorkloadGenerator::new(3).workload(&args).unwrap();
        let set = TestVectorSet::from_workload(&workload);

        set.write_dir(dir.path()).unwrap();
        let loaded = TestVectorSet::load_dir(dir.path()).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_missing_compressed_files_are_derived() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CFG_FILE), "// cfg\n2,2,2,2,2\n").unwrap();
        fs::write(dir.path().join(DENSE_A_FILE), "0,2\n3,0\n").unwrap();
        fs::write(dir.path().join(DENSE_B_FILE), "1 0\n0 4\n").unwrap();
        fs::write(dir.path().join(GOLDEN_FILE), "0,8\n3,0").unwrap();

        let set = TestVectorSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.a_csr.idx(), &[1, 0]);
        for strategy in Strategy::ALL {
            let mismatches = set.verify(strategy, &DataflowConfig::default()).unwrap();
            assert!(mismatches.is_empty(), "{strategy}: {mismatches:?}");
        }
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let err = TestVectorSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DataflowError::Io { ref path, .. } if path.ends_with(CFG_FILE)));

        fs::write(dir.path().join(CFG_FILE), "2,2,2,2,2").unwrap();
        fs::write(dir.path().join(DENSE_A_FILE), "0,2,3").unwrap();
        let err = TestVectorSet::load_dir(dir.path()).unwrap_err();
        assert!(
            matches!(err, DataflowError::Parse { ref path, .. } if path.ends_with(DENSE_A_FILE))
        );
    }
}
