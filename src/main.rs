//! Command-line driver for the dataflow library
//!
//! ```bash
//! # Run every strategy on the built-in 2×2 example
//! dataflow-mm demo
//!
//! # Generate a seeded test-vector directory
//! dataflow-mm generate --out vectors/ --m 48 --k 48 --n 24 --mk-nnz 306 --kn-nnz 550
//!
//! # Take A from a symmetric Matrix Market graph instead
//! dataflow-mm generate --out vectors/ --mtx graph.mtx --undirected --n 24 --kn-nnz 550
//!
//! # Check one or all strategies against a directory's golden output
//! dataflow-mm run --dir vectors/ --strategy merge --parallel
//!
//! # Take lane widths and staging capacities from a parameter file
//! dataflow-mm run --dir vectors/ --params accelerator.txt
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use dataflow_mm::constants::*;
use dataflow_mm::{
    DataflowConfig, DenseMatrix, KernelArgs, Strategy, TestVectorSet, Workload, WorkloadGenerator,
};

/// Accelerator dataflows for integer matrix multiplication
#[derive(Parser, Debug)]
#[command(name = "dataflow-mm")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Multiply a small example with every strategy
    Demo {
        /// Run lanes on the worker pool
        #[arg(long)]
        parallel: bool,
    },

    /// Generate a seeded test-vector directory
    Generate {
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        #[arg(long, default_value_t = DEFAULT_M_DIM)]
        m: usize,

        #[arg(long, default_value_t = DEFAULT_K_DIM)]
        k: usize,

        #[arg(long, default_value_t = DEFAULT_N_DIM)]
        n: usize,

        /// Nonzeros in A
        #[arg(long, default_value_t = DEFAULT_MK_NNZ)]
        mk_nnz: usize,

        /// Nonzeros in B
        #[arg(long, default_value_t = DEFAULT_KN_NNZ)]
        kn_nnz: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Read A from a Matrix Market file; `--m`, `--k` and `--mk-nnz` are ignored
        #[arg(long)]
        mtx: Option<PathBuf>,

        /// Mirror off-diagonal entries of the Matrix Market file
        #[arg(long, requires = "mtx")]
        undirected: bool,
    },

    /// Run strategies on a test-vector directory and compare with its golden output
    Run {
        /// Test-vector directory
        #[arg(short, long)]
        dir: PathBuf,

        /// Strategy name or alias (`merge`, `eie`, ...); runs all four when omitted
        #[arg(short, long, value_parser = parse_strategy)]
        strategy: Option<Strategy>,

        /// Run lanes on the worker pool
        #[arg(long)]
        parallel: bool,

        /// Worker threads (defaults to the number of cores)
        #[arg(long)]
        threads: Option<usize>,

        /// Size staging buffers to the workload instead of the fixed capacities
        #[arg(long, conflicts_with = "params")]
        fit_storage: bool,

        /// Parameter file with `KEY:value` lane widths and staging capacities
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Trust that compressed indices are sorted
        #[arg(long)]
        no_validate: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Command::Demo { parallel } => demo(parallel),
        Command::Generate {
            out,
            m,
            k,
            n,
            mk_nnz,
            kn_nnz,
            seed,
            mtx,
            undirected,
        } => {
            let mut generator = WorkloadGenerator::new(seed);
            let workload = match mtx {
                Some(path) => generator
                    .from_matrix_market(&path, undirected, n, kn_nnz)
                    .with_context(|| format!("reading A from {}", path.display()))?,
                None => generator
                    .workload(&KernelArgs::new(m, k, n, mk_nnz, kn_nnz))
                    .context("generating workload")?,
            };
            generate(out, &workload, seed)
        }
        Command::Run {
            dir,
            strategy,
            parallel,
            threads,
            fit_storage,
            params,
            no_validate,
        } => {
            let set = TestVectorSet::load_dir(&dir)
                .with_context(|| format!("loading test vectors from {}", dir.display()))?;

            let mut config = match params {
                Some(path) => {
                    let config = DataflowConfig::from_param_file(&path)
                        .with_context(|| format!("reading parameters from {}", path.display()))?;
                    config
                        .storage
                        .check_fits(&set.args)
                        .context("workload does not fit the configured storage")?;
                    config
                }
                None if fit_storage => DataflowConfig::fitting(&set.args),
                None => DataflowConfig::default(),
            };
            config.parallel = parallel;
            config.validate_sorted = !no_validate;
            if let Some(n_threads) = threads {
                config.system_params.n_threads = n_threads;
            }

            run(&set, strategy, &config)
        }
    }
}

fn demo(parallel: bool) -> Result<()> {
    let a = DenseMatrix::from_rows(&[[0, 2], [3, 0]])?;
    let b = DenseMatrix::from_rows(&[[1, 0], [0, 4]])?;
    let config = DataflowConfig::default().with_parallel(parallel);

    println!("A: {a:?}");
    println!("B: {b:?}");
    for strategy in Strategy::ALL {
        let o = dataflow_mm::multiply(strategy, &a, &b, &config)?;
        println!("{:>18}: {:?}", strategy.name(), o);
    }
    Ok(())
}

fn generate(out: PathBuf, workload: &Workload, seed: u64) -> Result<()> {
    TestVectorSet::from_workload(workload)
        .write_dir(&out)
        .with_context(|| format!("writing test vectors to {}", out.display()))?;

    info!(dir = %out.display(), args = ?workload.args, seed, "test vectors written");
    Ok(())
}

fn parse_strategy(name: &str) -> std::result::Result<Strategy, String> {
    name.parse::<Strategy>().map_err(|e| e.to_string())
}

fn run(set: &TestVectorSet, strategy: Option<Strategy>, config: &DataflowConfig) -> Result<()> {
    let strategies = match strategy {
        Some(strategy) => vec![strategy],
        None => Strategy::ALL.to_vec(),
    };

    let mut failed = Vec::new();
    for strategy in strategies {
        let mismatches = set
            .verify(strategy, config)
            .with_context(|| format!("running {strategy}"))?;
        if mismatches.is_empty() {
            println!("{:>18}: PASS", strategy.name());
        } else {
            println!(
                "{:>18}: FAIL ({} cells differ, first {})",
                strategy.name(),
                mismatches.len(),
                mismatches[0]
            );
            failed.push(strategy.name());
        }
    }

    if !failed.is_empty() {
        bail!("golden comparison failed for {}", failed.join(", "));
    }
    Ok(())
}
