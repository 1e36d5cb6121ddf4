//! # Lane scheduling
//!
//! The dataflows hand independent units of work (row blocks or columns) to
//! the helpers here. With `parallel` off they run in order on the calling
//! thread; with it on they run on a dedicated Rayon pool and join before
//! the caller flattens the accumulator.

use rayon::prelude::*;

use crate::error::Result;
use crate::matrix::DataflowConfig;

/// Runs `op` inside a pool of `system_params.n_threads` workers when the
/// configuration asks for parallel lanes, or directly otherwise
pub(crate) fn run_in_pool<R, F>(config: &DataflowConfig, op: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if !config.parallel {
        return Ok(op());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.system_params.n_threads)
        .build()?;
    Ok(pool.install(op))
}

/// Applies `f(block_index, block)` to consecutive blocks of `block_len` cells
///
/// Blocks are disjoint, so no synchronization is needed between them.
pub(crate) fn for_each_block<F>(cells: &mut [i32], block_len: usize, parallel: bool, f: F)
where
    F: Fn(usize, &mut [i32]) + Send + Sync,
{
    if cells.is_empty() || block_len == 0 {
        return;
    }
    if parallel {
        cells
            .par_chunks_mut(block_len)
            .enumerate()
            .for_each(|(i, block)| f(i, block));
    } else {
        cells
            .chunks_mut(block_len)
            .enumerate()
            .for_each(|(i, block)| f(i, block));
    }
}

/// Evaluates `f(i)` for `i` in `0..count`, in index order
pub(crate) fn map_indices<T, F>(count: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    if parallel {
        (0..count).into_par_iter().map(f).collect()
    } else {
        (0..count).map(f).collect()
    }
}
