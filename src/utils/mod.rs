//! Utility functions and helpers

pub mod formats;
pub mod matrix_market;

pub use formats::{from_sprs, to_sprs};
pub use matrix_market::{parse_matrix_market, read_matrix_market};

/// Exclusive prefix sum: `out[0] == 0` and `out[i + 1] == out[i] + counts[i]`
///
/// Turns per-slot counts into a pointer array of length `counts.len() + 1`.
pub fn exclusive_scan(counts: &[usize]) -> Vec<usize> {
    std::iter::once(0)
        .chain(counts.iter().scan(0, |sum, &count| {
            *sum += count;
            Some(*sum)
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_scan() {
        let input = vec![1, 2, 3, 4];
        let expected = vec![0, 1, 3, 6, 10];
        assert_eq!(exclusive_scan(&input), expected);

        let input = vec![0, 0, 5, 0];
        let expected = vec![0, 0, 0, 5, 5];
        assert_eq!(exclusive_scan(&input), expected);
    }
}
