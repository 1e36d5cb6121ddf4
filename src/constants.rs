//! Centralized constants for the dataflow library
//!
//! Default staging capacities and lane widths live here so that the
//! configuration defaults, the CLI and the benches agree on one set of numbers.

// ============================================================================
// STAGING CAPACITIES
// ============================================================================

/// Row capacity of every staged M-dimension buffer
pub const STORAGE_M_DIM: usize = 48;

/// Capacity of every staged K-dimension (reduction) buffer
pub const STORAGE_K_DIM: usize = 48;

/// Column capacity of every staged N-dimension buffer
pub const STORAGE_N_DIM: usize = 48;

/// Nonzero capacity for the compressed A operand (M×K)
pub const STORAGE_MK_NNZ: usize = 306;

/// Nonzero capacity for the compressed B operand (K×N)
pub const STORAGE_KN_NNZ: usize = 550;

// ============================================================================
// MAC LANES
// ============================================================================

/// Parallel MAC lanes for the row/column-lane dataflows
pub const NUM_MACS: usize = 16;

/// Tile height (output rows per tile) for the tiled dense dataflow
pub const NUM_MAC_X: usize = 4;

/// Tile width (output columns per tile) for the tiled dense dataflow
pub const NUM_MAC_Y: usize = 4;

// ============================================================================
// WORKLOAD GENERATION
// ============================================================================

/// Smallest value placed in a generated nonzero
pub const GEN_VALUE_MIN: i32 = 1;

/// Largest value placed in a generated nonzero
pub const GEN_VALUE_MAX: i32 = 9;

/// Reference workload dimensions (M, K, N)
pub const DEFAULT_M_DIM: usize = 48;
pub const DEFAULT_K_DIM: usize = 48;
pub const DEFAULT_N_DIM: usize = 24;

/// Reference workload nonzero counts for A and B
pub const DEFAULT_MK_NNZ: usize = 306;
pub const DEFAULT_KN_NNZ: usize = 550;

// ============================================================================
// TEST-VECTOR FILES
// ============================================================================

/// Workload configuration file inside a test-vector directory
pub const CFG_FILE: &str = "matrix.cfg";

/// Dense A operand file
pub const DENSE_A_FILE: &str = "input_A.csv";

/// Dense B operand file
pub const DENSE_B_FILE: &str = "input_B.csv";

/// Golden output file
pub const GOLDEN_FILE: &str = "output_O.csv";

/// Comment prefix inside the configuration file
pub const CFG_COMMENT_PREFIX: &str = "//";
