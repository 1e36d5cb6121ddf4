//! Configuration and invocation parameters for the dataflows
//!
//! A hardware configuration can also be read from a parameter file of
//! `KEY:value` lines:
//!
//! ```text
//! NUM_PES:16
//! TPU_PES_X:4
//! TPU_PES_Y:4
//! STORAGE_M_DIM:48
//! STORAGE_N_DIM:48
//! STORAGE_K_DIM:48
//! STORAGE_MK_NNZ:306
//! STORAGE_KN_NNZ:550
//! WORKLOAD:example.cfg
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::constants::*;
use crate::error::{DataflowError, Result};

/// Declared workload shape, as supplied by the host
///
/// Mirrors the `M,N,K,MK_NNZ,KN_NNZ` configuration line of a test-vector set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelArgs {
    /// Rows of A and of the output
    pub m_dim: usize,
    /// Reduction dimension: columns of A, rows of B
    pub k_dim: usize,
    /// Columns of B and of the output
    pub n_dim: usize,
    /// Declared nonzeros of A (ignored when A is dense)
    pub mk_nnz: usize,
    /// Declared nonzeros of B (ignored when B is dense)
    pub kn_nnz: usize,
}

impl KernelArgs {
    pub fn new(m_dim: usize, k_dim: usize, n_dim: usize, mk_nnz: usize, kn_nnz: usize) -> Self {
        Self {
            m_dim,
            k_dim,
            n_dim,
            mk_nnz,
            kn_nnz,
        }
    }
}

impl Default for KernelArgs {
    fn default() -> Self {
        Self::new(
            DEFAULT_M_DIM,
            DEFAULT_K_DIM,
            DEFAULT_N_DIM,
            DEFAULT_MK_NNZ,
            DEFAULT_KN_NNZ,
        )
    }
}

/// Fixed capacities of the local staging buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    pub m_dim: usize,
    pub k_dim: usize,
    pub n_dim: usize,
    pub mk_nnz: usize,
    pub kn_nnz: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            m_dim: STORAGE_M_DIM,
            k_dim: STORAGE_K_DIM,
            n_dim: STORAGE_N_DIM,
            mk_nnz: STORAGE_MK_NNZ,
            kn_nnz: STORAGE_KN_NNZ,
        }
    }
}

impl StorageConfig {
    /// Capacities sized exactly to one workload
    pub fn fitting(args: &KernelArgs) -> Self {
        Self {
            m_dim: args.m_dim,
            k_dim: args.k_dim,
            n_dim: args.n_dim,
            mk_nnz: args.mk_nnz,
            kn_nnz: args.kn_nnz,
        }
    }

    /// Checks every declared dimension and nonzero count against these capacities
    ///
    /// Reports the first bound exceeded, in `M, N, K, MK_NNZ, KN_NNZ` order.
    pub fn check_fits(&self, args: &KernelArgs) -> Result<()> {
        let bounds = [
            ("storage M", args.m_dim, self.m_dim),
            ("storage N", args.n_dim, self.n_dim),
            ("storage K", args.k_dim, self.k_dim),
            ("storage MK_NNZ", args.mk_nnz, self.mk_nnz),
            ("storage KN_NNZ", args.kn_nnz, self.kn_nnz),
        ];
        for (buffer, requested, capacity) in bounds {
            if requested > capacity {
                return Err(DataflowError::CapacityExceeded {
                    buffer: buffer.to_string(),
                    requested,
                    capacity,
                });
            }
        }
        Ok(())
    }
}

/// System parameters for the worker pool
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Number of threads to use when lanes run in parallel
    pub n_threads: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

/// Configuration shared by all dataflows
#[derive(Debug, Clone)]
pub struct DataflowConfig {
    /// Staging buffer capacities
    pub storage: StorageConfig,

    /// System parameters for the worker pool
    pub system_params: SystemParameters,

    /// Row (or column) lanes processed together by the lane-based dataflows
    pub num_macs: usize,

    /// Output rows per tile in the tiled dense dataflow
    pub mac_x: usize,

    /// Output columns per tile in the tiled dense dataflow
    pub mac_y: usize,

    /// Check ascending secondary indices before a merge-based multiply
    pub validate_sorted: bool,

    /// Run independent lanes on a rayon pool
    pub parallel: bool,
}

impl Default for DataflowConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            system_params: SystemParameters::default(),
            num_macs: NUM_MACS,
            mac_x: NUM_MAC_X,
            mac_y: NUM_MAC_Y,
            validate_sorted: true,
            parallel: false,
        }
    }
}

impl DataflowConfig {
    /// Default lanes with buffers sized exactly to `args`
    pub fn fitting(args: &KernelArgs) -> Self {
        Self {
            storage: StorageConfig::fitting(args),
            ..Self::default()
        }
    }

    /// Same configuration with parallel lanes switched on or off
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reads lane widths and storage capacities from a parameter file
    ///
    /// Keys left out keep their defaults. A `WORKLOAD` line is accepted and
    /// logged but does not affect the configuration.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Parse` for an unknown key or a
    /// malformed value, and `InvalidConfig` if the result fails `validate`.
    pub fn from_param_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| DataflowError::io(path, source))?;
        let (config, workload) =
            Self::parse_params(&text).map_err(|message| DataflowError::parse(path, message))?;
        config.validate()?;
        debug!(path = %path.display(), ?workload, storage = ?config.storage, "parameter file read");
        Ok(config)
    }

    /// Parses `KEY:value` parameter lines, returning the configuration and
    /// the `WORKLOAD` name if one is given
    ///
    /// Blank lines and lines starting with `#` or `//` are skipped.
    pub fn parse_params(text: &str) -> std::result::Result<(Self, Option<String>), String> {
        let mut config = Self::default();
        let mut workload = None;

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(CFG_COMMENT_PREFIX) {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| format!("line {}: expected KEY:value, found `{line}`", number + 1))?;
            let (key, value) = (key.trim(), value.trim());

            if key == "WORKLOAD" {
                workload = Some(value.to_string());
                continue;
            }
            let slot = match key {
                "NUM_PES" => &mut config.num_macs,
                "TPU_PES_X" => &mut config.mac_x,
                "TPU_PES_Y" => &mut config.mac_y,
                "STORAGE_M_DIM" => &mut config.storage.m_dim,
                "STORAGE_N_DIM" => &mut config.storage.n_dim,
                "STORAGE_K_DIM" => &mut config.storage.k_dim,
                "STORAGE_MK_NNZ" => &mut config.storage.mk_nnz,
                "STORAGE_KN_NNZ" => &mut config.storage.kn_nnz,
                other => return Err(format!("line {}: unknown key `{other}`", number + 1)),
            };
            *slot = value
                .parse()
                .map_err(|_| format!("line {}: invalid value `{value}` for {key}", number + 1))?;
        }
        Ok((config, workload))
    }

    /// Renders the lane widths and capacities as parameter file lines
    pub fn to_params(&self) -> String {
        let storage = &self.storage;
        format!(
            "NUM_PES:{}\nTPU_PES_X:{}\nTPU_PES_Y:{}\nSTORAGE_M_DIM:{}\nSTORAGE_N_DIM:{}\n\
             STORAGE_K_DIM:{}\nSTORAGE_MK_NNZ:{}\nSTORAGE_KN_NNZ:{}\n",
            self.num_macs,
            self.mac_x,
            self.mac_y,
            storage.m_dim,
            storage.n_dim,
            storage.k_dim,
            storage.mk_nnz,
            storage.kn_nnz,
        )
    }

    /// Rejects zero lane widths and an empty worker pool
    pub fn validate(&self) -> Result<()> {
        if self.num_macs == 0 {
            return Err(DataflowError::InvalidConfig("num_macs must be positive".into()));
        }
        if self.mac_x == 0 || self.mac_y == 0 {
            return Err(DataflowError::InvalidConfig(format!(
                "tile shape {}×{} must be positive",
                self.mac_x, self.mac_y
            )));
        }
        if self.parallel && self.system_params.n_threads == 0 {
            return Err(DataflowError::InvalidConfig(
                "parallel execution needs at least one thread".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = DataflowConfig::default();
        assert_eq!(config.storage.m_dim, STORAGE_M_DIM);
        assert_eq!(config.storage.mk_nnz, STORAGE_MK_NNZ);
        assert_eq!(config.storage.kn_nnz, STORAGE_KN_NNZ);
        assert_eq!(config.num_macs, NUM_MACS);
        assert!(config.validate_sorted);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fitting() {
        let args = KernelArgs::new(3, 5, 7, 4, 9);
        let config = DataflowConfig::fitting(&args);
        assert_eq!(config.storage.k_dim, 5);
        assert_eq!(config.storage.kn_nnz, 9);
    }

    #[test]
    fn test_validate_rejects_zero_lanes() {
        let config = DataflowConfig {
            mac_y: 0,
            ..DataflowConfig::default()
        };
        assert!(matches!(config.validate(), Err(DataflowError::InvalidConfig(_))));

        let config = DataflowConfig {
            num_macs: 0,
            ..DataflowConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_fits() {
        let storage = StorageConfig::default();
        assert!(storage.check_fits(&KernelArgs::default()).is_ok());

        let args = KernelArgs::new(48, 49, 24, 306, 550);
        let err = storage.check_fits(&args).unwrap_err();
        assert!(matches!(
            err,
            DataflowError::CapacityExceeded { ref buffer, requested: 49, capacity: 48 }
                if buffer == "storage K"
        ));

        let args = KernelArgs::new(1, 1, 1, 1, STORAGE_KN_NNZ + 1);
        assert!(storage.check_fits(&args).is_err());
    }

    #[test]
    fn test_parse_params() {
        let text = "# accelerator\nNUM_PES:8\nTPU_PES_X : 2\n\nSTORAGE_MK_NNZ:100\n\
                    WORKLOAD:example.cfg\n";
        let (config, workload) = DataflowConfig::parse_params(text).unwrap();
        assert_eq!(config.num_macs, 8);
        assert_eq!(config.mac_x, 2);
        assert_eq!(config.mac_y, NUM_MAC_Y);
        assert_eq!(config.storage.mk_nnz, 100);
        assert_eq!(config.storage.kn_nnz, STORAGE_KN_NNZ);
        assert_eq!(workload.as_deref(), Some("example.cfg"));
    }

    #[test]
    fn test_parse_params_errors() {
        assert!(DataflowConfig::parse_params("NUM_PES 8").is_err());
        assert!(DataflowConfig::parse_params("NUM_PES:-1").is_err());
        assert!(DataflowConfig::parse_params("NUM_LANES:4").is_err());
        assert!(DataflowConfig::parse_params("STORAGE_K_DIM:").is_err());
    }
}
