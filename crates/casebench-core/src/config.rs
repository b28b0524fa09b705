//! Run parameters. Loaded from YAML (all fields optional), then overridden by CLI flags.

use crate::case::CorpusLayout;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cores held back from the worker pool for the harness itself.
pub const RESERVED_CORES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Number of cases; ids run over `[0, cases)`.
    pub cases: u32,
    /// Wall-clock limit per process launch, in seconds.
    pub timeout_secs: f64,
    /// `None` = available parallelism minus [`RESERVED_CORES`], at least 1.
    pub workers: Option<usize>,
    pub solver: PathBuf,
    /// Extra solver arguments (parameter sweeps).
    pub solver_args: Vec<String>,
    pub scorer: PathBuf,
    /// Arguments placed before the scorer's `<input> <output>` pair.
    pub scorer_args: Vec<String>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub id_width: usize,
    /// How many best/worst cases the report lists.
    pub extremes: usize,
    pub histogram: HistogramConfig,
    pub grid: GridConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            cases: 100,
            timeout_secs: 5.0,
            workers: None,
            solver: PathBuf::from("target/release/solver"),
            solver_args: Vec::new(),
            scorer: PathBuf::from("tools/target/release/vis"),
            scorer_args: Vec::new(),
            input_dir: PathBuf::from("tools/in"),
            output_dir: PathBuf::from("tools/out"),
            id_width: 4,
            extremes: 5,
            histogram: HistogramConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

/// Score histogram: `buckets` ranges of width `step` starting at `base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistogramConfig {
    pub base: i64,
    pub step: i64,
    pub buckets: usize,
    /// Bar length when a single bucket holds every case.
    pub bar_width: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            base: 500_000,
            step: 50_000,
            buckets: 30,
            bar_width: 100,
        }
    }
}

/// Size grid: rows bucket `n`, columns bucket `m`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub row_offset: u32,
    pub row_stride: u32,
    pub rows: usize,
    pub col_offset: u32,
    pub col_stride: u32,
    pub cols: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_offset: 31,
            row_stride: 5,
            rows: 6,
            col_offset: 30,
            col_stride: 30,
            cols: 10,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cases == 0 {
            return Err(ConfigError::invalid("cases", "must be > 0"));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::invalid(
                "timeout_secs",
                format!("must be a positive number of seconds, got {}", self.timeout_secs),
            ));
        }
        if Duration::try_from_secs_f64(self.timeout_secs).is_err() {
            return Err(ConfigError::invalid(
                "timeout_secs",
                format!("{} seconds does not fit a duration", self.timeout_secs),
            ));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::invalid("workers", "must be > 0"));
        }
        if self.id_width == 0 {
            return Err(ConfigError::invalid("id_width", "must be > 0"));
        }
        if self.histogram.step <= 0 {
            return Err(ConfigError::invalid("histogram.step", "must be > 0"));
        }
        if self.histogram.buckets == 0 {
            return Err(ConfigError::invalid("histogram.buckets", "must be > 0"));
        }
        if self.grid.row_stride == 0 || self.grid.col_stride == 0 {
            return Err(ConfigError::invalid("grid", "strides must be > 0"));
        }
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(ConfigError::invalid("grid", "rows and cols must be > 0"));
        }
        Ok(())
    }

    /// Only meaningful after [`Self::validate`]; out-of-range values saturate.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::MAX)
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            default_workers(cores)
        })
    }

    pub fn layout(&self) -> CorpusLayout {
        CorpusLayout::new(&self.input_dir, &self.output_dir, self.id_width)
    }
}

pub fn default_workers(cores: usize) -> usize {
    cores.saturating_sub(RESERVED_CORES).max(1)
}
