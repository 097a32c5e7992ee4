//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - a TOML file (path given on the command line or `nsetmine.toml`)
//! - Environment variables (NSETMINE_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # nsetmine.toml
//! [constraints]
//! epsilon = [0.0, 0.5]
//! min_sizes = [2, 2]
//! min_area = 6
//!
//! [engine]
//! density_threshold = 0.1
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! NSETMINE_ENGINE__DENSITY_THRESHOLD=0.25
//! NSETMINE_OUTPUT__PRINT_SIZES=true
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{MiningError, MiningResult};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub constraints: ConstraintConfig,
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub utility: UtilityConfig,
    #[serde(default)]
    pub slope: SlopeConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub agglomeration: AgglomerationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input file location and format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the noisy relation ("-" or empty reads standard input)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Separator between element labels inside one dimension field
    #[serde(default = "default_element_separator")]
    pub element_separator: String,

    /// Separator between dimension fields (empty = any whitespace)
    #[serde(default)]
    pub dimension_separator: String,

    /// Force fuzzy (trailing membership column) or crisp reading.
    /// Unset = decide from the first line.
    #[serde(default)]
    pub fuzzy: Option<bool>,
}

/// Pattern constraints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintConfig {
    /// Per-dimension noise tolerance in [0, 1] membership units
    #[serde(default)]
    pub epsilon: Vec<f64>,

    /// Per-dimension minimal number of elements
    #[serde(default)]
    pub min_sizes: Vec<usize>,

    /// Per-dimension maximal number of elements
    #[serde(default)]
    pub max_sizes: Vec<usize>,

    /// Minimal area (product of the per-dimension sizes)
    #[serde(default)]
    pub min_area: usize,

    /// Maximal area (0 = unbounded)
    #[serde(default)]
    pub max_area: usize,

    /// Per-dimension tau for almost-contiguous metric dimensions
    /// (0 = dimension is not metric)
    #[serde(default)]
    pub tau: Vec<f64>,

    /// Dimensions sharing one symmetric element domain (a clique pair)
    #[serde(default)]
    pub clique_dimensions: Vec<usize>,

    /// Dimensions whose closedness is not required
    #[serde(default)]
    pub unclosed_dimensions: Vec<usize>,
}

/// Element groups and cross-group cover constraints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    /// One file per group; each file holds one line per dimension listing
    /// member element labels
    #[serde(default)]
    pub files: Vec<PathBuf>,

    #[serde(default)]
    pub min_sizes: Vec<usize>,

    #[serde(default)]
    pub max_sizes: Vec<usize>,

    /// Square matrices over the groups; the diagonal of each acts as a
    /// minimal group self-cover
    #[serde(default)]
    pub min_ratios: Vec<Vec<f64>>,
    #[serde(default)]
    pub min_piatetsky_shapiros: Vec<Vec<f64>>,
    #[serde(default)]
    pub min_leverages: Vec<Vec<f64>>,
    #[serde(default)]
    pub min_forces: Vec<Vec<f64>>,
    #[serde(default)]
    pub min_yules_qs: Vec<Vec<f64>>,
    #[serde(default)]
    pub min_yules_ys: Vec<Vec<f64>>,

    #[serde(default = "default_element_separator")]
    pub element_separator: String,

    #[serde(default)]
    pub dimension_separator: String,
}

/// Per-tuple utility values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtilityConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub min_utility: f64,
}

/// Per-tuple slope points
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlopeConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub min_slope: f64,
}

/// Search engine tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tube occupancy ratio above which a sparse tube is converted to a
    /// dense one at construction
    #[serde(default = "default_density_threshold")]
    pub density_threshold: f64,

    /// Pivot selection heuristic: 0 scores candidates by the noise they
    /// carry in the present-and-potential space, 1 by the noise in the
    /// present space with present-and-potential as tie-break
    #[serde(default)]
    pub enumeration_process: u8,

    /// Reduce the relation before mining
    #[serde(default = "default_true")]
    pub pre_process: bool,

    /// Min-size element pruning inside the search
    #[serde(default = "default_true")]
    pub min_size_element_pruning: bool,

    /// Emit the reduced relation and exit
    #[serde(default)]
    pub reduction_only: bool,

    /// Cross-check the incremental noise counters against the store at
    /// every recursion node (slow; meant for tests)
    #[serde(default)]
    pub audit_noise_counters: bool,
}

/// Agglomerative post-processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgglomerationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Multiplier applied to the relation's mean-noise shift
    #[serde(default = "default_shift_multiplier")]
    pub shift_multiplier: f64,

    /// Maximal number of candidate agglomerates (millions)
    #[serde(default = "default_max_candidates")]
    pub max_candidate_agglomerates: f64,
}

/// Pattern output location and separators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the pattern file (empty writes standard output)
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default = "default_element_separator")]
    pub element_separator: String,

    #[serde(default = "default_dimension_separator")]
    pub dimension_separator: String,

    #[serde(default = "default_annex_separator")]
    pub pattern_size_separator: String,

    #[serde(default = "default_dimension_separator")]
    pub size_separator: String,

    #[serde(default = "default_annex_separator")]
    pub size_area_separator: String,

    #[serde(default)]
    pub print_sizes: bool,

    #[serde(default)]
    pub print_area: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_element_separator() -> String {
    ",".to_string()
}
fn default_dimension_separator() -> String {
    " ".to_string()
}
fn default_annex_separator() -> String {
    " : ".to_string()
}
fn default_density_threshold() -> f64 {
    0.1
}
fn default_shift_multiplier() -> f64 {
    1.0
}
fn default_max_candidates() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            path: None,
            element_separator: default_element_separator(),
            dimension_separator: String::new(),
            fuzzy: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            density_threshold: default_density_threshold(),
            enumeration_process: 0,
            pre_process: true,
            min_size_element_pruning: true,
            reduction_only: false,
            audit_noise_counters: false,
        }
    }
}

impl Default for AgglomerationConfig {
    fn default() -> Self {
        AgglomerationConfig {
            enabled: false,
            shift_multiplier: default_shift_multiplier(),
            max_candidate_agglomerates: default_max_candidates(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            file: None,
            element_separator: default_element_separator(),
            dimension_separator: default_dimension_separator(),
            pattern_size_separator: default_annex_separator(),
            size_separator: default_dimension_separator(),
            size_area_separator: default_annex_separator(),
            print_sizes: false,
            print_area: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl MiningConfig {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. nsetmine.toml (base configuration)
    /// 2. Environment variables (NSETMINE_* prefix)
    pub fn load() -> MiningResult<Self> {
        Figment::new()
            .merge(Toml::file("nsetmine.toml"))
            .merge(Env::prefixed("NSETMINE_").split("__"))
            .extract()
            .map_err(|e| MiningError::Config(Box::new(e)))
    }

    /// Load configuration from a specific file path
    pub fn from_file(path: &str) -> MiningResult<Self> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("NSETMINE_").split("__"))
            .extract()
            .map_err(|e| MiningError::Config(Box::new(e)))
    }

    /// Check option combinations that do not depend on the relation's
    /// dimensionality. Per-dimension vector lengths are validated once the
    /// input reveals n.
    pub fn validate(&self) -> MiningResult<()> {
        for &dim in &self.constraints.clique_dimensions {
            if self.constraints.tau.get(dim).copied().unwrap_or(0.0) != 0.0 {
                return Err(MiningError::usage(format!(
                    "dimension {dim} is declared both symmetric (clique) and almost-contiguous (tau); \
                     this combination is not supported"
                )));
            }
        }
        if !self.constraints.clique_dimensions.is_empty()
            && self.constraints.clique_dimensions.len() != 2
        {
            return Err(MiningError::usage(
                "clique_dimensions must name exactly two dimensions sharing one element domain",
            ));
        }
        if let [first, second] = self.constraints.clique_dimensions[..] {
            if first == second {
                return Err(MiningError::usage(
                    "clique_dimensions must name two distinct dimensions",
                ));
            }
        }
        for (d, eps) in self.constraints.epsilon.iter().enumerate() {
            if *eps < 0.0 {
                return Err(MiningError::usage(format!(
                    "epsilon for dimension {d} must be non-negative"
                )));
            }
        }
        for (d, tau) in self.constraints.tau.iter().enumerate() {
            if *tau < 0.0 {
                return Err(MiningError::usage(format!(
                    "tau for dimension {d} must be non-negative"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.engine.density_threshold) {
            return Err(MiningError::usage("density_threshold must be in [0, 1]"));
        }
        if self.engine.enumeration_process > 1 {
            return Err(MiningError::usage("enumeration_process must be 0 or 1"));
        }
        let group_count = self.groups.files.len();
        for (name, matrix) in [
            ("min_ratios", &self.groups.min_ratios),
            ("min_piatetsky_shapiros", &self.groups.min_piatetsky_shapiros),
            ("min_leverages", &self.groups.min_leverages),
            ("min_forces", &self.groups.min_forces),
            ("min_yules_qs", &self.groups.min_yules_qs),
            ("min_yules_ys", &self.groups.min_yules_ys),
        ] {
            for (row_id, row) in matrix.iter().enumerate() {
                if row.len() > group_count {
                    return Err(MiningError::usage(format!(
                        "row {row_id} of groups.{name} provides {} coefficients but only \
                         {group_count} groups are defined",
                        row.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate the per-dimension vectors against the relation's
    /// dimensionality.
    pub fn validate_arity(&self, n: usize) -> MiningResult<()> {
        for (name, len) in [
            ("epsilon", self.constraints.epsilon.len()),
            ("min_sizes", self.constraints.min_sizes.len()),
            ("max_sizes", self.constraints.max_sizes.len()),
            ("tau", self.constraints.tau.len()),
        ] {
            if len > n {
                return Err(MiningError::usage(format!(
                    "{name} option should provide at most {n} coefficients"
                )));
            }
        }
        for &dim in self
            .constraints
            .clique_dimensions
            .iter()
            .chain(&self.constraints.unclosed_dimensions)
        {
            if dim >= n {
                return Err(MiningError::usage(format!(
                    "dimension {dim} does not exist in a {n}-dimensional relation"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MiningConfig::default();
        assert!(config.engine.pre_process);
        assert!(config.engine.min_size_element_pruning);
        assert!((config.engine.density_threshold - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.output.element_separator, ",");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = MiningConfig::default();
        let toml_str = toml::to_string(&config).expect("serializable");

        assert!(toml_str.contains("[constraints]"));
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_clique_and_tau_conflict() {
        let mut config = MiningConfig::default();
        config.constraints.clique_dimensions = vec![0, 1];
        config.constraints.tau = vec![10.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clique_must_be_pair() {
        let mut config = MiningConfig::default();
        config.constraints.clique_dimensions = vec![0, 1, 2];
        assert!(config.validate().is_err());
        config.constraints.clique_dimensions = vec![0, 1];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_arity_validation() {
        let mut config = MiningConfig::default();
        config.constraints.epsilon = vec![0.1, 0.2, 0.3];
        assert!(config.validate_arity(2).is_err());
        assert!(config.validate_arity(3).is_ok());
    }
}
