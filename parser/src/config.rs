//! Run configuration for parsing, validation and analysis.
//!
//! Every section and field is optional; absent values fall back to the
//! defaults shown below.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! parser:
//!   summary_lookahead: 10
//! validation:
//!   tolerance: 0.001
//!   count_by_identity: false
//! analysis:
//!   top_n: 10
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use window_sweep_core::ValidationOptions;
use window_sweep_core::analysis::DEFAULT_TOP_N;

use crate::error::{Result, SweepError};
use crate::parser::{DEFAULT_SUMMARY_LOOKAHEAD, ParseOptions};

/// Current configuration format version.
pub const CONFIG_VERSION: &str = "1.0";

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Lines scanned for summary statistics after a trigger line.
    pub summary_lookahead: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            summary_lookahead: DEFAULT_SUMMARY_LOOKAHEAD,
        }
    }
}

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Absolute tolerance for reported-versus-recomputed aggregates.
    pub tolerance: f64,
    /// Count (video, identity) test cases instead of video names.
    pub count_by_identity: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let options = ValidationOptions::default();
        Self {
            tolerance: options.tolerance,
            count_by_identity: options.count_by_identity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of the worst / most sensitive video lists.
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Top-level configuration, usually loaded from `sweep-report.yml`.
///
/// # Examples
///
/// ```
/// use window_sweep_parser::SweepConfig;
///
/// let config: SweepConfig = serde_yaml::from_str("validation:\n  tolerance: 0.01\n").unwrap();
/// assert_eq!(config.validation.tolerance, 0.01);
/// assert_eq!(config.parser.summary_lookahead, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    pub parser: ParserConfig,
    pub validation: ValidationConfig,
    pub analysis: AnalysisConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            parser: ParserConfig::default(),
            validation: ValidationConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](SweepError::Io) if the file cannot be read,
    /// [`Yaml`](SweepError::Yaml) if parsing fails, or
    /// [`InvalidConfig`](SweepError::InvalidConfig) if a value is out of
    /// range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| SweepError::io(path, err))?;
        let config: Self = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|err| SweepError::io(path, err))?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Rejects values the parser or validator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.parser.summary_lookahead == 0 {
            return Err(SweepError::InvalidConfig(
                "parser.summary_lookahead must be at least 1".to_string(),
            ));
        }
        let tolerance = self.validation.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(SweepError::InvalidConfig(format!(
                "validation.tolerance must be a non-negative number, got {tolerance}"
            )));
        }
        if self.analysis.top_n == 0 {
            return Err(SweepError::InvalidConfig(
                "analysis.top_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            summary_lookahead: self.parser.summary_lookahead,
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            tolerance: self.validation.tolerance,
            count_by_identity: self.validation.count_by_identity,
        }
    }
}
