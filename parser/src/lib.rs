//! Text parser, CSV tables and report formatting for window-size sweeps.
//!
//! A sweep is the console output of a leave-one-video-out cross-validation
//! run repeated for several window sizes. [`SweepParser`] turns it into the
//! three tables of [`window_sweep_core::SweepTables`]; [`tables`] persists
//! them as CSV; [`output`] renders validation and analysis results.
//!
//! # Example
//!
//! ```
//! use window_sweep_core::{ValidationOptions, validate_sweep};
//!
//! let text = "\
//! Window 5
//! Video Accuracy Precision Recall F1
//! id acc p_nb p_b r_nb r_b f1_nb f1_b name
//! 1 0.80 0.81 0.79 0.82 0.78 0.815 0.785 vidA.mp4 [0]
//! Mean Accuracy: 0.8000 (std: 0.0000)
//! ";
//!
//! let parse = window_sweep_parser::parse_sweep_text(text);
//! let report = validate_sweep(&parse.tables, &ValidationOptions::default());
//! assert!(report.row_counts.passed);
//! ```

use std::path::Path;

pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod report;
pub mod tables;

pub use config::SweepConfig;
pub use error::{Result, SweepError};
pub use output::OutputFormat;
pub use parser::{ParseOptions, SweepParse, SweepParser};
pub use report::ParseRunReport;

/// Parses sweep text with default options.
pub fn parse_sweep_text(text: &str) -> SweepParse {
    SweepParser::new(text).parse()
}

/// Parses sweep text with explicit options.
pub fn parse_sweep_text_with(text: &str, options: &ParseOptions) -> SweepParse {
    SweepParser::with_options(text, *options).parse()
}

/// Reads and parses a sweep file, returning the raw text alongside the
/// result so callers can fingerprint it.
///
/// Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
///
/// Returns [`SweepError::Io`] if the file cannot be read.
pub fn parse_sweep_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<(String, SweepParse)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| SweepError::io(path, err))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let parse = parse_sweep_text_with(&text, options);
    Ok((text, parse))
}
