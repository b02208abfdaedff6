//! Run report written next to the exported tables.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use window_sweep_core::SweepMetadata;

use crate::error::{Result, SweepError};
use crate::parser::{MalformedRow, SweepParse};

/// File name of the run report inside an output directory.
pub const RUN_REPORT_FILE: &str = "parse-report.json";

/// Row counts of the three tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub video_results: usize,
    pub summary_stats: usize,
    pub feature_importance: usize,
}

/// Provenance and outcome of parsing one sweep file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseRunReport {
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    pub tool_version: String,
    /// Input path as given on the command line.
    pub source: String,
    /// SHA-256 hex digest of the input text.
    pub source_sha256: String,
    pub line_count: usize,
    pub rows: TableCounts,
    pub metadata: SweepMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_rows: Vec<MalformedRow>,
    pub warnings: Vec<String>,
}

impl ParseRunReport {
    /// Builds the report for `parse`, which was produced from `text`.
    pub fn new(source: &str, text: &str, parse: &SweepParse) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            source: source.to_string(),
            source_sha256: sha256_hex(text.as_bytes()),
            line_count: parse.diagnostics.total_lines,
            rows: TableCounts {
                video_results: parse.tables.videos.len(),
                summary_stats: parse.tables.summaries.len(),
                feature_importance: parse.tables.features.len(),
            },
            metadata: parse.metadata.clone(),
            malformed_rows: parse.diagnostics.malformed_rows.clone(),
            warnings: parse.diagnostics.warnings(),
        }
    }

    /// Writes the report as pretty JSON to [`RUN_REPORT_FILE`] inside `dir`.
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(RUN_REPORT_FILE);
        let file = File::create(&path).map_err(|err| SweepError::io(&path, err))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(path)
    }
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
