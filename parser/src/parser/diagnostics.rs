//! Diagnostics collected while scanning a sweep.

use serde::{Deserialize, Serialize};

/// Malformed rows keep at most this many characters of the offending line.
pub const EXCERPT_CHARS: usize = 80;

/// A row that looked like a video row but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRow {
    /// 1-based line number in the input.
    pub line: usize,
    pub window_size: u32,
    pub excerpt: String,
}

/// Counts and samples gathered during one parse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseDiagnostics {
    pub total_lines: usize,
    pub video_tables: usize,
    pub summary_blocks: usize,
    pub feature_blocks: usize,
    /// Lines outside any window that looked like section headers.
    pub orphan_headers: usize,
    pub malformed_rows: Vec<MalformedRow>,
}

impl ParseDiagnostics {
    pub fn malformed_count(&self) -> usize {
        self.malformed_rows.len()
    }

    /// Human-readable warnings for anything a reader should double-check.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.video_tables == 0 {
            warnings.push("No video tables found".to_string());
        }
        if self.summary_blocks == 0 {
            warnings.push("No summary statistics found".to_string());
        }

        if !self.malformed_rows.is_empty() {
            warnings.push(format!(
                "Dropped {} malformed video rows (first at line {})",
                self.malformed_rows.len(),
                self.malformed_rows[0].line
            ));
        }

        if self.orphan_headers > 0 {
            warnings.push(format!(
                "Ignored {} section headers before the first window marker",
                self.orphan_headers
            ));
        }

        warnings
    }
}

/// Truncates a line for logging.
pub fn excerpt(line: &str) -> String {
    line.chars().take(EXCERPT_CHARS).collect()
}
