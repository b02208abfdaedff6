//! Sweep output parser.
//!
//! The input is a loosely formatted log: `Window <N>` markers open a
//! section, and each section may hold a per-video results table, a block of
//! summary statistics and a ranked feature-importance table. Prose, rules
//! and anything unrecognized in between is skipped.
//!
//! # Architecture
//!
//! Scanning is an explicit state machine. [`transition`] is a pure function
//! from the current [`ScanState`] and the remaining input lines to the next
//! state, the number of lines consumed, and at most one [`Emission`].
//! [`SweepParser`] drives it forward over the whole input once and folds
//! the emissions into tables, metadata and diagnostics.
//!
//! Content problems never fail a parse. A malformed row is dropped and
//! recorded in [`ParseDiagnostics`]; a missing statistic is left absent.

pub mod diagnostics;
pub mod patterns;
pub mod records;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use window_sweep_core::{FeatureImportance, SummaryStats, SweepMetadata, SweepTables, VideoResult};

pub use diagnostics::{MalformedRow, ParseDiagnostics};

use diagnostics::excerpt;
use patterns::{
    has_end_of_table_keyword, is_feature_table_header, is_percent_separator, is_summary_trigger,
    is_table_rule, is_video_row_start, is_video_table_header, window_marker,
};
use records::{parse_feature_importance, parse_summary_stats, parse_video_row};

/// Default number of lines scanned for summary statistics, trigger included.
pub const DEFAULT_SUMMARY_LOOKAHEAD: usize = 10;

/// Lines skipped after a table header: the header and its column-name line.
const HEADER_LINES: usize = 2;

/// Tunables for one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Lines collected for a summary block, starting at the trigger line.
    pub summary_lookahead: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            summary_lookahead: DEFAULT_SUMMARY_LOOKAHEAD,
        }
    }
}

/// Window context of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No window marker seen yet; section headers are ignored.
    NoWindow,
    /// Inside the section of the given window size.
    InWindow(u32),
}

impl ScanState {
    pub fn window(self) -> Option<u32> {
        match self {
            Self::NoWindow => None,
            Self::InWindow(window_size) => Some(window_size),
        }
    }
}

/// What a transition produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// A complete video table. `rejected` holds the rows that looked like
    /// data but failed to parse, as (offset from the header line, text).
    VideoTable {
        window_size: u32,
        rows: Vec<VideoResult>,
        rejected: Vec<(usize, String)>,
    },
    Summary(SummaryStats),
    Features {
        window_size: u32,
        features: Vec<FeatureImportance>,
    },
    /// A section header seen before any window marker.
    OrphanHeader,
}

/// Result of one [`transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ScanState,
    /// Lines consumed, always at least one.
    pub consumed: usize,
    pub emitted: Option<Emission>,
}

impl Transition {
    fn skip(state: ScanState) -> Self {
        Self {
            state,
            consumed: 1,
            emitted: None,
        }
    }
}

/// Computes the next scan step.
///
/// `lookahead` is the rest of the input starting at the current line. The
/// transition reads as far ahead as the section it recognizes requires and
/// never consumes a line that starts another section.
///
/// # Examples
///
/// ```
/// use window_sweep_parser::parser::{ParseOptions, ScanState, transition};
///
/// let step = transition(ScanState::NoWindow, &["Window 10", "prose"], &ParseOptions::default());
/// assert_eq!(step.state, ScanState::InWindow(10));
/// assert_eq!(step.consumed, 1);
/// assert!(step.emitted.is_none());
/// ```
pub fn transition(state: ScanState, lookahead: &[&str], options: &ParseOptions) -> Transition {
    let Some(line) = lookahead.first() else {
        return Transition::skip(state);
    };

    if let Some(window_size) = window_marker(line) {
        return Transition::skip(ScanState::InWindow(window_size));
    }

    let ScanState::InWindow(window_size) = state else {
        let is_header =
            is_video_table_header(line) || is_summary_trigger(line) || is_feature_table_header(line);
        return Transition {
            emitted: is_header.then_some(Emission::OrphanHeader),
            ..Transition::skip(state)
        };
    };

    if is_video_table_header(line) {
        scan_video_table(window_size, lookahead)
    } else if is_summary_trigger(line) {
        scan_summary(window_size, lookahead, options.summary_lookahead)
    } else if is_feature_table_header(line) {
        scan_feature_table(window_size, lookahead)
    } else {
        Transition::skip(state)
    }
}

fn scan_video_table(window_size: u32, lookahead: &[&str]) -> Transition {
    let mut rows = Vec::new();
    let mut rejected = Vec::new();
    let mut index = HEADER_LINES;

    while let Some(raw) = lookahead.get(index) {
        let line = raw.trim();
        if is_summary_trigger(line) || window_marker(line).is_some() || is_percent_separator(line) {
            break;
        }
        if line.is_empty() || is_table_rule(line) {
            index += 1;
            continue;
        }

        if is_video_row_start(line) {
            match parse_video_row(line, window_size) {
                Some(row) => rows.push(row),
                None => rejected.push((index, line.to_string())),
            }
        } else if has_end_of_table_keyword(line) {
            break;
        }
        index += 1;
    }

    Transition {
        state: ScanState::InWindow(window_size),
        consumed: index.min(lookahead.len()),
        emitted: Some(Emission::VideoTable {
            window_size,
            rows,
            rejected,
        }),
    }
}

fn scan_summary(window_size: u32, lookahead: &[&str], limit: usize) -> Transition {
    let limit = limit.clamp(1, lookahead.len());
    // The trigger line itself is never a window marker.
    let end = (1..limit)
        .find(|&index| window_marker(lookahead[index]).is_some())
        .unwrap_or(limit);

    Transition {
        state: ScanState::InWindow(window_size),
        consumed: end,
        emitted: Some(Emission::Summary(parse_summary_stats(
            &lookahead[..end],
            window_size,
        ))),
    }
}

fn scan_feature_table(window_size: u32, lookahead: &[&str]) -> Transition {
    let start = HEADER_LINES.min(lookahead.len());
    let end = (start..lookahead.len())
        .find(|&index| {
            let line = lookahead[index];
            window_marker(line).is_some() || is_percent_separator(line)
        })
        .unwrap_or(lookahead.len());

    Transition {
        state: ScanState::InWindow(window_size),
        consumed: end.max(1),
        emitted: Some(Emission::Features {
            window_size,
            features: parse_feature_importance(&lookahead[start..end], window_size),
        }),
    }
}

/// Everything extracted from one sweep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepParse {
    pub tables: SweepTables,
    pub metadata: SweepMetadata,
    pub diagnostics: ParseDiagnostics,
}

/// Drives [`transition`] over a whole input.
///
/// # Examples
///
/// ```
/// use window_sweep_parser::parser::SweepParser;
///
/// let text = "\
/// Window 5
/// Video Accuracy Precision Recall F1
/// id acc p_nb p_b r_nb r_b f1_nb f1_b name
/// 1 0.80 0.81 0.79 0.82 0.78 0.815 0.785 vidA.mp4 [0]
/// Mean Accuracy: 0.8000
/// ";
///
/// let parse = SweepParser::new(text).parse();
/// assert_eq!(parse.tables.videos.len(), 1);
/// assert_eq!(parse.tables.summaries[0].mean_accuracy, Some(0.8));
/// assert_eq!(parse.metadata.window_sizes, vec![5]);
/// ```
pub struct SweepParser<'a> {
    lines: Vec<&'a str>,
    options: ParseOptions,
}

impl<'a> SweepParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_options(text, ParseOptions::default())
    }

    pub fn with_options(text: &'a str, options: ParseOptions) -> Self {
        Self {
            lines: text.lines().collect(),
            options,
        }
    }

    pub fn parse(&self) -> SweepParse {
        let mut state = ScanState::NoWindow;
        let mut tables = SweepTables::default();
        let mut window_counts: Vec<(u32, usize)> = Vec::new();
        let mut diagnostics = ParseDiagnostics {
            total_lines: self.lines.len(),
            ..ParseDiagnostics::default()
        };

        let mut index = 0;
        while index < self.lines.len() {
            let step = transition(state, &self.lines[index..], &self.options);

            if step.state != state {
                debug!(window_size = ?step.state.window(), line = index + 1, "Entering window section");
            }

            match step.emitted {
                Some(Emission::VideoTable {
                    window_size,
                    rows,
                    rejected,
                }) => {
                    for (offset, text) in rejected {
                        let line = index + offset + 1;
                        let excerpt = excerpt(&text);
                        warn!(window_size, line, "Could not parse video row: {excerpt}");
                        diagnostics.malformed_rows.push(MalformedRow {
                            line,
                            window_size,
                            excerpt,
                        });
                    }
                    debug!(window_size, count = rows.len(), "Found video rows");
                    window_counts.push((window_size, rows.len()));
                    diagnostics.video_tables += 1;
                    tables.videos.extend(rows);
                }
                Some(Emission::Summary(stats)) => {
                    debug!(window_size = stats.window_size, complete = stats.is_complete(), "Found summary statistics");
                    diagnostics.summary_blocks += 1;
                    tables.summaries.push(stats);
                }
                Some(Emission::Features {
                    window_size,
                    features,
                }) => {
                    debug!(window_size, count = features.len(), "Found feature importance rows");
                    diagnostics.feature_blocks += 1;
                    tables.features.extend(features);
                }
                Some(Emission::OrphanHeader) => {
                    debug!(line = index + 1, "Ignoring section header outside any window");
                    diagnostics.orphan_headers += 1;
                }
                None => {}
            }

            state = step.state;
            index += step.consumed.max(1);
        }

        let metadata = SweepMetadata::from_counts(&window_counts);
        info!(
            windows = metadata.n_windows,
            videos = tables.videos.len(),
            summaries = tables.summaries.len(),
            features = tables.features.len(),
            malformed = diagnostics.malformed_count(),
            "Parsed sweep"
        );

        SweepParse {
            tables,
            metadata,
            diagnostics,
        }
    }
}
