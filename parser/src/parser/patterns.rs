//! Line-pattern matchers.
//!
//! Every matcher inspects a single line and either recognizes it or not.
//! None of them panic on arbitrary input.

use std::sync::LazyLock;

use regex::Regex;
use window_sweep_core::SummaryField;

/// Regex patterns for sweep output.
static PATTERNS: LazyLock<SweepPatterns> = LazyLock::new(SweepPatterns::new);

struct SweepPatterns {
    window_marker: Regex,
    video_row_start: Regex,
    identity_marker: Regex,
    // One per summary statistic, in label-precedence order.
    summary_labels: Vec<(SummaryField, Regex)>,
}

impl SweepPatterns {
    fn new() -> Self {
        // All regexes here are compile-time constants. An expect() failure indicates
        // a programmer error in the pattern, not a runtime condition.
        let label = |pattern: &str| Regex::new(pattern).expect("static regex must compile");
        Self {
            // "Window 15", "window 15 frames", "=== WINDOW 20 ==="
            window_marker: Regex::new(r"(?i)Window\s+(\d+)").expect("static regex must compile"),
            // "12 0.97 ..." or "3 .5 ..."
            video_row_start: Regex::new(r"^\d+\s+[\d.]").expect("static regex must compile"),
            identity_marker: Regex::new(r"\[(\d+)\]").expect("static regex must compile"),
            // Long forms ("Std-Dev F1 Score (Behavior):") and the short forms
            // ("SD F1 (Behavior):") both occur in sweep logs.
            summary_labels: vec![
                (
                    SummaryField::MeanAccuracy,
                    label(r"(?i)\bmean\s+accuracy\s*:\s*([\d.]+)"),
                ),
                (
                    SummaryField::SdAccuracy,
                    label(r"(?i)\b(?:std[- ]dev|sd)\s+accuracy\s*:\s*([\d.]+)"),
                ),
                (
                    SummaryField::MeanF1Behavior,
                    label(r"(?i)\bmean\s+f1(?:\s+score)?\s*\(behavior\)\s*:\s*([\d.]+)"),
                ),
                (
                    SummaryField::SdF1Behavior,
                    label(r"(?i)\b(?:std[- ]dev|sd)\s+f1(?:\s+score)?\s*\(behavior\)\s*:\s*([\d.]+)"),
                ),
                (
                    SummaryField::MeanF1NotBehavior,
                    label(r"(?i)\bmean\s+f1(?:\s+score)?\s*\(not\s+behavior\)\s*:\s*([\d.]+)"),
                ),
                (
                    SummaryField::SdF1NotBehavior,
                    label(
                        r"(?i)\b(?:std[- ]dev|sd)\s+f1(?:\s+score)?\s*\(not\s+behavior\)\s*:\s*([\d.]+)",
                    ),
                ),
            ],
        }
    }
}

/// Keywords that end a video table when found on a non-row line.
const END_OF_TABLE_KEYWORDS: [&str; 4] =
    ["mean accuracy", "classifier:", "behavior:", "final classifier"];

/// Returns the window size of a `Window <N>` marker anywhere in the line.
///
/// # Examples
///
/// ```
/// use window_sweep_parser::parser::patterns::window_marker;
///
/// assert_eq!(window_marker("Window 15 frames"), Some(15));
/// assert_eq!(window_marker("=== window 20 ==="), Some(20));
/// assert_eq!(window_marker("Window Size: 5"), None);
/// ```
pub fn window_marker(line: &str) -> Option<u32> {
    PATTERNS
        .window_marker
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn is_video_table_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("accuracy") && lower.contains("precision") && lower.contains("recall")
}

/// A line opening a block of summary statistics.
pub fn is_summary_trigger(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("mean accuracy:") || lower.contains("mean f1 score")
}

pub fn is_feature_table_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("top") && lower.contains("feature") && lower.contains("importance")
}

/// A `%` separator line longer than 50 characters once trimmed.
pub fn is_percent_separator(line: &str) -> bool {
    line.starts_with('%') && line.trim().chars().count() > 50
}

/// A long line made mostly of dashes (more than 20 of them).
pub fn is_dash_rule(line: &str) -> bool {
    line.chars().count() > 50 && line.chars().filter(|c| *c == '-').count() > 20
}

/// Column rules inside a video table: `--...` or a long `===...` rule.
pub fn is_table_rule(line: &str) -> bool {
    line.starts_with("--") || (line.starts_with('=') && line.chars().count() > 20)
}

/// Digits, whitespace, then a digit or a dot.
pub fn is_video_row_start(line: &str) -> bool {
    PATTERNS.video_row_start.is_match(line)
}

pub fn has_end_of_table_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    END_OF_TABLE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// The first `[<digits>]` group of a video-row remainder.
pub fn identity_marker(remainder: &str) -> Option<u32> {
    PATTERNS
        .identity_marker
        .captures(remainder)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Recognizes a summary-statistic label and returns its numeric token.
///
/// The first label that matches wins. The token is the run of digits and
/// dots after the colon; it is returned unparsed.
pub fn summary_label(line: &str) -> Option<(SummaryField, &str)> {
    PATTERNS.summary_labels.iter().find_map(|(field, pattern)| {
        pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| (*field, m.as_str()))
    })
}
