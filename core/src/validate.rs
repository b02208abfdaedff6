//! Cross-table consistency validation.
//!
//! Checks the invariants a well-formed sweep satisfies: every window covers
//! the same test cases, metric values lie in `[0, 1]`, nothing is missing or
//! duplicated, and the reported per-window aggregates agree with the values
//! recomputed from the video rows.
//!
//! Validation never fails with an error. Every check returns a complete
//! result whose `issues` itemize the discrepancies found, and
//! [`validate_sweep`] folds the four checks into one [`ValidationReport`].
//!
//! # Examples
//!
//! ```
//! use window_sweep_core::*;
//!
//! let mut tables = SweepTables::default();
//! tables.videos.push(VideoResult::new(5, 1, "vidA.mp4", Some(0), [0.8; 7]));
//! let mut stats = SummaryStats::new(5);
//! stats.mean_accuracy = Some(0.8);
//! stats.sd_accuracy = Some(0.0);
//! tables.summaries.push(stats);
//!
//! let report = validate_sweep(&tables, &ValidationOptions::default());
//! assert!(report.aggregates.passed);
//! // The summary omits the F1 statistics, which counts as missing values.
//! assert!(!report.integrity.no_missing_values);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::aggregate_by_window;
use crate::{CaseKey, MetricColumn, SummaryField, SummaryStats, SweepTables, VideoResult};

/// Absolute tolerance used when comparing reported and recomputed aggregates.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Knobs for [`validate_sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Maximum absolute difference between a reported and a recomputed
    /// aggregate.
    pub tolerance: f64,
    /// Count (video name, identity) test cases instead of video names in the
    /// row-count and duplicate checks.
    pub count_by_identity: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            count_by_identity: false,
        }
    }
}

/// The three exported tables, for naming issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    VideoResults,
    SummaryStats,
    FeatureImportance,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VideoResults => write!(f, "video results"),
            Self::SummaryStats => write!(f, "summary stats"),
            Self::FeatureImportance => write!(f, "feature importance"),
        }
    }
}

/// One itemized validation discrepancy.
///
/// The `Display` impl provides the human-readable report line.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// No video rows were parsed at all.
    #[error("empty video table")]
    EmptyVideoTable,
    /// Video rows exist but no summary statistics were parsed.
    #[error("no summary statistics to cross-check")]
    NoSummaryStats,
    /// A table's row count differs from what the other tables imply.
    #[error("{table}: {actual} rows (expected {expected})")]
    RowCountMismatch {
        table: TableKind,
        actual: usize,
        expected: usize,
    },
    /// A window holds a different number of test cases than the reference.
    #[error(
        "Window {window}: {count} (video, identity) pairs, reference window {reference_window} has {reference_count}"
    )]
    CaseCountMismatch {
        window: u32,
        count: usize,
        reference_window: u32,
        reference_count: usize,
    },
    /// Test cases present in the reference window but absent here.
    #[error("Window {window}: missing (video, identity) pairs: {}", join_cases(.cases))]
    MissingCases { window: u32, cases: Vec<CaseKey> },
    /// Test cases present here but absent from the reference window.
    #[error("Window {window}: extra (video, identity) pairs: {}", join_cases(.cases))]
    ExtraCases { window: u32, cases: Vec<CaseKey> },
    /// A metric column has values outside `[0, 1]`.
    #[error("Column '{column}' has values outside [0,1]: min={min}, max={max}")]
    OutOfRange {
        column: MetricColumn,
        min: f64,
        max: f64,
    },
    /// A column has missing (absent or NaN) values.
    #[error("{table} column '{column}' has {count} missing values")]
    MissingValues {
        table: TableKind,
        column: String,
        count: usize,
    },
    /// A test case appears more than once within one window.
    #[error("Video '{case}' in window {window} has {count} rows (expected 1)")]
    DuplicateCase {
        window: u32,
        case: CaseKey,
        count: usize,
    },
    /// A reported aggregate differs from the recomputed one beyond tolerance.
    #[error("Window {window}: {field} mismatch (reported={reported:.6}, computed={computed:.6})")]
    AggregateMismatch {
        window: u32,
        field: SummaryField,
        reported: f64,
        computed: f64,
    },
    /// Summary statistics exist for a window with no video rows.
    #[error("Window {window}: summary statistics have no video rows to compare against")]
    SummaryWithoutVideos { window: u32 },
}

fn join_cases(cases: &[CaseKey]) -> String {
    cases
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of [`check_row_counts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowCountCheck {
    pub passed: bool,
    pub video_rows: usize,
    pub summary_rows: usize,
    pub feature_rows: usize,
    pub expected_video_rows: Option<usize>,
    pub expected_summary_rows: Option<usize>,
    pub expected_feature_rows: Option<usize>,
    pub issues: Vec<ValidationIssue>,
}

/// Result of [`check_video_sets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSetCheck {
    pub passed: bool,
    pub reference_window: Option<u32>,
    pub cases_per_window: BTreeMap<u32, usize>,
    pub issues: Vec<ValidationIssue>,
}

/// Result of [`check_integrity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityCheck {
    pub passed: bool,
    pub numeric_ranges_valid: bool,
    pub no_missing_values: bool,
    pub complete_performance_data: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Result of [`check_aggregates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateCheck {
    pub passed: bool,
    pub tolerance: f64,
    pub windows_compared: Vec<u32>,
    pub issues: Vec<ValidationIssue>,
}

/// Outcome of a full validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub row_counts: RowCountCheck,
    pub video_sets: VideoSetCheck,
    pub integrity: IntegrityCheck,
    pub aggregates: AggregateCheck,
    /// Every issue of every check, rendered as a report line.
    pub discrepancies: Vec<String>,
}

impl ValidationReport {
    pub fn from_checks(
        row_counts: RowCountCheck,
        video_sets: VideoSetCheck,
        integrity: IntegrityCheck,
        aggregates: AggregateCheck,
    ) -> Self {
        let passed = row_counts.passed && video_sets.passed && integrity.passed && aggregates.passed;
        let discrepancies = row_counts
            .issues
            .iter()
            .chain(&video_sets.issues)
            .chain(&integrity.issues)
            .chain(&aggregates.issues)
            .map(ToString::to_string)
            .collect();

        Self {
            passed,
            row_counts,
            video_sets,
            integrity,
            aggregates,
            discrepancies,
        }
    }

    /// All structured issues, in check order.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.row_counts
            .issues
            .iter()
            .chain(&self.video_sets.issues)
            .chain(&self.integrity.issues)
            .chain(&self.aggregates.issues)
    }
}

/// Runs every check against the parsed tables.
pub fn validate_sweep(tables: &SweepTables, options: &ValidationOptions) -> ValidationReport {
    ValidationReport::from_checks(
        check_row_counts(tables, options),
        check_video_sets(&tables.videos),
        check_integrity(&tables.videos, &tables.summaries, options),
        check_aggregates(&tables.videos, &tables.summaries, options.tolerance),
    )
}

fn count_key(row: &VideoResult, options: &ValidationOptions) -> CaseKey {
    if options.count_by_identity {
        row.case_key()
    } else {
        CaseKey {
            video_name: row.video_name.clone(),
            identity: None,
        }
    }
}

/// Checks that the tables hold as many rows as the sweep's dimensions imply.
///
/// Expected video rows are distinct videos times distinct windows, expected
/// summary rows are one per window, and expected feature rows are the sum
/// of the per-window feature groups.
pub fn check_row_counts(tables: &SweepTables, options: &ValidationOptions) -> RowCountCheck {
    let mut check = RowCountCheck {
        passed: true,
        video_rows: tables.videos.len(),
        summary_rows: tables.summaries.len(),
        feature_rows: tables.features.len(),
        expected_video_rows: None,
        expected_summary_rows: None,
        expected_feature_rows: None,
        issues: Vec::new(),
    };

    if tables.videos.is_empty() {
        check.passed = false;
        check.issues.push(ValidationIssue::EmptyVideoTable);
        return check;
    }

    let n_windows = tables.video_window_sizes().len();
    let n_videos = tables
        .videos
        .iter()
        .map(|row| count_key(row, options))
        .collect::<BTreeSet<_>>()
        .len();

    let expected_video_rows = n_videos * n_windows;
    check.expected_video_rows = Some(expected_video_rows);
    if check.video_rows != expected_video_rows {
        check.passed = false;
        check.issues.push(ValidationIssue::RowCountMismatch {
            table: TableKind::VideoResults,
            actual: check.video_rows,
            expected: expected_video_rows,
        });
    }

    check.expected_summary_rows = Some(n_windows);
    if check.summary_rows != n_windows {
        check.passed = false;
        check.issues.push(ValidationIssue::RowCountMismatch {
            table: TableKind::SummaryStats,
            actual: check.summary_rows,
            expected: n_windows,
        });
    }

    if !tables.features.is_empty() {
        let mut per_window: BTreeMap<u32, usize> = BTreeMap::new();
        for feature in &tables.features {
            *per_window.entry(feature.window_size).or_default() += 1;
        }
        let expected_feature_rows = per_window.values().sum();
        check.expected_feature_rows = Some(expected_feature_rows);
        if check.feature_rows != expected_feature_rows {
            check.passed = false;
            check.issues.push(ValidationIssue::RowCountMismatch {
                table: TableKind::FeatureImportance,
                actual: check.feature_rows,
                expected: expected_feature_rows,
            });
        }
    }

    check
}

/// Checks that every window evaluated the same (video, identity) pairs.
///
/// The smallest window size is the reference; each other window reports the
/// pairs it is missing and the pairs it has in excess.
pub fn check_video_sets(videos: &[VideoResult]) -> VideoSetCheck {
    let mut check = VideoSetCheck {
        passed: true,
        reference_window: None,
        cases_per_window: BTreeMap::new(),
        issues: Vec::new(),
    };

    if videos.is_empty() {
        check.passed = false;
        check.issues.push(ValidationIssue::EmptyVideoTable);
        return check;
    }

    let mut sets: BTreeMap<u32, BTreeSet<CaseKey>> = BTreeMap::new();
    for row in videos {
        sets.entry(row.window_size).or_default().insert(row.case_key());
    }
    check.cases_per_window = sets.iter().map(|(window, set)| (*window, set.len())).collect();

    let mut windows = sets.iter();
    let Some((reference_window, reference)) = windows.next() else {
        return check;
    };
    check.reference_window = Some(*reference_window);

    for (window, current) in windows {
        if current.len() != reference.len() {
            check.passed = false;
            check.issues.push(ValidationIssue::CaseCountMismatch {
                window: *window,
                count: current.len(),
                reference_window: *reference_window,
                reference_count: reference.len(),
            });
        }

        if current == reference {
            continue;
        }
        check.passed = false;

        let missing: Vec<CaseKey> = reference.difference(current).cloned().collect();
        let extra: Vec<CaseKey> = current.difference(reference).cloned().collect();
        if !missing.is_empty() {
            check.issues.push(ValidationIssue::MissingCases {
                window: *window,
                cases: missing,
            });
        }
        if !extra.is_empty() {
            check.issues.push(ValidationIssue::ExtraCases {
                window: *window,
                cases: extra,
            });
        }
    }

    check
}

/// Checks metric ranges, missing values and per-window duplicates.
pub fn check_integrity(
    videos: &[VideoResult],
    summaries: &[SummaryStats],
    options: &ValidationOptions,
) -> IntegrityCheck {
    let mut check = IntegrityCheck {
        passed: true,
        numeric_ranges_valid: true,
        no_missing_values: true,
        complete_performance_data: true,
        issues: Vec::new(),
    };

    if videos.is_empty() {
        check.complete_performance_data = false;
        check.issues.push(ValidationIssue::EmptyVideoTable);
    } else {
        check_video_values(videos, &mut check);
        check_duplicates(videos, options, &mut check);
    }
    check_summary_values(summaries, &mut check);

    check.passed =
        check.numeric_ranges_valid && check.no_missing_values && check.complete_performance_data;
    check
}

fn check_video_values(videos: &[VideoResult], check: &mut IntegrityCheck) {
    let blank_names = videos
        .iter()
        .filter(|row| row.video_name.trim().is_empty())
        .count();
    record_missing(check, TableKind::VideoResults, "video_name", blank_names);

    let absent_identities = videos.iter().filter(|row| row.identity.is_none()).count();
    record_missing(check, TableKind::VideoResults, "identity", absent_identities);

    for column in MetricColumn::ALL {
        let values: Vec<f64> = videos.iter().map(|row| row.metric(column)).collect();
        let nan_count = values.iter().filter(|value| value.is_nan()).count();
        record_missing(check, TableKind::VideoResults, column.as_str(), nan_count);

        let present = values.iter().copied().filter(|value| !value.is_nan());
        let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if nan_count < values.len() && (min < 0.0 || max > 1.0) {
            check.numeric_ranges_valid = false;
            check
                .issues
                .push(ValidationIssue::OutOfRange { column, min, max });
        }
    }
}

fn check_duplicates(videos: &[VideoResult], options: &ValidationOptions, check: &mut IntegrityCheck) {
    let mut counts: BTreeMap<(u32, CaseKey), usize> = BTreeMap::new();
    for row in videos {
        *counts
            .entry((row.window_size, count_key(row, options)))
            .or_default() += 1;
    }

    for ((window, case), count) in counts {
        if count != 1 {
            check.complete_performance_data = false;
            check.issues.push(ValidationIssue::DuplicateCase {
                window,
                case,
                count,
            });
        }
    }
}

fn check_summary_values(summaries: &[SummaryStats], check: &mut IntegrityCheck) {
    for field in SummaryField::ALL {
        let missing = summaries
            .iter()
            .filter(|stats| stats.get(field).is_none_or(f64::is_nan))
            .count();
        record_missing(check, TableKind::SummaryStats, field.as_str(), missing);
    }
}

fn record_missing(check: &mut IntegrityCheck, table: TableKind, column: &str, count: usize) {
    if count == 0 {
        return;
    }
    check.no_missing_values = false;
    check.issues.push(ValidationIssue::MissingValues {
        table,
        column: column.to_string(),
        count,
    });
}

/// Compares reported summary statistics with aggregates recomputed from the
/// video rows (mean and population standard deviation per window).
///
/// Absent statistics are not compared; they are reported by
/// [`check_integrity`] instead.
pub fn check_aggregates(
    videos: &[VideoResult],
    summaries: &[SummaryStats],
    tolerance: f64,
) -> AggregateCheck {
    let mut check = AggregateCheck {
        passed: true,
        tolerance,
        windows_compared: Vec::new(),
        issues: Vec::new(),
    };

    if videos.is_empty() {
        check.passed = false;
        check.issues.push(ValidationIssue::EmptyVideoTable);
        return check;
    }
    if summaries.is_empty() {
        check.passed = false;
        check.issues.push(ValidationIssue::NoSummaryStats);
        return check;
    }

    let aggregates = aggregate_by_window(videos);
    for stats in summaries {
        let Some(aggregate) = aggregates.get(&stats.window_size) else {
            check.passed = false;
            check.issues.push(ValidationIssue::SummaryWithoutVideos {
                window: stats.window_size,
            });
            continue;
        };
        check.windows_compared.push(stats.window_size);

        for field in SummaryField::ALL {
            let Some(reported) = stats.get(field) else {
                continue;
            };
            let computed = aggregate.computed(field);
            let diff = (reported - computed).abs();
            if diff.is_nan() || diff > tolerance {
                check.passed = false;
                check.issues.push(ValidationIssue::AggregateMismatch {
                    window: stats.window_size,
                    field,
                    reported,
                    computed,
                });
            }
        }
    }

    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureImportance;

    fn row(window: u32, name: &str, identity: Option<u32>, accuracy: f64) -> VideoResult {
        VideoResult::new(window, 1, name, identity, [accuracy, 0.8, 0.8, 0.8, 0.8, 0.8, 0.8])
    }

    fn full_summary(window: u32, mean_accuracy: f64, sd_accuracy: f64) -> SummaryStats {
        SummaryStats {
            window_size: window,
            mean_accuracy: Some(mean_accuracy),
            sd_accuracy: Some(sd_accuracy),
            mean_f1_behavior: Some(0.8),
            sd_f1_behavior: Some(0.0),
            mean_f1_not_behavior: Some(0.8),
            sd_f1_not_behavior: Some(0.0),
        }
    }

    fn consistent_tables() -> SweepTables {
        SweepTables {
            videos: vec![
                row(5, "video1.mp4", Some(0), 0.8),
                row(5, "video2.mp4", Some(0), 0.9),
                row(10, "video1.mp4", Some(0), 0.85),
                row(10, "video2.mp4", Some(0), 0.95),
            ],
            summaries: vec![full_summary(5, 0.85, 0.05), full_summary(10, 0.90, 0.05)],
            features: vec![FeatureImportance {
                window_size: 5,
                rank: 1,
                feature_name: "speed".to_string(),
                importance: 0.4,
            }],
        }
    }

    #[test]
    fn test_validate_sweep_accepts_consistent_tables() {
        let report = validate_sweep(&consistent_tables(), &ValidationOptions::default());
        assert!(report.passed, "unexpected issues: {:?}", report.discrepancies);
        assert_eq!(report.row_counts.expected_video_rows, Some(4));
        assert_eq!(report.row_counts.expected_summary_rows, Some(2));
        assert_eq!(report.row_counts.expected_feature_rows, Some(1));
        assert_eq!(report.video_sets.reference_window, Some(5));
        assert_eq!(report.aggregates.windows_compared, vec![5, 10]);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn test_empty_input_fails_every_check() {
        let report = validate_sweep(&SweepTables::default(), &ValidationOptions::default());
        assert!(!report.passed);
        assert!(!report.row_counts.passed);
        assert!(!report.video_sets.passed);
        assert!(!report.integrity.passed);
        assert!(!report.aggregates.passed);
        assert!(report.discrepancies.iter().all(|d| d == "empty video table"));
        assert_eq!(report.discrepancies.len(), 4);
    }

    #[test]
    fn test_missing_case_in_later_window() {
        let videos = vec![
            row(5, "vidA.mp4", Some(0), 0.8),
            row(5, "vidB.mp4", Some(0), 0.8),
            row(10, "vidB.mp4", Some(0), 0.8),
        ];

        let check = check_video_sets(&videos);
        assert!(!check.passed);
        assert_eq!(check.cases_per_window.get(&5), Some(&2));
        assert_eq!(check.cases_per_window.get(&10), Some(&1));

        let missing = check
            .issues
            .iter()
            .find_map(|issue| match issue {
                ValidationIssue::MissingCases { window, cases } => Some((*window, cases.clone())),
                _ => None,
            })
            .expect("missing cases reported");
        assert_eq!(missing.0, 10);
        assert_eq!(
            missing.1,
            vec![CaseKey {
                video_name: "vidA.mp4".to_string(),
                identity: Some(0)
            }]
        );
        assert!(
            check
                .issues
                .iter()
                .any(|issue| issue.to_string() == "Window 10: missing (video, identity) pairs: vidA.mp4 [0]")
        );
    }

    #[test]
    fn test_same_size_sets_with_different_members() {
        let videos = vec![
            row(5, "a.mp4", Some(0), 0.8),
            row(10, "a.mp4", Some(1), 0.8),
        ];

        let check = check_video_sets(&videos);
        assert!(!check.passed);
        assert!(!check
            .issues
            .iter()
            .any(|issue| matches!(issue, ValidationIssue::CaseCountMismatch { .. })));
        assert!(check
            .issues
            .iter()
            .any(|issue| matches!(issue, ValidationIssue::ExtraCases { window: 10, .. })));
    }

    #[test]
    fn test_out_of_range_accuracy_reports_column_bounds() {
        let videos = vec![row(5, "a.mp4", Some(0), 1.2), row(5, "b.mp4", Some(0), 0.7)];
        let check = check_integrity(&videos, &[full_summary(5, 0.95, 0.25)], &ValidationOptions::default());

        assert!(!check.passed);
        assert!(!check.numeric_ranges_valid);
        assert!(check.no_missing_values);
        assert!(check.issues.contains(&ValidationIssue::OutOfRange {
            column: MetricColumn::Accuracy,
            min: 0.7,
            max: 1.2,
        }));
        assert_eq!(
            check.issues[0].to_string(),
            "Column 'accuracy' has values outside [0,1]: min=0.7, max=1.2"
        );
    }

    #[test]
    fn test_nan_metric_and_absent_identity_are_missing_values() {
        let mut nan_row = row(5, "a.mp4", None, 0.5);
        nan_row.recall_behavior = f64::NAN;
        let check = check_integrity(&[nan_row], &[], &ValidationOptions::default());

        assert!(!check.no_missing_values);
        assert!(check.numeric_ranges_valid);
        let columns: Vec<String> = check
            .issues
            .iter()
            .filter_map(|issue| match issue {
                ValidationIssue::MissingValues { column, .. } => Some(column.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(columns, vec!["identity".to_string(), "recall_behavior".to_string()]);
    }

    #[test]
    fn test_absent_summary_statistics_are_missing_values() {
        let mut partial = SummaryStats::new(5);
        partial.mean_accuracy = Some(0.8);
        let check = check_integrity(&[row(5, "a.mp4", Some(0), 0.8)], &[partial], &ValidationOptions::default());

        assert!(!check.no_missing_values);
        assert_eq!(
            check
                .issues
                .iter()
                .filter(|issue| matches!(issue, ValidationIssue::MissingValues { table: TableKind::SummaryStats, .. }))
                .count(),
            5
        );
    }

    #[test]
    fn test_duplicate_video_rows_in_window() {
        let videos = vec![row(5, "a.mp4", Some(0), 0.8), row(5, "a.mp4", Some(1), 0.8)];

        let by_name = check_integrity(&videos, &[], &ValidationOptions::default());
        assert!(!by_name.complete_performance_data);
        assert!(by_name.issues.iter().any(|issue| issue.to_string()
            == "Video 'a.mp4' in window 5 has 2 rows (expected 1)"));

        let options = ValidationOptions {
            count_by_identity: true,
            ..ValidationOptions::default()
        };
        let by_case = check_integrity(&videos, &[], &options);
        assert!(by_case.complete_performance_data);
    }

    #[test]
    fn test_row_counts_by_name_and_by_identity() {
        let tables = SweepTables {
            videos: vec![
                row(5, "a.mp4", Some(0), 0.8),
                row(5, "a.mp4", Some(1), 0.8),
                row(10, "a.mp4", Some(0), 0.8),
                row(10, "a.mp4", Some(1), 0.8),
            ],
            summaries: vec![full_summary(5, 0.8, 0.0), full_summary(10, 0.8, 0.0)],
            features: Vec::new(),
        };

        let by_name = check_row_counts(&tables, &ValidationOptions::default());
        assert!(!by_name.passed);
        assert_eq!(by_name.expected_video_rows, Some(2));
        assert_eq!(
            by_name.issues,
            vec![ValidationIssue::RowCountMismatch {
                table: TableKind::VideoResults,
                actual: 4,
                expected: 2,
            }]
        );
        assert_eq!(by_name.expected_feature_rows, None);

        let options = ValidationOptions {
            count_by_identity: true,
            ..ValidationOptions::default()
        };
        let by_case = check_row_counts(&tables, &options);
        assert!(by_case.passed);
        assert_eq!(by_case.expected_video_rows, Some(4));
    }

    #[test]
    fn test_missing_summary_row_fails_row_counts() {
        let mut tables = consistent_tables();
        tables.summaries.pop();
        let check = check_row_counts(&tables, &ValidationOptions::default());
        assert!(!check.passed);
        assert_eq!(check.issues[0].to_string(), "summary stats: 1 rows (expected 2)");
    }

    #[test]
    fn test_aggregate_mismatch_names_window_and_values() {
        let videos = vec![row(5, "a.mp4", Some(0), 0.8), row(5, "b.mp4", Some(0), 0.9)];
        let summaries = vec![full_summary(5, 0.9, 0.05)];

        let check = check_aggregates(&videos, &summaries, DEFAULT_TOLERANCE);
        assert!(!check.passed);
        assert_eq!(check.issues.len(), 1);
        match &check.issues[0] {
            ValidationIssue::AggregateMismatch {
                window,
                field,
                reported,
                computed,
            } => {
                assert_eq!(*window, 5);
                assert_eq!(*field, SummaryField::MeanAccuracy);
                assert_eq!(*reported, 0.9);
                assert!((computed - 0.85).abs() < 1e-12);
            }
            other => panic!("unexpected issue: {other:?}"),
        }
        assert_eq!(
            check.issues[0].to_string(),
            "Window 5: mean_accuracy mismatch (reported=0.900000, computed=0.850000)"
        );
    }

    #[test]
    fn test_aggregate_within_tolerance_passes() {
        let videos = vec![row(5, "a.mp4", Some(0), 0.8), row(5, "b.mp4", Some(0), 0.9)];
        let summaries = vec![full_summary(5, 0.8504, 0.0496)];
        assert!(check_aggregates(&videos, &summaries, DEFAULT_TOLERANCE).passed);
        assert!(!check_aggregates(&videos, &summaries, 0.0001).passed);
    }

    #[test]
    fn test_aggregate_skips_absent_fields_and_flags_orphan_windows() {
        let videos = vec![row(5, "a.mp4", Some(0), 0.8)];
        let summaries = vec![SummaryStats::new(5), SummaryStats::new(20)];

        let check = check_aggregates(&videos, &summaries, DEFAULT_TOLERANCE);
        assert!(!check.passed);
        assert_eq!(check.windows_compared, vec![5]);
        assert_eq!(check.issues, vec![ValidationIssue::SummaryWithoutVideos { window: 20 }]);
    }

    #[test]
    fn test_aggregate_without_summaries_fails() {
        let check = check_aggregates(&[row(5, "a.mp4", Some(0), 0.8)], &[], DEFAULT_TOLERANCE);
        assert!(!check.passed);
        assert_eq!(check.issues, vec![ValidationIssue::NoSummaryStats]);
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = ValidationIssue::MissingCases {
            window: 10,
            cases: vec![CaseKey {
                video_name: "vidA.mp4".to_string(),
                identity: Some(0),
            }],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "missing_cases");
        assert_eq!(json["cases"][0]["video_name"], "vidA.mp4");
    }
}
