//! Derived statistics for reporting on a sweep.
//!
//! These are the numbers a report renders next to the raw tables: which
//! videos perform worst, which are most sensitive to the window size, which
//! window wins each summary metric, and the distribution of a metric within
//! each window.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::stats::{mean, population_sd};
use crate::{MetricColumn, StatKind, SummaryField, SummaryStats, SweepTables, VideoResult};

/// Default length of the worst / most sensitive video lists.
pub const DEFAULT_TOP_N: usize = 10;

/// How one video performs across all window sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPerformance {
    pub video_name: String,
    pub n_rows: usize,
    pub mean_accuracy: f64,
    pub sd_accuracy: f64,
    pub mean_f1_behavior: f64,
    pub sd_f1_behavior: f64,
    /// Coefficient of variation of F1 (behavior); `None` when the mean is
    /// not positive.
    pub cv_f1_behavior: Option<f64>,
    /// F1 (behavior) per row, paired with the row's window size.
    pub f1_by_window: Vec<(u32, f64)>,
}

/// Groups rows by video name (identities pooled) and summarizes each video.
///
/// NaN metrics are skipped. Videos appear in first-encounter order.
pub fn video_performance(videos: &[VideoResult]) -> Vec<VideoPerformance> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&VideoResult>> = HashMap::new();
    for row in videos {
        let rows = grouped.entry(row.video_name.as_str()).or_insert_with(|| {
            order.push(row.video_name.as_str());
            Vec::new()
        });
        rows.push(row);
    }

    order
        .into_iter()
        .filter_map(|name| {
            let rows = grouped.get(name)?;
            let accuracies: Vec<f64> = rows
                .iter()
                .map(|row| row.accuracy)
                .filter(|value| !value.is_nan())
                .collect();
            let f1_by_window: Vec<(u32, f64)> = rows
                .iter()
                .map(|row| (row.window_size, row.f1_behavior))
                .filter(|(_, value)| !value.is_nan())
                .collect();
            let f1_values: Vec<f64> = f1_by_window.iter().map(|(_, value)| *value).collect();

            let mean_accuracy = mean(&accuracies)?;
            let mean_f1_behavior = mean(&f1_values).unwrap_or(0.0);
            let sd_f1_behavior = population_sd(&f1_values).unwrap_or(0.0);
            let cv_f1_behavior = (!f1_values.is_empty() && mean_f1_behavior > 0.0)
                .then(|| sd_f1_behavior / mean_f1_behavior);

            Some(VideoPerformance {
                video_name: name.to_string(),
                n_rows: rows.len(),
                mean_accuracy,
                sd_accuracy: population_sd(&accuracies).unwrap_or(0.0),
                mean_f1_behavior,
                sd_f1_behavior,
                cv_f1_behavior,
                f1_by_window,
            })
        })
        .collect()
}

/// Videos sorted by ascending mean accuracy.
pub fn worst_videos(performance: &[VideoPerformance]) -> Vec<VideoPerformance> {
    let mut sorted = performance.to_vec();
    sorted.sort_by(|a, b| a.mean_accuracy.total_cmp(&b.mean_accuracy));
    sorted
}

/// Videos with a coefficient of variation, sorted by descending CV.
pub fn window_sensitive_videos(performance: &[VideoPerformance]) -> Vec<VideoPerformance> {
    let mut sensitive: Vec<VideoPerformance> = performance
        .iter()
        .filter(|video| video.cv_f1_behavior.is_some())
        .cloned()
        .collect();
    sensitive.sort_by(|a, b| {
        let a = a.cv_f1_behavior.unwrap_or(0.0);
        let b = b.cv_f1_behavior.unwrap_or(0.0);
        b.total_cmp(&a)
    });
    sensitive
}

/// The winning window for one summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestWindow {
    pub field: SummaryField,
    pub window_size: u32,
    pub value: f64,
}

/// Best window per summary statistic: highest mean, lowest standard
/// deviation.
///
/// Absent values are ignored and ties keep the first window encountered.
/// Statistics absent from every record are omitted.
///
/// # Examples
///
/// ```
/// use window_sweep_core::{SummaryField, SummaryStats, analysis::best_windows};
///
/// let mut five = SummaryStats::new(5);
/// five.mean_accuracy = Some(0.80);
/// five.sd_accuracy = Some(0.02);
/// let mut ten = SummaryStats::new(10);
/// ten.mean_accuracy = Some(0.85);
/// ten.sd_accuracy = Some(0.04);
///
/// let best = best_windows(&[five, ten]);
/// assert_eq!(best[&SummaryField::MeanAccuracy].window_size, 10);
/// assert_eq!(best[&SummaryField::SdAccuracy].window_size, 5);
/// ```
pub fn best_windows(summaries: &[SummaryStats]) -> BTreeMap<SummaryField, BestWindow> {
    let mut best: BTreeMap<SummaryField, BestWindow> = BTreeMap::new();
    for stats in summaries {
        for field in SummaryField::ALL {
            let Some(value) = stats.get(field).filter(|value| !value.is_nan()) else {
                continue;
            };
            let better = match best.get(&field) {
                None => true,
                Some(current) => match field.kind() {
                    StatKind::Mean => value > current.value,
                    StatKind::StdDev => value < current.value,
                },
            };
            if better {
                best.insert(
                    field,
                    BestWindow {
                        field,
                        window_size: stats.window_size,
                        value,
                    },
                );
            }
        }
    }
    best
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxPlotStats {
    /// Computes the summary with index quartiles (`sorted[floor(n * p)]`)
    /// and whiskers at 1.5 IQR, clamped to the data range.
    ///
    /// Returns `None` when no non-NaN value is given.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let at = |p: f64| sorted[((n as f64 * p) as usize).min(n - 1)];
        let (q1, median, q3) = (at(0.25), at(0.5), at(0.75));
        let min = sorted[0];
        let max = sorted[n - 1];

        let iqr = q3 - q1;
        let lower_whisker = min.max(q1 - 1.5 * iqr);
        let upper_whisker = max.min(q3 + 1.5 * iqr);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lower_whisker || *v > upper_whisker)
            .collect();

        Some(Self {
            min,
            q1,
            median,
            q3,
            max,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Distribution of `column` within each window size.
pub fn window_box_plots(videos: &[VideoResult], column: MetricColumn) -> BTreeMap<u32, BoxPlotStats> {
    let mut values: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for row in videos {
        values.entry(row.window_size).or_default().push(row.metric(column));
    }
    values
        .into_iter()
        .filter_map(|(window, values)| BoxPlotStats::from_values(&values).map(|stats| (window, stats)))
        .collect()
}

/// Everything the `analyze` report shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepAnalysis {
    pub window_sizes: Vec<u32>,
    pub worst_videos: Vec<VideoPerformance>,
    pub sensitive_videos: Vec<VideoPerformance>,
    pub best_windows: Vec<BestWindow>,
    pub accuracy_distribution: BTreeMap<u32, BoxPlotStats>,
}

impl SweepAnalysis {
    /// Analyzes `tables`, keeping at most `top_n` videos per list.
    pub fn from_tables(tables: &SweepTables, top_n: usize) -> Self {
        let performance = video_performance(&tables.videos);

        let mut worst = worst_videos(&performance);
        worst.truncate(top_n);
        let mut sensitive = window_sensitive_videos(&performance);
        sensitive.truncate(top_n);

        Self {
            window_sizes: tables.video_window_sizes(),
            worst_videos: worst,
            sensitive_videos: sensitive,
            best_windows: best_windows(&tables.summaries).into_values().collect(),
            accuracy_distribution: window_box_plots(&tables.videos, MetricColumn::Accuracy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(window: u32, name: &str, accuracy: f64, f1_behavior: f64) -> VideoResult {
        VideoResult::new(window, 1, name, Some(0), [accuracy, 0.5, 0.5, 0.5, 0.5, 0.5, f1_behavior])
    }

    fn sample_videos() -> Vec<VideoResult> {
        vec![
            row(5, "steady.mp4", 0.90, 0.80),
            row(10, "steady.mp4", 0.90, 0.80),
            row(5, "jumpy.mp4", 0.70, 0.40),
            row(10, "jumpy.mp4", 0.80, 0.80),
            row(5, "dead.mp4", 0.50, 0.0),
            row(10, "dead.mp4", 0.60, 0.0),
        ]
    }

    #[test]
    fn test_video_performance_keeps_encounter_order() {
        let performance = video_performance(&sample_videos());
        let names: Vec<&str> = performance.iter().map(|v| v.video_name.as_str()).collect();
        assert_eq!(names, vec!["steady.mp4", "jumpy.mp4", "dead.mp4"]);

        let jumpy = &performance[1];
        assert_eq!(jumpy.n_rows, 2);
        assert!((jumpy.mean_accuracy - 0.75).abs() < 1e-12);
        assert!((jumpy.sd_accuracy - 0.05).abs() < 1e-12);
        assert!((jumpy.mean_f1_behavior - 0.6).abs() < 1e-12);
        assert!((jumpy.cv_f1_behavior.unwrap() - 0.2 / 0.6).abs() < 1e-12);
        assert_eq!(jumpy.f1_by_window, vec![(5, 0.40), (10, 0.80)]);
    }

    #[test]
    fn test_cv_absent_when_mean_f1_is_zero() {
        let performance = video_performance(&sample_videos());
        assert_eq!(performance[2].cv_f1_behavior, None);
        assert_eq!(performance[0].cv_f1_behavior, Some(0.0));
    }

    #[test]
    fn test_worst_and_sensitive_orderings() {
        let performance = video_performance(&sample_videos());

        let worst: Vec<String> = worst_videos(&performance)
            .into_iter()
            .map(|v| v.video_name)
            .collect();
        assert_eq!(worst, vec!["dead.mp4", "jumpy.mp4", "steady.mp4"]);

        let sensitive: Vec<String> = window_sensitive_videos(&performance)
            .into_iter()
            .map(|v| v.video_name)
            .collect();
        assert_eq!(sensitive, vec!["jumpy.mp4", "steady.mp4"]);
    }

    #[test]
    fn test_best_windows_ties_keep_first_and_skip_absent() {
        let mut five = SummaryStats::new(5);
        five.mean_f1_behavior = Some(0.7);
        let mut ten = SummaryStats::new(10);
        ten.mean_f1_behavior = Some(0.7);
        ten.sd_f1_behavior = Some(0.1);

        let best = best_windows(&[five, ten]);
        assert_eq!(best[&SummaryField::MeanF1Behavior].window_size, 5);
        assert_eq!(best[&SummaryField::SdF1Behavior].window_size, 10);
        assert!(!best.contains_key(&SummaryField::MeanAccuracy));
    }

    #[test]
    fn test_box_plot_index_quartiles_and_outliers() {
        let stats = BoxPlotStats::from_values(&[0.9, 0.1, 0.82, 0.85, 0.88, 0.86, 0.84, 0.83]).unwrap();
        // sorted: 0.1 0.82 0.83 0.84 0.85 0.86 0.88 0.9
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.q1, 0.83);
        assert_eq!(stats.median, 0.85);
        assert_eq!(stats.q3, 0.88);
        assert_eq!(stats.max, 0.9);
        assert_eq!(stats.upper_whisker, 0.9);
        assert!((stats.lower_whisker - (0.83 - 1.5 * (0.88 - 0.83))).abs() < 1e-12);
        assert_eq!(stats.outliers, vec![0.1]);
    }

    #[test]
    fn test_box_plot_of_single_value_and_empty() {
        let stats = BoxPlotStats::from_values(&[0.5]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (0.5, 0.5, 0.5));
        assert!(stats.outliers.is_empty());
        assert_eq!(BoxPlotStats::from_values(&[]), None);
        assert_eq!(BoxPlotStats::from_values(&[f64::NAN]), None);
    }

    #[test]
    fn test_sweep_analysis_truncates_lists() {
        let tables = SweepTables {
            videos: sample_videos(),
            ..SweepTables::default()
        };
        let analysis = SweepAnalysis::from_tables(&tables, 1);
        assert_eq!(analysis.window_sizes, vec![5, 10]);
        assert_eq!(analysis.worst_videos.len(), 1);
        assert_eq!(analysis.worst_videos[0].video_name, "dead.mp4");
        assert_eq!(analysis.sensitive_videos.len(), 1);
        assert!(analysis.best_windows.is_empty());
        assert_eq!(analysis.accuracy_distribution.len(), 2);
    }
}
