//! Record types for parsed window-size sweep output.
//!
//! This module defines the tables extracted from sweep text. The types are
//! designed for serialization with [`serde`]; field names double as the
//! column names of the CSV and JSON exports.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One classifier evaluation for a (video, held-out identity, window size)
/// triple.
///
/// Metric values are stored exactly as parsed. They are expected to lie in
/// `[0, 1]` but the parser never clamps them; range problems are reported by
/// the validator instead.
///
/// # Examples
///
/// ```
/// use window_sweep_core::VideoResult;
///
/// let row = VideoResult::new(5, 1, "vidA.mp4", Some(0), [0.8, 0.81, 0.79, 0.82, 0.78, 0.815, 0.785]);
/// assert_eq!(row.accuracy, 0.8);
/// assert_eq!(row.f1_behavior, 0.785);
/// assert_eq!(row.case_key().to_string(), "vidA.mp4 [0]");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub window_size: u32,
    /// Video number as printed in the table; repeats across windows.
    pub video_id: i64,
    pub video_name: String,
    /// Held-out animal identity, when the row carries a `[n]` marker.
    pub identity: Option<u32>,
    pub accuracy: f64,
    pub precision_not_behavior: f64,
    pub precision_behavior: f64,
    pub recall_not_behavior: f64,
    pub recall_behavior: f64,
    pub f1_not_behavior: f64,
    pub f1_behavior: f64,
}

impl VideoResult {
    /// Builds a row from the seven metrics in table order: accuracy,
    /// precision (not behavior), precision (behavior), recall (not behavior),
    /// recall (behavior), F1 (not behavior), F1 (behavior).
    pub fn new(
        window_size: u32,
        video_id: i64,
        video_name: &str,
        identity: Option<u32>,
        metrics: [f64; 7],
    ) -> Self {
        let [
            accuracy,
            precision_not_behavior,
            precision_behavior,
            recall_not_behavior,
            recall_behavior,
            f1_not_behavior,
            f1_behavior,
        ] = metrics;
        Self {
            window_size,
            video_id,
            video_name: video_name.to_string(),
            identity,
            accuracy,
            precision_not_behavior,
            precision_behavior,
            recall_not_behavior,
            recall_behavior,
            f1_not_behavior,
            f1_behavior,
        }
    }

    /// Returns the value of one metric column.
    pub fn metric(&self, column: MetricColumn) -> f64 {
        match column {
            MetricColumn::Accuracy => self.accuracy,
            MetricColumn::PrecisionNotBehavior => self.precision_not_behavior,
            MetricColumn::PrecisionBehavior => self.precision_behavior,
            MetricColumn::RecallNotBehavior => self.recall_not_behavior,
            MetricColumn::RecallBehavior => self.recall_behavior,
            MetricColumn::F1NotBehavior => self.f1_not_behavior,
            MetricColumn::F1Behavior => self.f1_behavior,
        }
    }

    /// The cross-validation test case this row belongs to.
    pub fn case_key(&self) -> CaseKey {
        CaseKey {
            video_name: self.video_name.clone(),
            identity: self.identity,
        }
    }
}

/// The seven per-video metric columns, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricColumn {
    Accuracy,
    PrecisionNotBehavior,
    PrecisionBehavior,
    RecallNotBehavior,
    RecallBehavior,
    F1NotBehavior,
    F1Behavior,
}

impl MetricColumn {
    pub const ALL: [MetricColumn; 7] = [
        MetricColumn::Accuracy,
        MetricColumn::PrecisionNotBehavior,
        MetricColumn::PrecisionBehavior,
        MetricColumn::RecallNotBehavior,
        MetricColumn::RecallBehavior,
        MetricColumn::F1NotBehavior,
        MetricColumn::F1Behavior,
    ];

    /// Column name as used in exported tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::PrecisionNotBehavior => "precision_not_behavior",
            Self::PrecisionBehavior => "precision_behavior",
            Self::RecallNotBehavior => "recall_not_behavior",
            Self::RecallBehavior => "recall_behavior",
            Self::F1NotBehavior => "f1_not_behavior",
            Self::F1Behavior => "f1_behavior",
        }
    }
}

impl fmt::Display for MetricColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (video name, identity) pair: one held-out test case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseKey {
    pub video_name: String,
    pub identity: Option<u32>,
}

impl fmt::Display for CaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity {
            Some(identity) => write!(f, "{} [{identity}]", self.video_name),
            None => f.write_str(&self.video_name),
        }
    }
}

/// Aggregate statistics reported for one window size.
///
/// Each statistic is optional: a label missing from the text leaves the
/// field `None`. Values are never synthesized.
///
/// # Examples
///
/// ```
/// use window_sweep_core::{SummaryField, SummaryStats};
///
/// let mut stats = SummaryStats::new(10);
/// stats.mean_accuracy = Some(0.86);
/// assert_eq!(stats.get(SummaryField::MeanAccuracy), Some(0.86));
/// assert_eq!(stats.get(SummaryField::SdAccuracy), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub window_size: u32,
    pub mean_accuracy: Option<f64>,
    pub sd_accuracy: Option<f64>,
    pub mean_f1_behavior: Option<f64>,
    pub sd_f1_behavior: Option<f64>,
    pub mean_f1_not_behavior: Option<f64>,
    pub sd_f1_not_behavior: Option<f64>,
}

impl SummaryStats {
    /// Creates a record with every statistic absent.
    pub fn new(window_size: u32) -> Self {
        Self {
            window_size,
            ..Self::default()
        }
    }

    pub fn get(&self, field: SummaryField) -> Option<f64> {
        match field {
            SummaryField::MeanAccuracy => self.mean_accuracy,
            SummaryField::SdAccuracy => self.sd_accuracy,
            SummaryField::MeanF1Behavior => self.mean_f1_behavior,
            SummaryField::SdF1Behavior => self.sd_f1_behavior,
            SummaryField::MeanF1NotBehavior => self.mean_f1_not_behavior,
            SummaryField::SdF1NotBehavior => self.sd_f1_not_behavior,
        }
    }

    pub fn set(&mut self, field: SummaryField, value: f64) {
        let slot = match field {
            SummaryField::MeanAccuracy => &mut self.mean_accuracy,
            SummaryField::SdAccuracy => &mut self.sd_accuracy,
            SummaryField::MeanF1Behavior => &mut self.mean_f1_behavior,
            SummaryField::SdF1Behavior => &mut self.sd_f1_behavior,
            SummaryField::MeanF1NotBehavior => &mut self.mean_f1_not_behavior,
            SummaryField::SdF1NotBehavior => &mut self.sd_f1_not_behavior,
        };
        *slot = Some(value);
    }

    /// Returns `true` when every statistic is present.
    pub fn is_complete(&self) -> bool {
        SummaryField::ALL.iter().all(|field| self.get(*field).is_some())
    }
}

/// Which aggregate a summary statistic describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Mean,
    StdDev,
}

/// The six optional statistics of a [`SummaryStats`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryField {
    MeanAccuracy,
    SdAccuracy,
    MeanF1Behavior,
    SdF1Behavior,
    MeanF1NotBehavior,
    SdF1NotBehavior,
}

impl SummaryField {
    pub const ALL: [SummaryField; 6] = [
        SummaryField::MeanAccuracy,
        SummaryField::SdAccuracy,
        SummaryField::MeanF1Behavior,
        SummaryField::SdF1Behavior,
        SummaryField::MeanF1NotBehavior,
        SummaryField::SdF1NotBehavior,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeanAccuracy => "mean_accuracy",
            Self::SdAccuracy => "sd_accuracy",
            Self::MeanF1Behavior => "mean_f1_behavior",
            Self::SdF1Behavior => "sd_f1_behavior",
            Self::MeanF1NotBehavior => "mean_f1_not_behavior",
            Self::SdF1NotBehavior => "sd_f1_not_behavior",
        }
    }

    /// The per-video column this statistic aggregates.
    pub fn source_column(self) -> MetricColumn {
        match self {
            Self::MeanAccuracy | Self::SdAccuracy => MetricColumn::Accuracy,
            Self::MeanF1Behavior | Self::SdF1Behavior => MetricColumn::F1Behavior,
            Self::MeanF1NotBehavior | Self::SdF1NotBehavior => MetricColumn::F1NotBehavior,
        }
    }

    pub fn kind(self) -> StatKind {
        match self {
            Self::MeanAccuracy | Self::MeanF1Behavior | Self::MeanF1NotBehavior => StatKind::Mean,
            Self::SdAccuracy | Self::SdF1Behavior | Self::SdF1NotBehavior => StatKind::StdDev,
        }
    }
}

impl fmt::Display for SummaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked feature-importance entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub window_size: u32,
    /// 1 is the most important feature of the window's block.
    pub rank: u32,
    pub feature_name: String,
    pub importance: f64,
}

/// Run-level summary derived from what the parser actually found.
///
/// Only windows that contained a video table are counted; a window whose
/// table yielded no rows is still recorded, with a count of zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepMetadata {
    pub n_windows: usize,
    /// Row count of the first window encountered in the input.
    pub videos_per_window: usize,
    pub video_counts_per_window: BTreeMap<u32, usize>,
    pub window_sizes: Vec<u32>,
}

impl SweepMetadata {
    /// Builds metadata from per-window row counts in encounter order.
    ///
    /// A window listed twice keeps its latest count but its first position.
    ///
    /// # Examples
    ///
    /// ```
    /// use window_sweep_core::SweepMetadata;
    ///
    /// let meta = SweepMetadata::from_counts(&[(10, 4), (5, 3)]);
    /// assert_eq!(meta.n_windows, 2);
    /// assert_eq!(meta.window_sizes, vec![5, 10]);
    /// assert_eq!(meta.videos_per_window, 4);
    /// ```
    pub fn from_counts(counts: &[(u32, usize)]) -> Self {
        let mut video_counts_per_window = BTreeMap::new();
        for (window, count) in counts {
            video_counts_per_window.insert(*window, *count);
        }
        let videos_per_window = counts
            .first()
            .and_then(|(window, _)| video_counts_per_window.get(window))
            .copied()
            .unwrap_or(0);

        Self {
            n_windows: video_counts_per_window.len(),
            videos_per_window,
            window_sizes: video_counts_per_window.keys().copied().collect(),
            video_counts_per_window,
        }
    }
}

/// The three tables extracted from one sweep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepTables {
    pub videos: Vec<VideoResult>,
    pub summaries: Vec<SummaryStats>,
    pub features: Vec<FeatureImportance>,
}

impl SweepTables {
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty() && self.summaries.is_empty() && self.features.is_empty()
    }

    /// Distinct window sizes present in the video table, ascending.
    pub fn video_window_sizes(&self) -> Vec<u32> {
        let mut windows: Vec<u32> = self.videos.iter().map(|row| row.window_size).collect();
        windows.sort_unstable();
        windows.dedup();
        windows
    }

    /// Video rows grouped by window size.
    pub fn videos_by_window(&self) -> BTreeMap<u32, Vec<&VideoResult>> {
        let mut grouped: BTreeMap<u32, Vec<&VideoResult>> = BTreeMap::new();
        for row in &self.videos {
            grouped.entry(row.window_size).or_default().push(row);
        }
        grouped
    }

    /// Feature rows for one window, in rank order as parsed.
    pub fn features_for(&self, window_size: u32) -> Vec<&FeatureImportance> {
        self.features
            .iter()
            .filter(|feature| feature.window_size == window_size)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(window: u32, name: &str, identity: Option<u32>, accuracy: f64) -> VideoResult {
        VideoResult::new(window, 1, name, identity, [accuracy; 7])
    }

    #[test]
    fn test_metric_accessor_follows_table_order() {
        let result = VideoResult::new(5, 3, "a.mp4", None, [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
        let values: Vec<f64> = MetricColumn::ALL
            .iter()
            .map(|column| result.metric(*column))
            .collect();
        assert_eq!(values, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
    }

    #[test]
    fn test_case_key_display_without_identity() {
        let key = row(5, "clip one.mp4", None, 0.5).case_key();
        assert_eq!(key.to_string(), "clip one.mp4");
    }

    #[test]
    fn test_summary_field_roundtrip_through_set_and_get() {
        let mut stats = SummaryStats::new(15);
        for (idx, field) in SummaryField::ALL.iter().enumerate() {
            assert!(stats.get(*field).is_none());
            stats.set(*field, idx as f64);
        }
        assert!(stats.is_complete());
        assert_eq!(stats.sd_f1_not_behavior, Some(5.0));
    }

    #[test]
    fn test_metadata_keeps_latest_count_for_repeated_window() {
        let meta = SweepMetadata::from_counts(&[(5, 2), (10, 3), (5, 0)]);
        assert_eq!(meta.video_counts_per_window.get(&5), Some(&0));
        assert_eq!(meta.videos_per_window, 0);
        assert_eq!(meta.n_windows, 2);
    }

    #[test]
    fn test_metadata_empty() {
        let meta = SweepMetadata::from_counts(&[]);
        assert_eq!(meta, SweepMetadata::default());
    }

    #[test]
    fn test_videos_by_window_groups_rows() {
        let tables = SweepTables {
            videos: vec![
                row(10, "a", Some(0), 0.5),
                row(5, "a", Some(0), 0.6),
                row(10, "b", Some(1), 0.7),
            ],
            ..SweepTables::default()
        };
        let grouped = tables.videos_by_window();
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![5, 10]);
        assert_eq!(grouped[&10].len(), 2);
        assert_eq!(tables.video_window_sizes(), vec![5, 10]);
    }

    #[test]
    fn test_serde_uses_table_column_names() {
        let json = serde_json::to_value(row(5, "a.mp4", None, 0.9)).unwrap();
        assert_eq!(json["video_name"], "a.mp4");
        assert!(json["identity"].is_null());
        assert_eq!(json["f1_behavior"], 0.9);
    }
}
