//! Descriptive statistics over video-result columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{MetricColumn, StatKind, SummaryField, VideoResult};

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divisor `n`); `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use window_sweep_core::stats::population_sd;
///
/// let sd = population_sd(&[0.8, 0.9]).unwrap();
/// assert!((sd - 0.05).abs() < 1e-12);
/// assert_eq!(population_sd(&[0.7]), Some(0.0));
/// ```
pub fn population_sd(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Mean and population standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub mean: f64,
    pub sd: f64,
}

impl ColumnSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            sd: population_sd(values)?,
        })
    }
}

/// Aggregates recomputed from the video rows of one window size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregate {
    pub window_size: u32,
    pub n_rows: usize,
    pub accuracy: ColumnSummary,
    pub f1_behavior: ColumnSummary,
    pub f1_not_behavior: ColumnSummary,
}

impl WindowAggregate {
    /// Returns `None` when `rows` is empty.
    pub fn from_rows(window_size: u32, rows: &[&VideoResult]) -> Option<Self> {
        let column = |col: MetricColumn| -> Vec<f64> { rows.iter().map(|r| r.metric(col)).collect() };
        Some(Self {
            window_size,
            n_rows: rows.len(),
            accuracy: ColumnSummary::from_values(&column(MetricColumn::Accuracy))?,
            f1_behavior: ColumnSummary::from_values(&column(MetricColumn::F1Behavior))?,
            f1_not_behavior: ColumnSummary::from_values(&column(MetricColumn::F1NotBehavior))?,
        })
    }

    /// The recomputed counterpart of a reported summary statistic.
    pub fn computed(&self, field: SummaryField) -> f64 {
        let summary = match field.source_column() {
            MetricColumn::F1Behavior => self.f1_behavior,
            MetricColumn::F1NotBehavior => self.f1_not_behavior,
            _ => self.accuracy,
        };
        match field.kind() {
            StatKind::Mean => summary.mean,
            StatKind::StdDev => summary.sd,
        }
    }
}

/// Recomputes aggregates for every window size present in `videos`.
pub fn aggregate_by_window(videos: &[VideoResult]) -> BTreeMap<u32, WindowAggregate> {
    let mut grouped: BTreeMap<u32, Vec<&VideoResult>> = BTreeMap::new();
    for row in videos {
        grouped.entry(row.window_size).or_default().push(row);
    }

    grouped
        .into_iter()
        .filter_map(|(window, rows)| {
            WindowAggregate::from_rows(window, &rows).map(|aggregate| (window, aggregate))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(window: u32, accuracy: f64, f1_b: f64, f1_nb: f64) -> VideoResult {
        VideoResult::new(window, 1, "v.mp4", Some(0), [accuracy, 0.5, 0.5, 0.5, 0.5, f1_nb, f1_b])
    }

    #[test]
    fn test_mean_and_sd_of_empty_slice() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_sd(&[]), None);
    }

    #[test]
    fn test_population_sd_uses_n_divisor() {
        // Sample SD of these values would be 0.05; population SD is sqrt(2/3)*0.05.
        let sd = population_sd(&[0.80, 0.85, 0.90]).unwrap();
        assert!((sd - 0.040_824_829_046_386).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_by_window_groups_and_computes() {
        let videos = vec![
            row(5, 0.8, 0.7, 0.9),
            row(5, 0.9, 0.8, 0.8),
            row(10, 0.6, 0.5, 0.7),
        ];
        let aggregates = aggregate_by_window(&videos);
        assert_eq!(aggregates.len(), 2);

        let five = &aggregates[&5];
        assert_eq!(five.n_rows, 2);
        assert!((five.computed(SummaryField::MeanAccuracy) - 0.85).abs() < 1e-12);
        assert!((five.computed(SummaryField::SdAccuracy) - 0.05).abs() < 1e-12);
        assert!((five.computed(SummaryField::MeanF1Behavior) - 0.75).abs() < 1e-12);
        assert!((five.computed(SummaryField::MeanF1NotBehavior) - 0.85).abs() < 1e-12);

        let ten = &aggregates[&10];
        assert_eq!(ten.computed(SummaryField::SdF1NotBehavior), 0.0);
    }
}
