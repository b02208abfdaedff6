//! CSV export and import of the three sweep tables.
//!
//! Column names are the record field names. Absent values are written as
//! empty cells; on import, an empty metric cell becomes NaN so that the
//! validator reports it as a missing value instead of rejecting the file.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use window_sweep_core::{FeatureImportance, SummaryStats, SweepTables, VideoResult};

use crate::error::{Result, SweepError};

pub const VIDEO_RESULTS_FILE: &str = "video_results.csv";
pub const SUMMARY_STATS_FILE: &str = "summary_stats.csv";
pub const FEATURE_IMPORTANCE_FILE: &str = "feature_importance.csv";

const VIDEO_COLUMNS: [&str; 11] = [
    "window_size",
    "video_id",
    "video_name",
    "identity",
    "accuracy",
    "precision_not_behavior",
    "precision_behavior",
    "recall_not_behavior",
    "recall_behavior",
    "f1_not_behavior",
    "f1_behavior",
];

const SUMMARY_COLUMNS: [&str; 7] = [
    "window_size",
    "mean_accuracy",
    "sd_accuracy",
    "mean_f1_behavior",
    "sd_f1_behavior",
    "mean_f1_not_behavior",
    "sd_f1_not_behavior",
];

const FEATURE_COLUMNS: [&str; 4] = ["window_size", "rank", "feature_name", "importance"];

/// Paths of the files written by [`write_tables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePaths {
    pub video_results: PathBuf,
    pub summary_stats: PathBuf,
    pub feature_importance: PathBuf,
}

impl TablePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            video_results: dir.join(VIDEO_RESULTS_FILE),
            summary_stats: dir.join(SUMMARY_STATS_FILE),
            feature_importance: dir.join(FEATURE_IMPORTANCE_FILE),
        }
    }
}

/// Writes the three tables as CSV files into `dir`, creating it if needed.
///
/// Empty tables still get a header row.
pub fn write_tables(dir: &Path, tables: &SweepTables) -> Result<TablePaths> {
    std::fs::create_dir_all(dir).map_err(|err| SweepError::io(dir, err))?;
    let paths = TablePaths::in_dir(dir);

    write_csv(&paths.video_results, &VIDEO_COLUMNS, &tables.videos)?;
    write_csv(&paths.summary_stats, &SUMMARY_COLUMNS, &tables.summaries)?;
    write_csv(&paths.feature_importance, &FEATURE_COLUMNS, &tables.features)?;

    for (name, rows) in [
        (VIDEO_RESULTS_FILE, tables.videos.len()),
        (SUMMARY_STATS_FILE, tables.summaries.len()),
        (FEATURE_IMPORTANCE_FILE, tables.features.len()),
    ] {
        if rows == 0 {
            warn!(file = name, "Wrote empty table");
        } else {
            debug!(file = name, rows, "Wrote table");
        }
    }

    Ok(paths)
}

fn write_csv<T: Serialize>(path: &Path, columns: &[&str], records: &[T]) -> Result<()> {
    let file = File::create(path).map_err(|err| SweepError::io(path, err))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(columns)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|err| SweepError::io(path, err))?;
    Ok(())
}

/// Row shape accepted on import: tolerant of empty metric cells and of
/// identities written as floats (`"0.0"`).
#[derive(Debug, Deserialize)]
struct VideoRecord {
    window_size: u32,
    video_id: i64,
    video_name: String,
    identity: Option<f64>,
    accuracy: Option<f64>,
    precision_not_behavior: Option<f64>,
    precision_behavior: Option<f64>,
    recall_not_behavior: Option<f64>,
    recall_behavior: Option<f64>,
    f1_not_behavior: Option<f64>,
    f1_behavior: Option<f64>,
}

impl From<VideoRecord> for VideoResult {
    fn from(record: VideoRecord) -> Self {
        let metric = |value: Option<f64>| value.unwrap_or(f64::NAN);
        let identity = record
            .identity
            .filter(|id| id.is_finite() && *id >= 0.0 && id.fract() == 0.0 && *id <= u32::MAX as f64)
            .map(|id| id as u32);

        VideoResult::new(
            record.window_size,
            record.video_id,
            &record.video_name,
            identity,
            [
                metric(record.accuracy),
                metric(record.precision_not_behavior),
                metric(record.precision_behavior),
                metric(record.recall_not_behavior),
                metric(record.recall_behavior),
                metric(record.f1_not_behavior),
                metric(record.f1_behavior),
            ],
        )
    }
}

/// Reads tables previously written by [`write_tables`] (or by any tool
/// using the same column names).
///
/// `video_results.csv` is required; a missing summary or feature file is
/// read as an empty table.
pub fn read_tables(dir: &Path) -> Result<SweepTables> {
    let paths = TablePaths::in_dir(dir);

    let videos = read_csv::<VideoRecord>(&paths.video_results)?
        .into_iter()
        .map(VideoResult::from)
        .collect();
    let summaries = read_optional_csv::<SummaryStats>(&paths.summary_stats)?;
    let features = read_optional_csv::<FeatureImportance>(&paths.feature_importance)?;

    Ok(SweepTables {
        videos,
        summaries,
        features,
    })
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|err| SweepError::io(path, err))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    debug!(path = %path.display(), rows = records.len(), "Read table");
    Ok(records)
}

fn read_optional_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        warn!(path = %path.display(), "Table file missing, treating as empty");
        return Ok(Vec::new());
    }
    read_csv(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tables() -> SweepTables {
        let mut stats = SummaryStats::new(5);
        stats.mean_accuracy = Some(0.85);
        SweepTables {
            videos: vec![
                VideoResult::new(5, 1, "clip one.mp4", Some(0), [0.8; 7]),
                VideoResult::new(5, 2, "clip, two.mp4", None, [0.9; 7]),
            ],
            summaries: vec![stats],
            features: vec![FeatureImportance {
                window_size: 5,
                rank: 1,
                feature_name: "angular velocity".to_string(),
                importance: 0.25,
            }],
        }
    }

    #[test]
    fn test_write_then_read_preserves_tables() {
        let dir = tempfile::tempdir().unwrap();
        let tables = sample_tables();

        let paths = write_tables(dir.path(), &tables).unwrap();
        assert!(paths.video_results.ends_with(VIDEO_RESULTS_FILE));

        let loaded = read_tables(dir.path()).unwrap();
        assert_eq!(loaded, tables);
    }

    #[test]
    fn test_absent_values_are_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), &sample_tables()).unwrap();

        let summary = std::fs::read_to_string(dir.path().join(SUMMARY_STATS_FILE)).unwrap();
        let mut lines = summary.lines();
        assert_eq!(lines.next(), Some(SUMMARY_COLUMNS.join(",").as_str()));
        assert_eq!(lines.next(), Some("5,0.85,,,,,"));

        let videos = std::fs::read_to_string(dir.path().join(VIDEO_RESULTS_FILE)).unwrap();
        assert!(videos.contains("\"clip, two.mp4\",,"));
    }

    #[test]
    fn test_empty_tables_keep_headers() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), &SweepTables::default()).unwrap();

        let features = std::fs::read_to_string(dir.path().join(FEATURE_IMPORTANCE_FILE)).unwrap();
        assert_eq!(features.trim_end(), "window_size,rank,feature_name,importance");
        assert_eq!(read_tables(dir.path()).unwrap(), SweepTables::default());
    }

    #[test]
    fn test_read_tolerates_float_identity_and_empty_metric() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(VIDEO_RESULTS_FILE),
            format!("{}\n5,1,a.mp4,2.0,0.5,,0.5,0.5,0.5,0.5,0.5\n", VIDEO_COLUMNS.join(",")),
        )
        .unwrap();

        let tables = read_tables(dir.path()).unwrap();
        assert_eq!(tables.videos.len(), 1);
        assert_eq!(tables.videos[0].identity, Some(2));
        assert!(tables.videos[0].precision_not_behavior.is_nan());
        assert!(tables.summaries.is_empty());
        assert!(tables.features.is_empty());
    }

    #[test]
    fn test_read_missing_video_table_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_tables(dir.path()).unwrap_err();
        assert!(matches!(err, SweepError::Io { .. }));
        assert!(err.to_string().contains(VIDEO_RESULTS_FILE));
    }
}
