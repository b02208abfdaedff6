//! Output formatting for validation reports, run reports and analyses.

use window_sweep_core::{BoxPlotStats, SweepAnalysis, ValidationReport};

use crate::report::ParseRunReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

impl OutputFormat {
    /// File extension used when the output is written to disk.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "md",
            Self::Table => "txt",
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
}

/// Formats a validation report in the requested output format.
pub fn format_validation(report: &ValidationReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        OutputFormat::Markdown => Ok(validation_to_markdown(report)),
        OutputFormat::Table => Ok(validation_to_table(report)),
    }
}

/// Formats a parse run report in the requested output format.
pub fn format_run_report(report: &ParseRunReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        OutputFormat::Markdown => Ok(run_report_to_markdown(report)),
        OutputFormat::Table => Ok(run_report_to_table(report)),
    }
}

/// Formats derived statistics in the requested output format.
pub fn format_analysis(analysis: &SweepAnalysis, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => to_json(analysis),
        OutputFormat::Yaml => to_yaml(analysis),
        OutputFormat::Markdown => Ok(analysis_to_markdown(analysis)),
        OutputFormat::Table => Ok(analysis_to_table(analysis)),
    }
}

fn pass_fail(passed: bool) -> &'static str {
    if passed { "PASS" } else { "FAIL" }
}

fn validation_checks(report: &ValidationReport) -> [(&'static str, bool); 6] {
    [
        ("Row counts", report.row_counts.passed),
        ("Video/identity sets", report.video_sets.passed),
        ("Numeric ranges", report.integrity.numeric_ranges_valid),
        ("No missing values", report.integrity.no_missing_values),
        ("Complete performance data", report.integrity.complete_performance_data),
        ("Summary aggregates", report.aggregates.passed),
    ]
}

fn validation_to_markdown(report: &ValidationReport) -> String {
    let mut out = String::new();

    out.push_str("# Validation Report\n\n");
    out.push_str(&format!(
        "**Overall:** {}\n\n",
        if report.passed { "passed" } else { "failed" }
    ));

    out.push_str("| Check | Result |\n");
    out.push_str("|-------|--------|\n");
    for (name, passed) in validation_checks(report) {
        out.push_str(&format!("| {name} | {} |\n", pass_fail(passed)));
    }
    out.push('\n');

    out.push_str(&format!(
        "- **Video rows:** {} (expected {})\n",
        report.row_counts.video_rows,
        expected(report.row_counts.expected_video_rows)
    ));
    out.push_str(&format!(
        "- **Summary rows:** {} (expected {})\n",
        report.row_counts.summary_rows,
        expected(report.row_counts.expected_summary_rows)
    ));
    out.push_str(&format!(
        "- **Feature rows:** {}\n",
        report.row_counts.feature_rows
    ));
    if let Some(reference) = report.video_sets.reference_window {
        out.push_str(&format!("- **Reference window:** {reference}\n"));
    }
    out.push_str(&format!(
        "- **Tolerance:** {}\n",
        report.aggregates.tolerance
    ));

    if !report.discrepancies.is_empty() {
        out.push_str("\n## Discrepancies\n\n");
        for discrepancy in &report.discrepancies {
            out.push_str(&format!("- {discrepancy}\n"));
        }
    }

    out
}

fn validation_to_table(report: &ValidationReport) -> String {
    let mut out = String::new();
    let width = validation_checks(report)
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(5);

    for (name, passed) in validation_checks(report) {
        out.push_str(&format!("{name:<width$}  {}\n", pass_fail(passed)));
    }
    out.push_str(&format!(
        "{:<width$}  {}\n",
        "Overall",
        pass_fail(report.passed)
    ));

    if !report.discrepancies.is_empty() {
        out.push_str("\nDiscrepancies:\n");
        for discrepancy in &report.discrepancies {
            out.push_str(&format!("  {discrepancy}\n"));
        }
    }

    out
}

fn expected(value: Option<usize>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn run_report_to_markdown(report: &ParseRunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Parse Report: {}\n\n", report.source));
    out.push_str(&format!("- **Generated:** {}\n", report.generated_at));
    out.push_str(&format!("- **SHA-256:** `{}`\n", report.source_sha256));
    out.push_str(&format!("- **Lines:** {}\n", report.line_count));
    out.push_str(&format!(
        "- **Windows:** {}\n",
        join_windows(&report.metadata.window_sizes)
    ));
    out.push_str(&format!(
        "- **Videos per window:** {}\n",
        report.metadata.videos_per_window
    ));
    out.push_str(&format!(
        "- **Rows:** {} video, {} summary, {} feature\n",
        report.rows.video_results, report.rows.summary_stats, report.rows.feature_importance
    ));

    if !report.metadata.video_counts_per_window.is_empty() {
        out.push_str("\n| Window | Videos |\n");
        out.push_str("|--------|--------|\n");
        for (window, count) in &report.metadata.video_counts_per_window {
            out.push_str(&format!("| {window} | {count} |\n"));
        }
    }

    if !report.warnings.is_empty() {
        out.push_str("\n## Warnings\n\n");
        for w in &report.warnings {
            out.push_str(&format!("- {w}\n"));
        }
    }

    out
}

fn run_report_to_table(report: &ParseRunReport) -> String {
    let mut out = format!(
        "{:<30} windows={:<3} videos={:<5} summaries={:<3} features={:<4}",
        report.source,
        report.metadata.n_windows,
        report.rows.video_results,
        report.rows.summary_stats,
        report.rows.feature_importance,
    );
    if !report.malformed_rows.is_empty() {
        out.push_str(&format!("  [{} malformed]", report.malformed_rows.len()));
    }
    out.push('\n');
    out
}

fn join_windows(windows: &[u32]) -> String {
    if windows.is_empty() {
        return "none".to_string();
    }
    windows
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn analysis_to_markdown(analysis: &SweepAnalysis) -> String {
    let mut out = String::new();

    out.push_str("# Sweep Analysis\n\n");
    out.push_str(&format!(
        "**Windows:** {}\n\n",
        join_windows(&analysis.window_sizes)
    ));

    if !analysis.best_windows.is_empty() {
        out.push_str("## Best Window per Metric\n\n");
        out.push_str("| Metric | Window | Value |\n");
        out.push_str("|--------|--------|-------|\n");
        for best in &analysis.best_windows {
            out.push_str(&format!(
                "| {} | {} | {:.4} |\n",
                best.field, best.window_size, best.value
            ));
        }
        out.push('\n');
    }

    if !analysis.worst_videos.is_empty() {
        out.push_str("## Worst Videos\n\n");
        out.push_str("| Video | Mean Accuracy | SD Accuracy |\n");
        out.push_str("|-------|---------------|-------------|\n");
        for video in &analysis.worst_videos {
            out.push_str(&format!(
                "| {} | {:.4} | {:.4} |\n",
                video.video_name, video.mean_accuracy, video.sd_accuracy
            ));
        }
        out.push('\n');
    }

    if !analysis.sensitive_videos.is_empty() {
        out.push_str("## Most Window-Sensitive Videos\n\n");
        out.push_str("| Video | CV F1 (Behavior) | Mean F1 (Behavior) |\n");
        out.push_str("|-------|------------------|--------------------|\n");
        for video in &analysis.sensitive_videos {
            out.push_str(&format!(
                "| {} | {:.4} | {:.4} |\n",
                video.video_name,
                video.cv_f1_behavior.unwrap_or(0.0),
                video.mean_f1_behavior
            ));
        }
        out.push('\n');
    }

    if !analysis.accuracy_distribution.is_empty() {
        out.push_str("## Accuracy Distribution\n\n");
        out.push_str("| Window | Min | Q1 | Median | Q3 | Max | Outliers |\n");
        out.push_str("|--------|-----|----|--------|----|-----|----------|\n");
        for (window, stats) in &analysis.accuracy_distribution {
            out.push_str(&format!("| {window} | {} |\n", box_plot_cells(stats, " | ")));
        }
    }

    out
}

fn analysis_to_table(analysis: &SweepAnalysis) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Windows: {}\n",
        join_windows(&analysis.window_sizes)
    ));

    if !analysis.best_windows.is_empty() {
        out.push_str("\nBest windows:\n");
        for best in &analysis.best_windows {
            out.push_str(&format!(
                "  {:<22} window {:<4} {:.4}\n",
                best.field.as_str(),
                best.window_size,
                best.value
            ));
        }
    }

    if !analysis.worst_videos.is_empty() {
        out.push_str("\nWorst videos:\n");
        let width = analysis
            .worst_videos
            .iter()
            .map(|v| v.video_name.len())
            .max()
            .unwrap_or(5);
        for video in &analysis.worst_videos {
            out.push_str(&format!(
                "  {:<width$}  acc={:.4} sd={:.4}\n",
                video.video_name, video.mean_accuracy, video.sd_accuracy
            ));
        }
    }

    if !analysis.sensitive_videos.is_empty() {
        out.push_str("\nWindow-sensitive videos:\n");
        let width = analysis
            .sensitive_videos
            .iter()
            .map(|v| v.video_name.len())
            .max()
            .unwrap_or(5);
        for video in &analysis.sensitive_videos {
            out.push_str(&format!(
                "  {:<width$}  cv={:.4}\n",
                video.video_name,
                video.cv_f1_behavior.unwrap_or(0.0)
            ));
        }
    }

    if !analysis.accuracy_distribution.is_empty() {
        out.push_str("\nAccuracy by window (min q1 median q3 max outliers):\n");
        for (window, stats) in &analysis.accuracy_distribution {
            out.push_str(&format!("  {window:<4} {}\n", box_plot_cells(stats, " ")));
        }
    }

    out
}

fn box_plot_cells(stats: &BoxPlotStats, separator: &str) -> String {
    [
        format!("{:.4}", stats.min),
        format!("{:.4}", stats.q1),
        format!("{:.4}", stats.median),
        format!("{:.4}", stats.q3),
        format!("{:.4}", stats.max),
        stats.outliers.len().to_string(),
    ]
    .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use window_sweep_core::{
        SummaryStats, SweepTables, ValidationOptions, VideoResult, validate_sweep,
    };

    fn failing_report() -> ValidationReport {
        let tables = SweepTables {
            videos: vec![
                VideoResult::new(5, 1, "vidA.mp4", Some(0), [1.2; 7]),
                VideoResult::new(10, 1, "vidB.mp4", Some(0), [0.8; 7]),
            ],
            summaries: vec![SummaryStats::new(5), SummaryStats::new(10)],
            features: Vec::new(),
        };
        validate_sweep(&tables, &ValidationOptions::default())
    }

    fn sample_analysis() -> SweepAnalysis {
        let mut summary = SummaryStats::new(5);
        summary.mean_accuracy = Some(0.85);
        let tables = SweepTables {
            videos: vec![
                VideoResult::new(5, 1, "vidA.mp4", Some(0), [0.8; 7]),
                VideoResult::new(10, 1, "vidA.mp4", Some(0), [0.9; 7]),
            ],
            summaries: vec![summary],
            features: Vec::new(),
        };
        SweepAnalysis::from_tables(&tables, 10)
    }

    #[test]
    fn test_format_validation_json() {
        let json = format_validation(&failing_report(), OutputFormat::Json).unwrap();
        assert!(json.contains("\"passed\": false"));
        assert!(json.contains("\"kind\": \"out_of_range\""));
    }

    #[test]
    fn test_format_validation_yaml() {
        let yaml = format_validation(&failing_report(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("passed: false"));
        assert!(yaml.contains("discrepancies:"));
    }

    #[test]
    fn test_format_validation_markdown() {
        let md = format_validation(&failing_report(), OutputFormat::Markdown).unwrap();
        assert!(md.contains("# Validation Report"));
        assert!(md.contains("**Overall:** failed"));
        assert!(md.contains("| Numeric ranges | FAIL |"));
        assert!(md.contains("| Row counts | FAIL |"));
        assert!(md.contains("## Discrepancies"));
        assert!(md.contains("Column 'accuracy' has values outside [0,1]"));
        assert!(md.contains("**Reference window:** 5"));
    }

    #[test]
    fn test_format_validation_table() {
        let table = format_validation(&failing_report(), OutputFormat::Table).unwrap();
        assert!(table.contains("Video/identity sets"));
        assert!(table.contains("FAIL"));
        assert!(table.contains("Window 10: missing (video, identity) pairs: vidA.mp4 [0]"));
    }

    #[test]
    fn test_format_run_report_markdown_and_table() {
        let text = "Window 5\nVideo Accuracy Precision Recall\ncols\n1 0.8 0.8 0.8 0.8\n";
        let parse = crate::parse_sweep_text(text);
        let report = ParseRunReport::new("sweep.txt", text, &parse);

        let md = format_run_report(&report, OutputFormat::Markdown).unwrap();
        assert!(md.contains("# Parse Report: sweep.txt"));
        assert!(md.contains("| 5 | 0 |"));
        assert!(md.contains("malformed video rows"));

        let table = format_run_report(&report, OutputFormat::Table).unwrap();
        assert!(table.starts_with("sweep.txt"));
        assert!(table.contains("[1 malformed]"));
    }

    #[test]
    fn test_format_analysis_markdown() {
        let md = format_analysis(&sample_analysis(), OutputFormat::Markdown).unwrap();
        assert!(md.contains("**Windows:** 5, 10"));
        assert!(md.contains("| mean_accuracy | 5 | 0.8500 |"));
        assert!(md.contains("| vidA.mp4 | 0.8500 | 0.0500 |"));
        assert!(md.contains("## Accuracy Distribution"));
    }

    #[test]
    fn test_format_analysis_table_and_json() {
        let table = format_analysis(&sample_analysis(), OutputFormat::Table).unwrap();
        assert!(table.contains("Windows: 5, 10"));
        assert!(table.contains("Worst videos:"));

        let json = format_analysis(&sample_analysis(), OutputFormat::Json).unwrap();
        assert!(json.contains("\"worst_videos\""));
    }

    #[test]
    fn test_extension() {
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Table.extension(), "txt");
    }
}
