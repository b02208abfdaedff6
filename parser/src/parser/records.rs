//! Record parsers: one matched line (or a bounded group of lines) in, one
//! structured record out.

use tracing::debug;
use window_sweep_core::{FeatureImportance, SummaryStats, VideoResult};

use super::patterns::{identity_marker, is_dash_rule, summary_label};

/// Number of metric columns in a video row.
const METRIC_COUNT: usize = 7;

/// Parses one video-table row.
///
/// The row is `<id> <7 metrics> <name...> [<identity>]`. Metrics are taken
/// greedily: tokens are parsed as floats until seven have been collected or
/// one fails, so a name starting with a number still ends the metrics.
/// Returns `None` for fewer than 9 tokens, a non-integer id, or fewer than
/// seven metrics.
///
/// # Examples
///
/// ```
/// use window_sweep_parser::parser::records::parse_video_row;
///
/// let row = parse_video_row("3 0.9 0.8 0.7 0.6 0.5 0.4 0.3 my clip.mp4 [2]", 10).unwrap();
/// assert_eq!(row.video_id, 3);
/// assert_eq!(row.video_name, "my clip.mp4");
/// assert_eq!(row.identity, Some(2));
/// assert_eq!(row.f1_behavior, 0.3);
///
/// assert!(parse_video_row("3 0.9 0.8 0.7 0.6 0.5 0.4 0.3", 10).is_none());
/// ```
pub fn parse_video_row(line: &str, window_size: u32) -> Option<VideoResult> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < METRIC_COUNT + 2 {
        return None;
    }

    let video_id: i64 = parts[0].parse().ok()?;

    let mut metrics = [0.0; METRIC_COUNT];
    let mut collected = 0;
    let mut next = 1;
    while next < parts.len() && collected < METRIC_COUNT {
        let Ok(value) = parts[next].parse::<f64>() else {
            break;
        };
        metrics[collected] = value;
        collected += 1;
        next += 1;
    }
    if collected < METRIC_COUNT {
        return None;
    }

    let remainder = parts[next..].join(" ");
    let identity = identity_marker(&remainder);
    let video_name = match remainder.split_once(" [") {
        Some((name, _)) => name.trim(),
        None => remainder.trim(),
    };

    Some(VideoResult::new(
        window_size,
        video_id,
        video_name,
        identity,
        metrics,
    ))
}

/// Parses a bounded block of summary lines.
///
/// Each line contributes at most one statistic. Labels that never appear,
/// or whose value is not a valid number, leave the field absent.
pub fn parse_summary_stats<S: AsRef<str>>(lines: &[S], window_size: u32) -> SummaryStats {
    let mut stats = SummaryStats::new(window_size);
    for line in lines {
        let Some((field, token)) = summary_label(line.as_ref().trim()) else {
            continue;
        };
        match token.parse::<f64>() {
            Ok(value) => stats.set(field, value),
            Err(_) => debug!(window_size, %field, token, "Ignoring unparsable summary value"),
        }
    }
    stats
}

/// Parses the body of a feature-importance table.
///
/// Header and rule lines are skipped, a `%` line or a long dashed line
/// ends the table, and a data line is `<name...> <importance>`. Ranks count
/// successfully parsed rows only.
pub fn parse_feature_importance<S: AsRef<str>>(
    lines: &[S],
    window_size: u32,
) -> Vec<FeatureImportance> {
    let mut features = Vec::new();

    for raw in lines {
        let line = raw.as_ref().trim();

        if line.contains("Feature Name") || line.contains("Importance") || line.contains("---") {
            continue;
        }
        if line.starts_with('%') || is_dash_rule(line) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((last, name)) = parts.split_last() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let Ok(importance) = last.parse::<f64>() else {
            continue;
        };

        features.push(FeatureImportance {
            window_size,
            rank: features.len() as u32 + 1,
            feature_name: name.join(" "),
            importance,
        });
    }

    features
}
