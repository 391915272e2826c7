// Series math: named bucket widths, neighbor interpolation, count
// statistics, growth ratios. DB access stays in stats_repo::mod.

use crate::models::StatPoint;

pub const MS_PER_MINUTE: i64 = 60 * 1000;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
pub const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// Bucket widths the stats API accepts by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    ThirtyMinutes,
    Hour,
    TwoHours,
    SixHours,
    Day,
    Week,
}

impl Interval {
    /// Parse a query-string name. Anything unrecognized falls back to
    /// one hour rather than failing the request.
    pub fn parse(name: &str) -> Self {
        match name {
            "30m" | "30min" => Self::ThirtyMinutes,
            "1h" | "hour" => Self::Hour,
            "2h" => Self::TwoHours,
            "6h" => Self::SixHours,
            "1d" | "day" => Self::Day,
            "1w" | "week" => Self::Week,
            _ => Self::Hour,
        }
    }

    pub fn as_millis(self) -> i64 {
        match self {
            Self::ThirtyMinutes => 30 * MS_PER_MINUTE,
            Self::Hour => MS_PER_HOUR,
            Self::TwoHours => 2 * MS_PER_HOUR,
            Self::SixHours => 6 * MS_PER_HOUR,
            Self::Day => MS_PER_DAY,
            Self::Week => MS_PER_WEEK,
        }
    }
}

/// Stand-in for a timestamp with no exact sample: average the two
/// nearest neighbors, or take the single neighbor when the timestamp
/// falls before the first or after the last sample. No samples at all
/// means no answer.
pub fn interpolate_between(
    at: i64,
    before: Option<StatPoint>,
    after: Option<StatPoint>,
) -> Option<StatPoint> {
    match (before, after) {
        (Some(b), Some(a)) => Some(StatPoint {
            timestamp: at,
            player_count: mean_counts(b.player_count, a.player_count),
        }),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

// A NULL neighbor does not drag the average down; two NULLs stay NULL.
fn mean_counts(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(round_count((a + b) as f64 / 2.0)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

pub fn round_count(value: f64) -> i64 {
    value.round() as i64
}

/// Mean of player counts, `None` when there are none to average.
pub fn mean(counts: &[i64]) -> Option<f64> {
    if counts.is_empty() {
        return None;
    }
    Some(counts.iter().sum::<i64>() as f64 / counts.len() as f64)
}

/// Median over an ascending-sorted slice; even lengths average the two
/// middle values.
pub fn median(sorted: &[i64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid] as f64)
    } else {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    }
}

/// Relative growth of `current` against `baseline`. `None` when the
/// baseline is missing or zero.
pub fn growth_ratio(current: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    match (current, baseline) {
        (Some(current), Some(baseline)) if baseline != 0.0 => {
            Some((current - baseline) / baseline)
        }
        _ => None,
    }
}
