//! Time-bucket keys for the series aggregations.
//!
//! Bucket keys are plain strings whose lexicographic order is chronological:
//! `YYYY-MM-DD` for days, the date of the preceding-or-same Sunday for weeks,
//! `YYYY-MM` for months.

use chrono::{Datelike, Duration, TimeZone, Utc};

/// Time-bucketing resolution for series aggregations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Parse the `granularity` query parameter; `None` for anything unknown
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "day" => Some(Granularity::Day),
            "week" => Some(Granularity::Week),
            "month" => Some(Granularity::Month),
            _ => None,
        }
    }
}

/// Bucket key for a start timestamp (epoch millis).
///
/// Weeks are Sunday-based: the key is the calendar date of the preceding or
/// same Sunday, so a Sunday maps to itself.
pub fn bucket_key(start_time_ms: i64, granularity: Granularity) -> String {
    let Some(dt) = Utc.timestamp_millis_opt(start_time_ms).single() else {
        return format!("t:{start_time_ms}");
    };
    match granularity {
        Granularity::Day => dt.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let date = dt.date_naive();
            let sunday = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
            sunday.format("%Y-%m-%d").to_string()
        }
        Granularity::Month => dt.format("%Y-%m").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-06-15 00:00:00 UTC (a Sunday)
    const SUNDAY_MS: i64 = 1_749_945_600_000;
    const HOUR_MS: i64 = 3_600_000;
    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn day_key_ignores_time_of_day() {
        let midnight = bucket_key(SUNDAY_MS, Granularity::Day);
        let evening = bucket_key(SUNDAY_MS + 20 * HOUR_MS, Granularity::Day);
        assert_eq!(midnight, "2025-06-15");
        assert_eq!(midnight, evening);
    }

    #[test]
    fn week_key_for_sunday_is_that_date() {
        assert_eq!(bucket_key(SUNDAY_MS, Granularity::Week), "2025-06-15");
    }

    #[test]
    fn week_key_rolls_back_to_preceding_sunday() {
        // Wednesday 2025-06-18
        let wednesday = SUNDAY_MS + 3 * DAY_MS;
        assert_eq!(bucket_key(wednesday, Granularity::Week), "2025-06-15");
        // Saturday 2025-06-21 still belongs to the same week
        let saturday = SUNDAY_MS + 6 * DAY_MS;
        assert_eq!(bucket_key(saturday, Granularity::Week), "2025-06-15");
        // The next Sunday starts a new week
        let next_sunday = SUNDAY_MS + 7 * DAY_MS;
        assert_eq!(bucket_key(next_sunday, Granularity::Week), "2025-06-22");
    }

    #[test]
    fn month_key_format() {
        assert_eq!(bucket_key(SUNDAY_MS, Granularity::Month), "2025-06");
    }

    #[test]
    fn granularity_parsing() {
        assert_eq!(Granularity::parse("week"), Some(Granularity::Week));
        assert_eq!(Granularity::parse("hour"), None);
    }
}
