/// Utility functions
use chrono::{DateTime, Days, Utc};
use std::time::Duration;

/// First day of a lookback window, formatted for the `starttime` query parameter
pub fn start_date(now: DateTime<Utc>, lookback_days: u32) -> String {
    let today = now.date_naive();
    today
        .checked_sub_days(Days::new(u64::from(lookback_days)))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

/// Render an epoch-milliseconds timestamp as a UTC wall-clock string
pub fn timestamp_to_str(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Human-readable uptime, e.g. `3h 12m 5s`
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
