use chrono::{NaiveDateTime, TimeDelta};

pub struct TimeUtils;

impl TimeUtils {
    pub const SECS_IN_MIN: i64 = 60;
    pub const SECS_IN_H: i64 = Self::SECS_IN_MIN * 60;
    pub const SECS_IN_D: i64 = Self::SECS_IN_H * 24;
    pub const STANDARD_TIME_FORMAT: &'static str = "%Y-%m-%d %H:%M";
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d";
}

/// TimeDelta as fractional hours (millisecond precision).
pub fn fractional_hours(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / (TimeUtils::SECS_IN_H * 1000) as f64
}

/// TimeDelta as fractional days (millisecond precision).
pub fn fractional_days(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / (TimeUtils::SECS_IN_D * 1000) as f64
}

/// Converts a validated std Duration. Out-of-range values saturate at TimeDelta::MAX.
pub fn to_time_delta(d: std::time::Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TimeUtils::STANDARD_TIME_FORMAT).to_string()
}

pub fn format_duration(delta: TimeDelta) -> String {
    let secs = delta.num_seconds();
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        let rem_mins = mins % 60;
        return format!("{}h {}m", hours, rem_mins);
    }
    let days = hours / 24;
    let rem_hours = hours % 24;
    format!("{}d {}h", days, rem_hours)
}
