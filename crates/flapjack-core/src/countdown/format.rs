//! Text formatting for countdown values.

use chrono::{DateTime, Datelike, TimeZone, Utc};

const MINUTES_IN_DAY: i64 = 1440;

/// Zero-padded `HH:MM:SS`. Negative input renders as zero.
pub fn format_countdown(total_secs: i64) -> String {
    let secs = total_secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn plural(count: u64, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// "2 hours, 30 minutes", "1 hour", "45 minutes".
///
/// Each clause is dropped when its count is zero, except that a zero total
/// still reads "0 minutes".
pub fn format_reduction_minutes(total_minutes: u64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours, minutes) {
        (0, m) => plural(m, "minute", "minutes"),
        (h, 0) => plural(h, "hour", "hours"),
        (h, m) => format!(
            "{}, {}",
            plural(h, "hour", "hours"),
            plural(m, "minute", "minutes")
        ),
    }
}

/// Fuzzy distance between two instants without direction,
/// e.g. "about 3 hours", "12 minutes", "less than a minute".
pub fn format_distance(target: DateTime<Utc>, base: DateTime<Utc>) -> String {
    let seconds = (target - base).num_seconds().abs();
    let minutes = (seconds as f64 / 60.0).round() as i64;

    if minutes < 1 {
        "less than a minute".to_string()
    } else if minutes < 2 {
        "1 minute".to_string()
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < MINUTES_IN_DAY {
        let hours = (minutes as f64 / 60.0).round() as i64;
        format!("about {hours} hours")
    } else if minutes < 2520 {
        "1 day".to_string()
    } else {
        let days = (minutes as f64 / MINUTES_IN_DAY as f64).round() as i64;
        format!("{days} days")
    }
}

/// [`format_distance`] with a direction: "in about 3 hours" or "5 minutes ago".
pub fn format_relative(target: DateTime<Utc>, base: DateTime<Utc>) -> String {
    let distance = format_distance(target, base);
    if target >= base {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Wall clock line, e.g. "8:05:03 AM, March 1st 2025".
pub fn format_clock<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let day = at.day();
    format!(
        "{}, {} {}{} {}",
        at.format("%-I:%M:%S %p"),
        at.format("%B"),
        day,
        ordinal_suffix(day),
        at.format("%Y")
    )
}
