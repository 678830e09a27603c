use time::{Duration, UtcDateTime};

/// Renders how long ago `then` was, relative to `now`.
///
/// Anything older than a week, or in the future, falls back to the calendar date.
#[must_use]
pub fn time_ago(then: UtcDateTime, now: UtcDateTime) -> String {
    let elapsed = now - then;

    if elapsed.is_negative() || elapsed >= Duration::weeks(1) {
        let date = then.date();
        return format!("{} {} {}", date.day(), date.month(), date.year());
    }

    if elapsed < Duration::minutes(1) {
        "just now".to_owned()
    } else if elapsed < Duration::hours(1) {
        plural(elapsed.whole_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        plural(elapsed.whole_hours(), "hour")
    } else {
        plural(elapsed.whole_days(), "day")
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
