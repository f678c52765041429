//! Human-readable publication times for aggregated items

use chrono::{DateTime, Utc};

/// How long before `now` something was published, e.g. "3 hours ago".
///
/// Units are whole minutes under an hour, hours under a day, days under
/// 365 days, then years. Times at or after `now` read "now".
pub fn time_since(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - published;
    if elapsed <= chrono::Duration::zero() {
        return "now".to_string();
    }

    let (count, unit) = if elapsed < chrono::Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < chrono::Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else if elapsed < chrono::Duration::days(365) {
        (elapsed.num_days(), "day")
    } else {
        (elapsed.num_days() / 365, "year")
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Publication time as `YYYY-MM-DD HH:MM` (UTC)
pub fn format_published(published: DateTime<Utc>) -> String {
    published.format("%Y-%m-%d %H:%M").to_string()
}
