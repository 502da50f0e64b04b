use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Midnight UTC on the first day of the month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    // Day 1 at 00:00 exists in every month, so `single()` always succeeds.
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
