//! Next-occurrence computation for daily wall-clock triggers.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};

use rooster_core::config::FireTimeConfig;

/// Compute the next occurrence of (hour, minute) in the given fixed offset
/// at or after `now`, as a UTC instant.
///
/// A scheduler armed one second past today's target time lands on tomorrow:
/// the candidate has seconds zeroed, so 10:00:01 never matches today's
/// 10:00:00.
pub fn next_occurrence(
    fire: FireTimeConfig,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> DateTime<Utc> {
    let local_now = now.with_timezone(&offset);
    let target =
        NaiveTime::from_hms_opt(fire.hour, fire.minute, 0).unwrap_or(NaiveTime::MIN);
    let today = local_now.date_naive().and_time(target);

    // A fixed offset maps every local time to exactly one instant.
    let candidate = match offset.from_local_datetime(&today) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        _ => now,
    };

    if candidate >= now {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}
