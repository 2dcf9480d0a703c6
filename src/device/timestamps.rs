//! OLE automation dates as reported by WPD (`WPD_OBJECT_DATE_MODIFIED`)

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Convert an OLE date (days since 1899-12-30, fraction is the time of day)
/// into a naive wall-clock time
///
/// Negative values count days backwards while the fraction still moves
/// forward in the day.
pub fn ole_date_to_naive(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }

    let days = value.trunc();
    let fraction = (value - days).abs();
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;

    let day_offset = Duration::try_days(days as i64)?;
    let time_offset = Duration::try_milliseconds((fraction * MILLIS_PER_DAY).round() as i64)?;

    epoch.checked_add_signed(day_offset)?.checked_add_signed(time_offset)
}

/// Convert an OLE date in local time to UTC
pub fn ole_date_to_utc(value: f64) -> Option<DateTime<Utc>> {
    let naive = ole_date_to_naive(value)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
