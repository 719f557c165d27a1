use chrono::{Datelike, Duration, NaiveDate};

/// Monday of the ISO week containing `d`. Weeks always start on Monday.
pub fn week_start(d: NaiveDate) -> NaiveDate {
    let offset = (7 + d.weekday().num_days_from_monday() as i64) % 7;
    d - Duration::days(offset)
}

/// Short chart label, e.g. `Jan 05`.
pub fn date_label(d: NaiveDate) -> String {
    d.format("%b %d").to_string()
}

/// Label for an explicit range, e.g. `Jan 01 - Jan 31`.
pub fn range_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", date_label(start), date_label(end))
}
