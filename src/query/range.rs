use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

static RE_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,4})\s*(?:d|days?)?$").unwrap());

/// An inclusive calendar range `[start, end]`, guaranteed `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::Validation(format!(
                "start date {start} cannot be after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Exactly `days` calendar days ending on `as_of`.
    pub fn last_n_days(days: u32, as_of: NaiveDate) -> Self {
        let span = days.max(1) as i64 - 1;
        Self {
            start: as_of - Duration::days(span),
            end: as_of,
        }
    }

    /// Fill in missing bounds: `end` defaults to `as_of`, `start` to
    /// `end - default_days`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        default_days: u32,
        as_of: NaiveDate,
    ) -> Result<Self> {
        let end = end.unwrap_or(as_of);
        let start = match start {
            Some(start) => start,
            None => days_before(end, default_days)?,
        };
        Self::new(start, end)
    }

    /// Like [`DateRange::resolve`], but a lookback period always wins over an
    /// explicit start date.
    pub fn with_lookback(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        period: Option<Lookback>,
        default_days: u32,
        as_of: NaiveDate,
    ) -> Result<Self> {
        match period {
            Some(p) => {
                let end = end.unwrap_or(as_of);
                Self::new(days_before(end, p.days())?, end)
            }
            None => Self::resolve(start, end, default_days, as_of),
        }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start && d <= self.end
    }
}

fn days_before(end: NaiveDate, days: u32) -> Result<NaiveDate> {
    end.checked_sub_signed(Duration::days(days as i64))
        .ok_or_else(|| {
            Error::Validation(format!("a {days}-day window before {end} is out of range"))
        })
}

/// Trend grouping mode. Anything other than `day` or `week` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(GroupBy::Day),
            "week" => Ok(GroupBy::Week),
            other => Err(Error::Validation(format!(
                "invalid groupBy '{other}': use 'day' or 'week'"
            ))),
        }
    }
}

/// The fixed set of lookback windows accepted by organization views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lookback {
    Days7,
    Days14,
    Days30,
    Days90,
}

impl Lookback {
    pub fn days(&self) -> u32 {
        match self {
            Lookback::Days7 => 7,
            Lookback::Days14 => 14,
            Lookback::Days30 => 30,
            Lookback::Days90 => 90,
        }
    }

    pub fn from_days(days: u32) -> Result<Self> {
        match days {
            7 => Ok(Lookback::Days7),
            14 => Ok(Lookback::Days14),
            30 => Ok(Lookback::Days30),
            90 => Ok(Lookback::Days90),
            other => Err(Error::Validation(format!(
                "invalid period {other}: use 7, 14, 30, or 90 days"
            ))),
        }
    }
}

impl FromStr for Lookback {
    type Err = Error;

    /// Accepts `30`, `30d`, `30 days`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let caps = RE_DAYS
            .captures(&s)
            .ok_or_else(|| Error::Validation(format!("invalid period: {s}")))?;
        let days: u32 = caps[1]
            .parse()
            .map_err(|_| Error::Validation(format!("invalid period: {s}")))?;
        Self::from_days(days)
    }
}

impl std::fmt::Display for Lookback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        assert!(DateRange::new(ymd(2025, 2, 1), ymd(2025, 1, 1)).is_err());
        assert!(DateRange::new(ymd(2025, 1, 1), ymd(2025, 1, 1)).is_ok());
    }

    #[test]
    fn test_resolve_defaults_to_trailing_window() {
        let today = ymd(2025, 3, 31);
        let r = DateRange::resolve(None, None, 30, today).unwrap();
        assert_eq!(r.end, today);
        assert_eq!(r.start, ymd(2025, 3, 1));
    }

    #[test]
    fn test_resolve_keeps_explicit_bounds() {
        let r = DateRange::resolve(Some(ymd(2025, 1, 1)), Some(ymd(2025, 1, 31)), 30, ymd(2025, 6, 1))
            .unwrap();
        assert_eq!(r, DateRange { start: ymd(2025, 1, 1), end: ymd(2025, 1, 31) });
    }

    #[test]
    fn test_resolve_rejects_window_past_calendar_start() {
        let err = DateRange::resolve(None, None, u32::MAX, ymd(2025, 3, 31)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_lookback_overrides_start() {
        let end = ymd(2025, 4, 30);
        let r = DateRange::with_lookback(
            Some(ymd(2025, 1, 1)),
            Some(end),
            Some(Lookback::Days30),
            7,
            ymd(2025, 6, 1),
        )
        .unwrap();
        assert_eq!(r.start, end - Duration::days(30));
        assert_eq!(r.end, end);
    }

    #[test]
    fn test_lookback_without_start() {
        let today = ymd(2025, 4, 30);
        let r = DateRange::with_lookback(None, None, Some(Lookback::Days30), 7, today).unwrap();
        assert_eq!(r.start, ymd(2025, 3, 31));
        assert_eq!(r.end, today);
    }

    #[test]
    fn test_no_lookback_falls_back_to_default_days() {
        let today = ymd(2025, 4, 30);
        let r = DateRange::with_lookback(None, None, None, 7, today).unwrap();
        assert_eq!(r.start, ymd(2025, 4, 23));
    }

    #[test]
    fn test_last_n_days_span() {
        let r = DateRange::last_n_days(7, ymd(2025, 1, 7));
        assert_eq!(r.start, ymd(2025, 1, 1));
        assert_eq!((r.end - r.start).num_days(), 6);
    }

    #[test]
    fn test_group_by_parse() {
        assert_eq!("day".parse::<GroupBy>().unwrap(), GroupBy::Day);
        assert_eq!("WEEK".parse::<GroupBy>().unwrap(), GroupBy::Week);
        assert!("month".parse::<GroupBy>().is_err());
        assert!("".parse::<GroupBy>().is_err());
    }

    #[test]
    fn test_lookback_parse() {
        assert_eq!("7".parse::<Lookback>().unwrap(), Lookback::Days7);
        assert_eq!("14d".parse::<Lookback>().unwrap(), Lookback::Days14);
        assert_eq!("90 days".parse::<Lookback>().unwrap(), Lookback::Days90);
        assert!("60".parse::<Lookback>().is_err());
        assert!("week".parse::<Lookback>().is_err());
        assert!(Lookback::from_days(0).is_err());
    }
}
