//! Resolved dates and date ranges
//!
//! A transaction's effective calendar date is `dateDetails.date` when the API
//! supplies one, otherwise `createdAt` read in the viewer's time zone at that
//! instant.

use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, MappedLocalTime, NaiveDate, NaiveDateTime,
    TimeZone, Utc,
};
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Transaction;

/// Longest range the range picker allows
pub const MAX_RANGE_DAYS: i64 = 365;

fn canonical_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"))
}

/// Build an offset from whole minutes east of UTC
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// The time zone local calendar dates are read in.
///
/// `System` follows the machine's zone rules, so each instant gets the
/// offset in force at that instant (DST included). `Fixed` pins one offset
/// for every instant and is only used when one is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocalZone {
    #[default]
    System,
    Fixed(FixedOffset),
}

impl LocalZone {
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        offset_from_minutes(minutes).map(Self::Fixed)
    }

    /// Today's calendar date in this zone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(self).date_naive()
    }
}

impl From<FixedOffset> for LocalZone {
    fn from(offset: FixedOffset) -> Self {
        Self::Fixed(offset)
    }
}

impl std::fmt::Display for LocalZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system time zone"),
            Self::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl TimeZone for LocalZone {
    type Offset = FixedOffset;

    fn from_offset(offset: &FixedOffset) -> Self {
        Self::Fixed(*offset)
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
        match self {
            Self::System => Local.offset_from_local_date(local),
            Self::Fixed(offset) => offset.offset_from_local_date(local),
        }
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> MappedLocalTime<FixedOffset> {
        match self {
            Self::System => Local.offset_from_local_datetime(local),
            Self::Fixed(offset) => offset.offset_from_local_datetime(local),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        match self {
            Self::System => Local.offset_from_utc_date(utc),
            Self::Fixed(offset) => offset.offset_from_utc_date(utc),
        }
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        match self {
            Self::System => Local.offset_from_utc_datetime(utc),
            Self::Fixed(offset) => offset.offset_from_utc_datetime(utc),
        }
    }
}

/// Parse a canonical `YYYY-MM-DD` local date
pub fn parse_local_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if !canonical_date_re().is_match(s) {
        return Err(Error::InvalidDate(format!("expected YYYY-MM-DD, got {:?}", s)));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidDate(format!("{:?}: {}", s, e)))
}

/// Parse an API timestamp.
///
/// Accepts RFC 3339 and offset-less ISO timestamps, which are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(Error::InvalidDate(format!("unparseable timestamp {:?}", s)))
}

/// The transaction's effective local calendar date in `zone`
pub fn resolved_date<Tz: TimeZone>(tx: &Transaction, zone: &Tz) -> Result<NaiveDate> {
    let canonical = tx
        .date_details
        .as_ref()
        .and_then(|d| d.date.as_deref())
        .filter(|d| !d.trim().is_empty());

    if let Some(date) = canonical {
        return parse_local_date(date);
    }

    match tx.created_at.as_deref() {
        Some(ts) => Ok(parse_timestamp(ts)?.with_timezone(zone).date_naive()),
        None => Err(Error::InvalidDate(format!("transaction {} has no date", tx.id))),
    }
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// Last day of the month containing `date`
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    // 31 days past the 1st is always in the following month
    let next = first + Duration::days(31);
    first_of_month(next) - Duration::days(1)
}

/// Inclusive range of local calendar dates.
///
/// Always `start <= end`, never later than the day it was built for, and at
/// most [`MAX_RANGE_DAYS`] long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range as the picker would: future dates clamp to `today`,
    /// over-long ranges keep their end and lose days from the start.
    pub fn new(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<Self> {
        let start = start.min(today);
        let end = end.min(today);
        if start > end {
            return Err(Error::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self::capped(start, end))
    }

    /// Single-day range
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Range for a quick-pick preset, relative to `today`
    pub fn preset(preset: RangePreset, today: NaiveDate) -> Self {
        let (start, end) = match preset {
            RangePreset::Today => (today, today),
            RangePreset::Last7Days => (today - Duration::days(6), today),
            RangePreset::ThisWeek => (
                today - Duration::days(today.weekday().num_days_from_monday() as i64),
                today,
            ),
            RangePreset::Last30Days => (today - Duration::days(29), today),
            RangePreset::ThisMonth => (first_of_month(today), today),
            RangePreset::LastMonth => {
                let prev_end = first_of_month(today) - Duration::days(1);
                (first_of_month(prev_end), prev_end)
            }
            RangePreset::Last90Days => (today - Duration::days(89), today),
            RangePreset::ThisYear => (today - Duration::days(today.ordinal0() as i64), today),
        };
        Self::capped(start, end)
    }

    fn capped(start: NaiveDate, end: NaiveDate) -> Self {
        let start = if (end - start).num_days() + 1 > MAX_RANGE_DAYS {
            end - Duration::days(MAX_RANGE_DAYS - 1)
        } else {
            start
        };
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn days_diff(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Quick-pick ranges offered by the date filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangePreset {
    Today,
    Last7Days,
    ThisWeek,
    Last30Days,
    ThisMonth,
    LastMonth,
    Last90Days,
    ThisYear,
}

impl RangePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Last7Days => "last-7-days",
            Self::ThisWeek => "this-week",
            Self::Last30Days => "last-30-days",
            Self::ThisMonth => "this-month",
            Self::LastMonth => "last-month",
            Self::Last90Days => "last-90-days",
            Self::ThisYear => "this-year",
        }
    }

    pub fn all() -> &'static [RangePreset] {
        &[
            Self::Today,
            Self::Last7Days,
            Self::ThisWeek,
            Self::Last30Days,
            Self::ThisMonth,
            Self::LastMonth,
            Self::Last90Days,
            Self::ThisYear,
        ]
    }
}

impl std::str::FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "last-7-days" | "7d" | "week" => Ok(Self::Last7Days),
            "this-week" => Ok(Self::ThisWeek),
            "last-30-days" | "30d" | "month" => Ok(Self::Last30Days),
            "this-month" => Ok(Self::ThisMonth),
            "last-month" => Ok(Self::LastMonth),
            "last-90-days" | "90d" => Ok(Self::Last90Days),
            "this-year" | "year" => Ok(Self::ThisYear),
            _ => {
                let names: Vec<&str> = Self::all().iter().map(|p| p.as_str()).collect();
                Err(format!(
                    "Unknown period: {}. Available: {}",
                    s,
                    names.join(", ")
                ))
            }
        }
    }
}

impl std::fmt::Display for RangePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateDetails;
    use crate::test_utils::EasternTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_canonical_date_takes_precedence() {
        let tx = Transaction {
            created_at: Some("2024-03-01T10:00:00Z".into()),
            date_details: Some(DateDetails {
                date: Some("2024-02-28".into()),
            }),
            ..Default::default()
        };
        assert_eq!(resolved_date(&tx, &utc()).unwrap(), date(2024, 2, 28));
    }

    #[test]
    fn test_created_at_shifts_into_local_offset() {
        let tx = Transaction {
            created_at: Some("2024-03-01T02:30:00.000Z".into()),
            ..Default::default()
        };
        let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(resolved_date(&tx, &pacific).unwrap(), date(2024, 2, 29));
        assert_eq!(resolved_date(&tx, &utc()).unwrap(), date(2024, 3, 1));
    }

    #[test]
    fn test_created_at_uses_offset_in_force_at_that_instant() {
        // 23:30 EST on Jan 14, read in a zone that is on EDT today
        let winter = Transaction {
            created_at: Some("2024-01-15T04:30:00Z".into()),
            ..Default::default()
        };
        assert_eq!(resolved_date(&winter, &EasternTime).unwrap(), date(2024, 1, 14));

        // 23:30 EDT on Jul 14
        let summer = Transaction {
            created_at: Some("2024-07-15T03:30:00Z".into()),
            ..Default::default()
        };
        assert_eq!(resolved_date(&summer, &EasternTime).unwrap(), date(2024, 7, 14));
    }

    #[test]
    fn test_fixed_zone_ignores_dst() {
        let tx = Transaction {
            created_at: Some("2024-01-15T04:30:00Z".into()),
            ..Default::default()
        };
        let edt = LocalZone::from_minutes(-240).unwrap();
        assert_eq!(resolved_date(&tx, &edt).unwrap(), date(2024, 1, 15));
        assert_eq!(LocalZone::from(utc()), LocalZone::Fixed(utc()));
        assert_eq!(LocalZone::default(), LocalZone::System);
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let dt = parse_timestamp("2024-05-06T07:08:09.123").unwrap();
        assert_eq!(dt.date_naive(), date(2024, 5, 6));
    }

    #[test]
    fn test_bad_canonical_date_does_not_fall_back() {
        let tx = Transaction {
            created_at: Some("2024-03-01T10:00:00Z".into()),
            date_details: Some(DateDetails {
                date: Some("not-a-date".into()),
            }),
            ..Default::default()
        };
        assert!(matches!(
            resolved_date(&tx, &utc()),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn test_non_canonical_shapes_rejected() {
        assert!(parse_local_date("2024-3-5").is_err());
        assert!(parse_local_date("2024-02-30").is_err());
        assert!(parse_local_date("05/03/2024").is_err());
        assert_eq!(parse_local_date(" 2024-03-05 ").unwrap(), date(2024, 3, 5));
    }

    #[test]
    fn test_missing_dates() {
        let tx = Transaction {
            id: "t9".into(),
            date_details: Some(DateDetails { date: Some("".into()) }),
            ..Default::default()
        };
        let err = resolved_date(&tx, &utc()).unwrap_err();
        assert!(err.to_string().contains("t9"));
    }

    #[test]
    fn test_range_clamps_future_dates() {
        let today = date(2024, 6, 15);
        let range = DateRange::new(date(2024, 6, 10), date(2024, 7, 1), today).unwrap();
        assert_eq!(range.end(), today);
        assert_eq!(range.days_diff(), 6);
    }

    #[test]
    fn test_range_rejects_inverted() {
        let today = date(2024, 6, 15);
        let result = DateRange::new(date(2024, 6, 10), date(2024, 6, 1), today);
        assert!(matches!(result, Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_range_caps_length() {
        let today = date(2024, 6, 15);
        let range = DateRange::new(date(2020, 1, 1), today, today).unwrap();
        assert_eq!(range.days_diff(), MAX_RANGE_DAYS);
        assert_eq!(range.end(), today);
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 7), date(2024, 2, 1)).unwrap();
        assert!(range.contains(date(2024, 1, 1)));
        assert!(range.contains(date(2024, 1, 7)));
        assert!(!range.contains(date(2024, 1, 8)));
        assert!(!range.contains(date(2023, 12, 31)));
    }

    #[test]
    fn test_presets() {
        let today = date(2024, 3, 14); // Thursday
        assert_eq!(DateRange::preset(RangePreset::Last7Days, today).days_diff(), 7);
        assert_eq!(DateRange::preset(RangePreset::Last30Days, today).days_diff(), 30);
        assert_eq!(
            DateRange::preset(RangePreset::ThisWeek, today).start(),
            date(2024, 3, 11)
        );

        let last_month = DateRange::preset(RangePreset::LastMonth, today);
        assert_eq!(last_month.start(), date(2024, 2, 1));
        assert_eq!(last_month.end(), date(2024, 2, 29));

        let this_year = DateRange::preset(RangePreset::ThisYear, today);
        assert_eq!(this_year.start(), date(2024, 1, 1));
    }

    #[test]
    fn test_this_year_on_leap_new_years_eve_is_capped() {
        let range = DateRange::preset(RangePreset::ThisYear, date(2024, 12, 31));
        assert_eq!(range.days_diff(), MAX_RANGE_DAYS);
    }

    #[test]
    fn test_month_edges() {
        assert_eq!(first_of_month(date(2024, 2, 17)), date(2024, 2, 1));
        assert_eq!(last_of_month(date(2024, 2, 17)), date(2024, 2, 29));
        assert_eq!(last_of_month(date(2023, 12, 1)), date(2023, 12, 31));
        assert_eq!(last_of_month(date(2024, 1, 31)), date(2024, 1, 31));
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("7d".parse::<RangePreset>().unwrap(), RangePreset::Last7Days);
        assert_eq!(
            "This-Month".parse::<RangePreset>().unwrap(),
            RangePreset::ThisMonth
        );
        assert!("fortnight".parse::<RangePreset>().is_err());
    }

    #[test]
    fn test_offset_from_minutes() {
        assert_eq!(
            offset_from_minutes(-300),
            FixedOffset::west_opt(5 * 3600)
        );
        assert!(offset_from_minutes(24 * 60).is_none());
    }
}
