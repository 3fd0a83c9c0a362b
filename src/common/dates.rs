//! Calendar helpers: permissive date parsing and month arithmetic.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y%m%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%a, %d %b %Y",
];

/// Parses a date or date-time string in any of the common layouts.
///
/// Date-only inputs land at midnight. Offsets in RFC 3339 / RFC 2822 input
/// are dropped after normalising to the local wall-clock time they name.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_date_only(s).map(|d| d.and_time(NaiveTime::MIN)))
}

/// Like [`parse_datetime`], truncated to the calendar day.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    parse_date_only(s).or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn parse_date_only(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Last day of the month `months` away from `date` (spreadsheet EOMONTH).
pub fn eomonth(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let first = date.with_day(1)?;
    let shifted = if months >= 0 {
        first.checked_add_months(Months::new(months.unsigned_abs()))?
    } else {
        first.checked_sub_months(Months::new(months.unsigned_abs()))?
    };
    Some(end_of_month(shifted))
}

/// First day of the month `months` away from `date`.
pub fn bomonth(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    eomonth(date, months.checked_sub(1)?)?.checked_add_signed(TimeDelta::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_layouts() {
        let expected = date(2010, 1, 1);
        for s in ["2010-01-01", "2010/01/01", "01/01/2010", "1 January 2010", "Jan 1, 2010"] {
            assert_eq!(parse_date(s), Some(expected), "{s}");
        }
    }

    #[test]
    fn parses_datetimes() {
        let expected = date(2010, 1, 1).and_hms_opt(9, 36, 0).unwrap();
        assert_eq!(parse_datetime("2010-01-01 09:36:00"), Some(expected));
        assert_eq!(parse_datetime("2010-01-01T09:36"), Some(expected));
        assert_eq!(parse_datetime("2010-01-01T09:36:00+00:00"), Some(expected));
        assert_eq!(parse_date("2010-01-01 09:36:00"), Some(date(2010, 1, 1)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date("abc"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn month_ends() {
        assert_eq!(eomonth(date(2010, 1, 15), 0), Some(date(2010, 1, 31)));
        assert_eq!(eomonth(date(2010, 1, 31), 1), Some(date(2010, 2, 28)));
        assert_eq!(eomonth(date(2012, 3, 3), -1), Some(date(2012, 2, 29)));
        assert_eq!(eomonth(date(2010, 1, 3), 12), Some(date(2010, 12, 31)));
    }

    #[test]
    fn month_starts() {
        assert_eq!(bomonth(date(2010, 1, 3), 0), Some(date(2010, 1, 1)));
        assert_eq!(bomonth(date(2010, 1, 3), 2), Some(date(2010, 3, 1)));
        assert_eq!(bomonth(date(2010, 3, 3), -1), Some(date(2010, 2, 1)));
    }
}
