//! Relative date expressions
//!
//! Accepted forms:
//! - RFC 3339 timestamps: `2024-03-01T12:00:00Z`
//! - naive datetimes, read as UTC: `2024-03-01 12:00:00`, `2024-03-01T12:00`
//! - bare dates: `2024-03-01` (start of day, or end of day when increasing)
//! - offsets back from now: `-7d`, `-24h`, `-2w`, `-3m`, `-1q`, `-1y`, `-30M` (minutes)
//! - offsets snapped to a period boundary: `-1mStart`, `-1dEnd`, `mStart`, `yStart`
//!
//! Offsets always move backwards; the leading `-` is optional.

use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc,
};

use super::error::DateError;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Unit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'M' => Some(Unit::Minute),
            'h' => Some(Unit::Hour),
            'd' => Some(Unit::Day),
            'w' => Some(Unit::Week),
            'm' => Some(Unit::Month),
            'q' => Some(Unit::Quarter),
            'y' => Some(Unit::Year),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Snap {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Relative {
    amount: u32,
    unit: Unit,
    snap: Option<Snap>,
}

/// Parse a date expression against `now`.
///
/// With `increase` set, a bare date or a `Start` snap resolves to the last
/// instant of its period instead of the first, so it can serve as an
/// inclusive upper bound.
pub fn relative_date_parse(
    input: &str,
    now: DateTime<Utc>,
    increase: bool,
) -> Result<DateTime<Utc>, DateError> {
    let input = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        if increase {
            return end_of(start, Unit::Day).ok_or_else(|| DateError::OutOfRange(input.to_string()));
        }
        return Ok(start);
    }

    let relative = parse_relative(input).ok_or_else(|| DateError::Unparseable(input.to_string()))?;
    apply_relative(relative, now, increase).ok_or_else(|| DateError::OutOfRange(input.to_string()))
}

fn parse_relative(input: &str) -> Option<Relative> {
    let body = input.strip_prefix('-').unwrap_or(input);
    let digits_end = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    let (digits, rest) = body.split_at(digits_end);

    let amount = if digits.is_empty() {
        0
    } else {
        digits.parse().ok()?
    };

    let mut chars = rest.chars();
    let unit = Unit::from_char(chars.next()?)?;
    let snap = match chars.as_str() {
        "" => None,
        "Start" => Some(Snap::Start),
        "End" => Some(Snap::End),
        _ => return None,
    };

    Some(Relative { amount, unit, snap })
}

/// With `increase`, a `Start` snap resolves to the end of its period
fn apply_relative(relative: Relative, now: DateTime<Utc>, increase: bool) -> Option<DateTime<Utc>> {
    let amount = i64::from(relative.amount);
    let shifted = match relative.unit {
        Unit::Minute => now.checked_sub_signed(TimeDelta::try_minutes(amount)?),
        Unit::Hour => now.checked_sub_signed(TimeDelta::try_hours(amount)?),
        Unit::Day => now.checked_sub_signed(TimeDelta::try_days(amount)?),
        Unit::Week => now.checked_sub_signed(TimeDelta::try_weeks(amount)?),
        Unit::Month => now.checked_sub_months(Months::new(relative.amount)),
        Unit::Quarter => now.checked_sub_months(Months::new(relative.amount.checked_mul(3)?)),
        Unit::Year => now.checked_sub_months(Months::new(relative.amount.checked_mul(12)?)),
    }?;

    match relative.snap {
        None => Some(shifted),
        Some(Snap::Start) if !increase => start_of(shifted, relative.unit),
        Some(Snap::Start) | Some(Snap::End) => end_of(shifted, relative.unit),
    }
}

/// First instant of the period containing `dt`. Weeks start on Sunday.
fn start_of(dt: DateTime<Utc>, unit: Unit) -> Option<DateTime<Utc>> {
    let date = dt.date_naive();
    let naive = match unit {
        Unit::Minute => date.and_hms_opt(dt.hour(), dt.minute(), 0)?,
        Unit::Hour => date.and_hms_opt(dt.hour(), 0, 0)?,
        Unit::Day => date.and_hms_opt(0, 0, 0)?,
        Unit::Week => {
            let back = i64::from(date.weekday().num_days_from_sunday());
            date.checked_sub_signed(TimeDelta::try_days(back)?)?
                .and_hms_opt(0, 0, 0)?
        }
        Unit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0)?,
        Unit::Quarter => {
            let month = (date.month() - 1) / 3 * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), month, 1)?.and_hms_opt(0, 0, 0)?
        }
        Unit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
    };
    Some(Utc.from_utc_datetime(&naive))
}

/// Last instant (microsecond precision) of the period containing `dt`
fn end_of(dt: DateTime<Utc>, unit: Unit) -> Option<DateTime<Utc>> {
    let start = start_of(dt, unit)?;
    let next = match unit {
        Unit::Minute => start.checked_add_signed(TimeDelta::try_minutes(1)?),
        Unit::Hour => start.checked_add_signed(TimeDelta::try_hours(1)?),
        Unit::Day => start.checked_add_signed(TimeDelta::try_days(1)?),
        Unit::Week => start.checked_add_signed(TimeDelta::try_weeks(1)?),
        Unit::Month => start.checked_add_months(Months::new(1)),
        Unit::Quarter => start.checked_add_months(Months::new(3)),
        Unit::Year => start.checked_add_months(Months::new(12)),
    }?;
    next.checked_sub_signed(TimeDelta::microseconds(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2024, 5, 15, 13, 45, 30).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_offsets() {
        assert_eq!(relative_date_parse("-7d", now(), false).unwrap(), at(2024, 5, 8, 13, 45, 30));
        assert_eq!(relative_date_parse("-24h", now(), false).unwrap(), at(2024, 5, 14, 13, 45, 30));
        assert_eq!(relative_date_parse("-2w", now(), false).unwrap(), at(2024, 5, 1, 13, 45, 30));
        assert_eq!(relative_date_parse("-3m", now(), false).unwrap(), at(2024, 2, 15, 13, 45, 30));
        assert_eq!(relative_date_parse("-1q", now(), false).unwrap(), at(2024, 2, 15, 13, 45, 30));
        assert_eq!(relative_date_parse("-1y", now(), false).unwrap(), at(2023, 5, 15, 13, 45, 30));
        assert_eq!(relative_date_parse("-30M", now(), false).unwrap(), at(2024, 5, 15, 13, 15, 30));
    }

    #[test]
    fn test_sign_is_optional() {
        assert_eq!(
            relative_date_parse("7d", now(), false).unwrap(),
            relative_date_parse("-7d", now(), false).unwrap()
        );
    }

    #[test]
    fn test_month_offset_clamps_to_month_end() {
        let end_of_march = at(2024, 3, 31, 0, 0, 0);
        assert_eq!(
            relative_date_parse("-1m", end_of_march, false).unwrap(),
            at(2024, 2, 29, 0, 0, 0)
        );
    }

    #[test]
    fn test_snaps() {
        assert_eq!(relative_date_parse("mStart", now(), false).unwrap(), at(2024, 5, 1, 0, 0, 0));
        assert_eq!(relative_date_parse("yStart", now(), false).unwrap(), at(2024, 1, 1, 0, 0, 0));
        assert_eq!(relative_date_parse("qStart", now(), false).unwrap(), at(2024, 4, 1, 0, 0, 0));
        assert_eq!(relative_date_parse("wStart", now(), false).unwrap(), at(2024, 5, 12, 0, 0, 0));
        assert_eq!(relative_date_parse("-1dStart", now(), false).unwrap(), at(2024, 5, 14, 0, 0, 0));
        assert_eq!(relative_date_parse("hStart", now(), false).unwrap(), at(2024, 5, 15, 13, 0, 0));

        let end = relative_date_parse("-1mEnd", now(), false).unwrap();
        assert_eq!(end, at(2024, 5, 1, 0, 0, 0) - TimeDelta::microseconds(1));
    }

    #[test]
    fn test_start_snap_increase() {
        assert_eq!(
            relative_date_parse("mStart", now(), true).unwrap(),
            at(2024, 6, 1, 0, 0, 0) - TimeDelta::microseconds(1)
        );
        assert_eq!(
            relative_date_parse("dStart", now(), true).unwrap(),
            at(2024, 5, 16, 0, 0, 0) - TimeDelta::microseconds(1)
        );
        assert_eq!(relative_date_parse("dStart", now(), false).unwrap(), at(2024, 5, 15, 0, 0, 0));

        // End snaps and plain offsets do not depend on the flag
        assert_eq!(
            relative_date_parse("-1mEnd", now(), true).unwrap(),
            relative_date_parse("-1mEnd", now(), false).unwrap()
        );
        assert_eq!(relative_date_parse("-7d", now(), true).unwrap(), at(2024, 5, 8, 13, 45, 30));
    }

    #[test]
    fn test_absolute_forms() {
        assert_eq!(
            relative_date_parse("2024-03-01T12:00:00Z", now(), false).unwrap(),
            at(2024, 3, 1, 12, 0, 0)
        );
        assert_eq!(
            relative_date_parse("2024-03-01T12:00:00+02:00", now(), false).unwrap(),
            at(2024, 3, 1, 10, 0, 0)
        );
        assert_eq!(
            relative_date_parse("2024-03-01 08:30:15", now(), false).unwrap(),
            at(2024, 3, 1, 8, 30, 15)
        );
        assert_eq!(
            relative_date_parse("2024-03-01 08:30", now(), false).unwrap(),
            at(2024, 3, 1, 8, 30, 0)
        );
    }

    #[test]
    fn test_bare_date_increase() {
        assert_eq!(
            relative_date_parse("2024-03-01", now(), false).unwrap(),
            at(2024, 3, 1, 0, 0, 0)
        );
        assert_eq!(
            relative_date_parse("2024-03-01", now(), true).unwrap(),
            at(2024, 3, 2, 0, 0, 0) - TimeDelta::microseconds(1)
        );
    }

    #[test]
    fn test_unparseable() {
        for input in ["", "all", "yesterday", "-7x", "-7dMiddle", "2024-13-01"] {
            let result = relative_date_parse(input, now(), false);
            assert!(
                matches!(result, Err(DateError::Unparseable(_))),
                "{:?} -> {:?}",
                input,
                result
            );
        }
    }

    #[test]
    fn test_out_of_range() {
        let result = relative_date_parse("-4000000000y", now(), false);
        assert!(matches!(result, Err(DateError::OutOfRange(_))));
    }
}
