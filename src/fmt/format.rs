//! The output half of the format grammar.
//!
//! Elements the grammar does not define are copied through literally,
//! including the `%`, which is how the reference behaves; formatting never
//! fails on an unknown element, only on an over-long format string.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::bounds::{self, MICROS_PER_SECOND};
use crate::error::{Error, Result};
use crate::fmt::FormatOptions;
use crate::timezone::ResolvedTimezone;
use crate::value::{DateValue, DatetimeValue, TimeValue, TimestampValue};

pub(super) const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub(super) const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Sunday first, matching the DAYOFWEEK numbering.
pub(super) const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub(super) const WEEKDAY_ABBREVIATIONS: [&str; 7] =
    ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Zone fields available when formatting an instant; civil types format
/// as if in UTC.
pub(super) struct ZoneDisplay {
    pub offset_seconds: i32,
    pub name: String,
}

pub(super) fn format_date_value(
    format: &str,
    date: DateValue,
    options: &FormatOptions,
) -> Result<String> {
    format_civil(format, date.civil().and_time(NaiveTime::MIN), None, options)
}

pub(super) fn format_time_value(
    format: &str,
    time: TimeValue,
    options: &FormatOptions,
) -> Result<String> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| Error::internal("epoch date missing"))?;
    format_civil(format, epoch.and_time(time.civil()), None, options)
}

pub(super) fn format_datetime_value(
    format: &str,
    dt: DatetimeValue,
    options: &FormatOptions,
) -> Result<String> {
    format_civil(format, dt.civil(), None, options)
}

pub(super) fn format_timestamp_value(
    format: &str,
    ts: TimestampValue,
    tz: &ResolvedTimezone,
    options: &FormatOptions,
) -> Result<String> {
    let zone = ZoneDisplay {
        offset_seconds: tz.offset_seconds_at(ts),
        name: tz.display_name_at(ts),
    };
    format_civil(format, tz.civil_from_instant(ts), Some(&zone), options)
}

pub(super) fn format_civil(
    format: &str,
    civil: NaiveDateTime,
    zone: Option<&ZoneDisplay>,
    options: &FormatOptions,
) -> Result<String> {
    if format.chars().count() > options.max_format_width {
        return Err(Error::out_of_range(format!(
            "Format string too long; limit {}",
            options.max_format_width
        )));
    }
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len() + 16);
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        if i + 1 == chars.len() {
            out.push('%');
            break;
        }
        i += 1 + emit_element(&chars[i + 1..], civil, zone, options, &mut out)?;
        i += 1;
    }
    Ok(out)
}

/// Emits one element starting after the `%`; returns how many format
/// characters beyond the first were consumed.
fn emit_element(
    rest: &[char],
    civil: NaiveDateTime,
    zone: Option<&ZoneDisplay>,
    options: &FormatOptions,
    out: &mut String,
) -> Result<usize> {
    let date = civil.date();
    let time = civil.time();
    let weekday_from_sunday = date.weekday().num_days_from_sunday() as usize;
    match rest[0] {
        'A' => out.push_str(WEEKDAY_NAMES[weekday_from_sunday]),
        'a' => out.push_str(WEEKDAY_ABBREVIATIONS[weekday_from_sunday]),
        'B' => out.push_str(MONTH_NAMES[date.month0() as usize]),
        'b' | 'h' => out.push_str(MONTH_ABBREVIATIONS[date.month0() as usize]),
        'C' => push_padded(out, date.year().div_euclid(100) as i64, 2),
        'c' => out.push_str(&format_civil("%a %b %e %H:%M:%S %Y", civil, zone, options)?),
        'D' | 'x' => out.push_str(&format_civil("%m/%d/%y", civil, zone, options)?),
        'd' => push_padded(out, date.day() as i64, 2),
        'e' => {
            let _ = write!(out, "{:2}", date.day());
        }
        'F' => out.push_str(&format_civil("%Y-%m-%d", civil, zone, options)?),
        'G' => push_padded(out, date.iso_week().year() as i64, 4),
        'g' => push_padded(out, (date.iso_week().year() as i64).rem_euclid(100), 2),
        'H' => push_padded(out, time.hour() as i64, 2),
        'k' => {
            let _ = write!(out, "{:2}", time.hour());
        }
        'I' => push_padded(out, hour12(time) as i64, 2),
        'l' => {
            let _ = write!(out, "{:2}", hour12(time));
        }
        'j' => push_padded(out, date.ordinal() as i64, 3),
        'J' => {
            if options.expand_iso_day_of_year {
                push_padded(out, iso_day_of_year(date), 3);
            } else {
                out.push_str("%J");
            }
        }
        'M' => push_padded(out, time.minute() as i64, 2),
        'm' => push_padded(out, date.month() as i64, 2),
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'P' => out.push_str(if time.hour() < 12 { "am" } else { "pm" }),
        'p' => out.push_str(if time.hour() < 12 { "AM" } else { "PM" }),
        'Q' => {
            if options.expand_quarter {
                let _ = write!(out, "{}", date.month0() / 3 + 1);
            } else {
                out.push_str("%Q");
            }
        }
        'R' => out.push_str(&format_civil("%H:%M", civil, zone, options)?),
        'S' => push_padded(out, time.second() as i64, 2),
        's' => {
            let offset = zone.map_or(0, |z| z.offset_seconds) as i64;
            let _ = write!(out, "{}", civil_epoch_seconds(civil) - offset);
        }
        'T' | 'X' => out.push_str(&format_civil("%H:%M:%S", civil, zone, options)?),
        'U' => push_padded(out, week_of_year(date, Weekday::Sun), 2),
        'W' => push_padded(out, week_of_year(date, Weekday::Mon), 2),
        'u' => {
            let _ = write!(out, "{}", date.weekday().number_from_monday());
        }
        'V' => push_padded(out, date.iso_week().week() as i64, 2),
        'w' => {
            let _ = write!(out, "{}", weekday_from_sunday);
        }
        'Y' => {
            let _ = write!(out, "{}", date.year());
        }
        'y' => push_padded(out, (date.year() as i64).rem_euclid(100), 2),
        'Z' => match zone {
            Some(z) => out.push_str(&z.name),
            None => out.push_str("UTC"),
        },
        'z' => push_offset(out, zone.map_or(0, |z| z.offset_seconds), false),
        '%' => out.push('%'),
        'E' => return emit_extension(rest, civil, zone, out),
        other => {
            out.push('%');
            out.push(other);
        }
    }
    Ok(0)
}

/// `%Ez`, `%E4Y`, `%E#S` and `%E*S`; anything else after `%E` is copied
/// through literally.
fn emit_extension(
    rest: &[char],
    civil: NaiveDateTime,
    zone: Option<&ZoneDisplay>,
    out: &mut String,
) -> Result<usize> {
    let time = civil.time();
    match rest.get(1) {
        Some('z') => {
            push_offset(out, zone.map_or(0, |z| z.offset_seconds), true);
            Ok(1)
        }
        Some('4') if rest.get(2) == Some(&'Y') => {
            push_padded(out, civil.date().year() as i64, 4);
            Ok(2)
        }
        Some('*') if rest.get(2) == Some(&'S') => {
            push_padded(out, time.second() as i64, 2);
            let micros = (time.nanosecond() / 1_000) as i64;
            if micros > 0 {
                let mut digits = format!("{:06}", micros);
                while digits.ends_with('0') {
                    digits.pop();
                }
                out.push('.');
                out.push_str(&digits);
            }
            Ok(2)
        }
        Some(d) if d.is_ascii_digit() => {
            let mut len = 1;
            let mut precision = 0usize;
            while let Some(c) = rest.get(len) {
                if let Some(v) = c.to_digit(10) {
                    precision = precision * 10 + v as usize;
                    len += 1;
                } else {
                    break;
                }
            }
            if rest.get(len) != Some(&'S') {
                out.push_str("%E");
                return Ok(0);
            }
            push_padded(out, time.second() as i64, 2);
            if precision > 0 {
                let micros = (time.nanosecond() / 1_000) as u64;
                let digits = format!("{:06}", micros);
                out.push('.');
                if precision <= 6 {
                    out.push_str(&digits[..precision]);
                } else {
                    out.push_str(&digits);
                    for _ in 6..precision {
                        out.push('0');
                    }
                }
            }
            Ok(len)
        }
        _ => {
            out.push_str("%E");
            Ok(0)
        }
    }
}

fn hour12(time: NaiveTime) -> u32 {
    match time.hour() % 12 {
        0 => 12,
        h => h,
    }
}

fn push_padded(out: &mut String, value: i64, width: usize) {
    if value < 0 {
        let _ = write!(out, "-{:0width$}", -value, width = width.saturating_sub(1));
    } else {
        let _ = write!(out, "{:0width$}", value, width = width);
    }
}

fn push_offset(out: &mut String, offset_seconds: i32, with_colon: bool) {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.abs();
    if with_colon {
        let _ = write!(out, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60);
    } else {
        let _ = write!(out, "{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60);
    }
}

/// strftime-style week of year: days before the year's first anchor day
/// count as week 0.
fn week_of_year(date: NaiveDate, anchor: Weekday) -> i64 {
    let yday = date.ordinal0() as i64;
    let wday = date.weekday().days_since(anchor) as i64;
    (yday + 7 - wday) / 7
}

fn iso_day_of_year(date: NaiveDate) -> i64 {
    let iso_year = date.iso_week().year();
    match NaiveDate::from_isoywd_opt(iso_year, 1, Weekday::Mon) {
        Some(start) => (date - start).num_days() + 1,
        None => date.ordinal() as i64,
    }
}

fn civil_epoch_seconds(civil: NaiveDateTime) -> i64 {
    bounds::epoch_days(civil.date()) as i64 * (bounds::MICROS_PER_DAY / MICROS_PER_SECOND)
        + civil.time().num_seconds_from_midnight() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmt;

    fn date(y: i64, m: i64, d: i64) -> DateValue {
        DateValue::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date_names_and_padding() {
        assert_eq!(
            fmt::format_date("%A %b %e %Y", date(2008, 12, 25)).unwrap(),
            "Thursday Dec 25 2008"
        );
        assert_eq!(
            fmt::format_date("%A %b %e %Y", date(2023, 2, 2)).unwrap(),
            "Thursday Feb  2 2023"
        );
        assert_eq!(fmt::format_date("%B %d", date(2023, 2, 2)).unwrap(), "February 02");
        assert_eq!(fmt::format_date("%D", date(2023, 2, 2)).unwrap(), "02/02/23");
    }

    #[test]
    fn test_format_without_elements_passes_through() {
        assert_eq!(fmt::format_date("abc", date(2008, 12, 25)).unwrap(), "abc");
        assert_eq!(fmt::format_date("100%% done", date(2008, 12, 25)).unwrap(), "100% done");
    }

    #[test]
    fn test_format_time_elements() {
        let t = TimeValue::from_hms(7, 31, 15).unwrap();
        assert_eq!(fmt::format_time("%R", t).unwrap(), "07:31");
        assert_eq!(fmt::format_time("%T", t).unwrap(), "07:31:15");
        assert_eq!(fmt::format_time("%I:%M %p", t).unwrap(), "07:31 AM");
        assert_eq!(
            fmt::format_time("%l:%M %P", TimeValue::from_hms(15, 5, 0).unwrap()).unwrap(),
            " 3:05 pm"
        );
        assert_eq!(
            fmt::format_time("%I %p", TimeValue::from_hms(0, 0, 0).unwrap()).unwrap(),
            "12 AM"
        );
        assert_eq!(
            fmt::format_time("%I %p", TimeValue::from_hms(12, 0, 0).unwrap()).unwrap(),
            "12 PM"
        );
    }

    #[test]
    fn test_fractional_second_elements() {
        let t = TimeValue::from_hms_micros(1, 2, 3, 450_000).unwrap();
        assert_eq!(fmt::format_time("%E1S", t).unwrap(), "03.4");
        assert_eq!(fmt::format_time("%E6S", t).unwrap(), "03.450000");
        assert_eq!(fmt::format_time("%E0S", t).unwrap(), "03");
        assert_eq!(fmt::format_time("%E*S", t).unwrap(), "03.45");
        let whole = TimeValue::from_hms(1, 2, 3).unwrap();
        assert_eq!(fmt::format_time("%E*S", whole).unwrap(), "03");
        assert_eq!(fmt::format_time("%E1S", whole).unwrap(), "03.0");
    }

    #[test]
    fn test_format_datetime_composite() {
        let dt = DatetimeValue::from_ymd_hms(2008, 12, 25, 15, 30, 0).unwrap();
        assert_eq!(fmt::format_datetime("%c", dt).unwrap(), "Thu Dec 25 15:30:00 2008");
        assert_eq!(fmt::format_datetime("%b-%d-%Y", dt).unwrap(), "Dec-25-2008");
        assert_eq!(fmt::format_datetime("%b %Y", dt).unwrap(), "Dec 2008");
        assert_eq!(fmt::format_datetime("%F %T", dt).unwrap(), "2008-12-25 15:30:00");
    }

    #[test]
    fn test_format_timestamp_reads_through_zone() {
        let utc = ResolvedTimezone::utc();
        let la = ResolvedTimezone::resolve("America/Los_Angeles").unwrap();
        // 2008-12-25 15:30:00 UTC.
        let ts = TimestampValue::from_micros(1_230_219_000_000_000).unwrap();
        assert_eq!(
            fmt::format_timestamp("%c", ts, &la, &FormatOptions::default()).unwrap(),
            "Thu Dec 25 07:30:00 2008"
        );
        assert_eq!(
            fmt::format_timestamp("%b-%d-%Y", ts, &utc, &FormatOptions::default()).unwrap(),
            "Dec-25-2008"
        );
        assert_eq!(
            fmt::format_timestamp("%z %Ez", ts, &la, &FormatOptions::default()).unwrap(),
            "-0800 -08:00"
        );
        assert_eq!(
            fmt::format_timestamp("%Z", ts, &utc, &FormatOptions::default()).unwrap(),
            "UTC"
        );
        assert_eq!(
            fmt::format_timestamp("%s", ts, &la, &FormatOptions::default()).unwrap(),
            "1230219000"
        );
    }

    #[test]
    fn test_quarter_and_iso_day_elements_are_gated() {
        let d = date(2008, 12, 25);
        assert_eq!(fmt::format_date("%Q %J", d).unwrap(), "%Q %J");
        let expanded =
            format_date_value("%Q %J", d, &FormatOptions::expanded()).unwrap();
        // ISO week 1 of 2008 began 2007-12-31, making Dec 25 ISO day 361.
        assert_eq!(expanded, "4 361");
    }

    #[test]
    fn test_week_and_iso_elements() {
        // 2023-01-10: ISO week 2 of 2023, Tuesday.
        let d = date(2023, 1, 10);
        assert_eq!(fmt::format_date("%U %W %V", d).unwrap(), "02 02 02");
        assert_eq!(fmt::format_date("%u %w", d).unwrap(), "2 2");
        assert_eq!(fmt::format_date("%G %g", d).unwrap(), "2023 23");
        assert_eq!(fmt::format_date("%j", d).unwrap(), "010");
    }

    #[test]
    fn test_unknown_elements_pass_through() {
        assert_eq!(fmt::format_date("%i", date(2023, 1, 10)).unwrap(), "%i");
        assert_eq!(fmt::format_date("%", date(2023, 1, 10)).unwrap(), "%");
    }

    #[test]
    fn test_overlong_format_rejected() {
        let long = "%Y".repeat(513);
        assert!(matches!(
            fmt::format_date(&long, date(2023, 1, 10)),
            Err(Error::OutOfRange(_))
        ));
    }
}
