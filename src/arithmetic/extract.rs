//! Field extraction for every value type.

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};
use crate::part::{check_part, DateTimePart, PartFunction};
use crate::timezone::ResolvedTimezone;
use crate::value::{DateValue, DatetimeValue, TimeValue, TimestampValue};

/// EXTRACT from a DATE; accepts the date-field parts only.
pub fn date_extract(date: DateValue, part: DateTimePart) -> Result<i64> {
    check_part(part, "date_extract", PartFunction::DateExtract)?;
    Ok(extract_date_field(date.civil(), part))
}

/// EXTRACT from a TIME; accepts MICROSECOND..HOUR.
pub fn time_extract(time: TimeValue, part: DateTimePart) -> Result<i64> {
    check_part(part, "time_extract", PartFunction::TimeExtract)?;
    Ok(extract_time_field(time, part))
}

/// EXTRACT from a DATETIME; accepts the full part set.
pub fn datetime_extract(dt: DatetimeValue, part: DateTimePart) -> Result<i64> {
    check_part(part, "datetime_extract", PartFunction::DatetimeExtract)?;
    if part.fixed_micros().is_some() {
        Ok(extract_time_field(dt.time(), part))
    } else {
        Ok(extract_date_field(dt.date().civil(), part))
    }
}

/// EXTRACT from a TIMESTAMP, read through the given zone.
pub fn timestamp_extract(
    ts: TimestampValue,
    part: DateTimePart,
    tz: &ResolvedTimezone,
) -> Result<i64> {
    check_part(part, "timestamp_extract", PartFunction::TimestampExtract)?;
    let civil = DatetimeValue::from_civil(tz.civil_from_instant(ts))?;
    if part.fixed_micros().is_some() {
        Ok(extract_time_field(civil.time(), part))
    } else {
        Ok(extract_date_field(civil.date().civil(), part))
    }
}

fn extract_time_field(time: TimeValue, part: DateTimePart) -> i64 {
    match part {
        DateTimePart::Microsecond => time.microsecond() as i64,
        DateTimePart::Millisecond => (time.microsecond() / 1_000) as i64,
        DateTimePart::Second => time.second() as i64,
        DateTimePart::Minute => time.minute() as i64,
        DateTimePart::Hour => time.hour() as i64,
        _ => unreachable!("non-time part routed to time extraction"),
    }
}

fn extract_date_field(date: NaiveDate, part: DateTimePart) -> i64 {
    match part {
        DateTimePart::Day => date.day() as i64,
        // 1 = Sunday .. 7 = Saturday.
        DateTimePart::DayOfWeek => date.weekday().num_days_from_sunday() as i64 + 1,
        DateTimePart::DayOfYear => date.ordinal() as i64,
        DateTimePart::Week
        | DateTimePart::WeekMonday
        | DateTimePart::WeekTuesday
        | DateTimePart::WeekWednesday
        | DateTimePart::WeekThursday
        | DateTimePart::WeekFriday
        | DateTimePart::WeekSaturday => {
            let anchor = part.week_anchor().unwrap_or(0);
            anchored_week_number(date, anchor)
        }
        DateTimePart::IsoWeek => date.iso_week().week() as i64,
        DateTimePart::Month => date.month() as i64,
        DateTimePart::Quarter => (date.month0() / 3) as i64 + 1,
        DateTimePart::Year => date.year() as i64,
        DateTimePart::IsoYear => date.iso_week().year() as i64,
        _ => unreachable!("time part routed to date extraction"),
    }
}

/// Week number 0..53: days before the year's first anchor weekday are
/// week 0, the anchor day itself starts week 1.
fn anchored_week_number(date: NaiveDate, anchor: u32) -> i64 {
    // January 1 exists for every representable year.
    let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap();
    let first_anchor_ordinal =
        1 + (anchor + 7 - jan1.weekday().num_days_from_sunday()) % 7;
    let ordinal = date.ordinal();
    if ordinal < first_anchor_ordinal {
        0
    } else {
        ((ordinal - first_anchor_ordinal) / 7) as i64 + 1
    }
}
