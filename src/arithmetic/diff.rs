//! Signed differences between two values of the same type.
//!
//! Three regimes, chosen per part:
//!  - fixed-duration parts divide the elapsed microseconds, truncating
//!    toward zero;
//!  - DAY and the week parts compare bucket indexes, so two values one
//!    minute apart across a week boundary are a full week apart;
//!  - MONTH/QUARTER/YEAR count whole elapsed calendar units, aware of
//!    month-end clamping, so Jan 31 to Mar 1 is one whole month.
//! Every variant satisfies `diff(a, b) == -diff(b, a)`.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::arithmetic::add_interval_to_civil;
use crate::bounds::{self, MICROS_PER_DAY};
use crate::error::{Error, Result};
use crate::part::{check_part, DateTimePart, PartFunction};
use crate::value::{DateValue, DatetimeValue, IntervalValue, TimeValue, TimestampValue};

/// DATE_DIFF over DAY, the week parts, MONTH/QUARTER/YEAR and ISOYEAR.
pub fn date_diff(a: DateValue, b: DateValue, part: DateTimePart) -> Result<i64> {
    check_part(part, "date_diff", PartFunction::DateDiff)?;
    civil_diff(
        a.civil().and_time(chrono::NaiveTime::MIN),
        b.civil().and_time(chrono::NaiveTime::MIN),
        part,
    )
}

/// TIME_DIFF: truncated duration division over MICROSECOND..HOUR.
pub fn time_diff(a: TimeValue, b: TimeValue, part: DateTimePart) -> Result<i64> {
    check_part(part, "time_diff", PartFunction::TimeDiff)?;
    let unit = part
        .fixed_micros()
        .ok_or_else(|| Error::internal(format!("time part without a duration: {}", part)))?;
    Ok((a.micros_since_midnight() - b.micros_since_midnight()) / unit)
}

/// DATETIME_DIFF over the full civil part set.
pub fn datetime_diff(a: DatetimeValue, b: DatetimeValue, part: DateTimePart) -> Result<i64> {
    check_part(part, "datetime_diff", PartFunction::DatetimeDiff)?;
    civil_diff(a.civil(), b.civil(), part)
}

/// TIMESTAMP_DIFF: absolute-duration division only, MICROSECOND..DAY; a
/// DAY here is exactly 86 400 seconds regardless of zone.
pub fn timestamp_diff(a: TimestampValue, b: TimestampValue, part: DateTimePart) -> Result<i64> {
    check_part(part, "timestamp_diff", PartFunction::TimestampDiff)?;
    let unit = match part {
        DateTimePart::Day => MICROS_PER_DAY,
        _ => part
            .fixed_micros()
            .ok_or_else(|| Error::internal(format!("part without a duration: {}", part)))?,
    };
    Ok((a.micros() - b.micros()) / unit)
}

fn civil_diff(a: NaiveDateTime, b: NaiveDateTime, part: DateTimePart) -> Result<i64> {
    if let Some(unit) = part.fixed_micros() {
        let a_micros = civil_micros(a);
        let b_micros = civil_micros(b);
        return Ok((a_micros - b_micros) / unit);
    }
    match part {
        DateTimePart::Day => Ok(day_index(a.date()) - day_index(b.date())),
        DateTimePart::Week
        | DateTimePart::WeekMonday
        | DateTimePart::WeekTuesday
        | DateTimePart::WeekWednesday
        | DateTimePart::WeekThursday
        | DateTimePart::WeekFriday
        | DateTimePart::WeekSaturday => {
            let anchor = part.week_anchor().unwrap_or(0);
            Ok(week_index(a.date(), anchor) - week_index(b.date(), anchor))
        }
        DateTimePart::IsoWeek => {
            // ISO weeks always start on Monday.
            Ok(week_index(a.date(), 1) - week_index(b.date(), 1))
        }
        DateTimePart::Month => completed_months(a, b),
        DateTimePart::Quarter => Ok(completed_months(a, b)? / 3),
        DateTimePart::Year => Ok(completed_months(a, b)? / 12),
        DateTimePart::IsoYear => {
            Ok(a.date().iso_week().year() as i64 - b.date().iso_week().year() as i64)
        }
        _ => Err(Error::internal(format!("unhandled civil part: {}", part))),
    }
}

fn civil_micros(dt: NaiveDateTime) -> i64 {
    day_index(dt.date()) * MICROS_PER_DAY
        + chrono::Timelike::num_seconds_from_midnight(&dt.time()) as i64 * 1_000_000
        + (chrono::Timelike::nanosecond(&dt.time()) / 1_000) as i64
}

fn day_index(date: NaiveDate) -> i64 {
    bounds::epoch_days(date) as i64
}

/// Index of the week bucket containing `date`, for weeks anchored on the
/// given weekday (Sunday = 0). Buckets share indexes across years.
fn week_index(date: NaiveDate, anchor: u32) -> i64 {
    let days = day_index(date) - days_past_anchor(date, anchor);
    days.div_euclid(7)
}

fn days_past_anchor(date: NaiveDate, anchor: u32) -> i64 {
    ((date.weekday().num_days_from_sunday() + 7 - anchor) % 7) as i64
}

/// Whole months elapsed from `b` to `a`, counting a clamped month-end
/// landing (Jan 31 + 1 month = Feb 28/29) as a complete month. Evaluated
/// on the ordered pair so negation keeps `diff(a, b) == -diff(b, a)` even
/// when clamping makes the two directions disagree.
fn completed_months(a: NaiveDateTime, b: NaiveDateTime) -> Result<i64> {
    if a < b {
        return Ok(-completed_months(b, a)?);
    }
    let index = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
    let mut n = index(a.date()) - index(b.date());
    // The raw index difference overshoots by at most one unit.
    if n > 0 {
        let landed = add_interval_to_civil(b, month_interval(n)?)?;
        if landed > a {
            n -= 1;
        }
    }
    Ok(n)
}

fn month_interval(months: i64) -> Result<IntervalValue> {
    let months = i32::try_from(months)
        .map_err(|_| Error::out_of_range(format!("Interval months overflow: {}", months)))?;
    Ok(IntervalValue::new(months, 0, 0))
}
