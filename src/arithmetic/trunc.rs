//! Truncation to the start of a containing period, and LAST_DAY.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::error::{Error, Result};
use crate::part::{check_part, DateTimePart, PartFunction};
use crate::timezone::ResolvedTimezone;
use crate::value::{DateValue, DatetimeValue, TimeValue, TimestampValue};

/// DATE_TRUNC: rounds down to the first day of the containing period.
/// Plain WEEK anchors to Sunday.
pub fn date_trunc(date: DateValue, part: DateTimePart) -> Result<DateValue> {
    check_part(part, "date_trunc", PartFunction::DateTrunc)?;
    DateValue::from_civil(trunc_date(date.civil(), part)?)
}

/// TIME_TRUNC: zeroes every field finer than the part.
pub fn time_trunc(time: TimeValue, part: DateTimePart) -> Result<TimeValue> {
    check_part(part, "time_trunc", PartFunction::TimeTrunc)?;
    let unit = part
        .fixed_micros()
        .ok_or_else(|| Error::internal(format!("time part without a duration: {}", part)))?;
    TimeValue::from_micros_since_midnight((time.micros_since_midnight() / unit) * unit)
}

/// DATETIME_TRUNC over the full civil part set.
pub fn datetime_trunc(dt: DatetimeValue, part: DateTimePart) -> Result<DatetimeValue> {
    check_part(part, "datetime_trunc", PartFunction::DatetimeTrunc)?;
    DatetimeValue::from_civil(trunc_civil(dt.civil(), part)?)
}

/// TIMESTAMP_TRUNC: truncates the civil reading in the supplied zone and
/// maps the result back to an instant, so DAY lands on local midnight.
pub fn timestamp_trunc(
    ts: TimestampValue,
    part: DateTimePart,
    tz: &ResolvedTimezone,
) -> Result<TimestampValue> {
    check_part(part, "timestamp_trunc", PartFunction::TimestampTrunc)?;
    let truncated = trunc_civil(tz.civil_from_instant(ts), part)?;
    tz.instant_from_civil(truncated)
}

/// LAST_DAY: the final day of the period containing `date`. `None`
/// defaults the part to MONTH, matching the SQL surface.
pub fn last_day(date: DateValue, part: Option<DateTimePart>) -> Result<DateValue> {
    let part = part.unwrap_or(DateTimePart::Month);
    check_part(part, "last_day", PartFunction::LastDay)?;
    let civil = date.civil();
    let last = match part {
        DateTimePart::Week
        | DateTimePart::WeekMonday
        | DateTimePart::WeekTuesday
        | DateTimePart::WeekWednesday
        | DateTimePart::WeekThursday
        | DateTimePart::WeekFriday
        | DateTimePart::WeekSaturday
        | DateTimePart::IsoWeek => trunc_date(civil, part)?
            .checked_add_days(chrono::Days::new(6))
            .ok_or_else(|| Error::out_of_range(format!("Date arithmetic overflow: {}", civil)))?,
        DateTimePart::Month => last_day_of_month(civil.year(), civil.month())?,
        DateTimePart::Quarter => {
            let last_month = ((civil.month0() / 3) + 1) * 3;
            last_day_of_month(civil.year(), last_month)?
        }
        DateTimePart::Year => NaiveDate::from_ymd_opt(civil.year(), 12, 31)
            .ok_or_else(|| Error::internal("December 31 missing"))?,
        DateTimePart::IsoYear => {
            // The day before week 1 of the next ISO year.
            let next = NaiveDate::from_isoywd_opt(civil.iso_week().year() + 1, 1, Weekday::Mon)
                .ok_or_else(|| {
                    Error::out_of_range(format!("Date arithmetic overflow: {}", civil))
                })?;
            next.pred_opt()
                .ok_or_else(|| Error::internal("ISO year start has no predecessor"))?
        }
        _ => return Err(Error::internal(format!("unhandled part: {}", part))),
    };
    DateValue::from_civil(last)
}

/// LAST_DAY applied to the date component of a DATETIME.
pub fn last_day_of_datetime(dt: DatetimeValue, part: Option<DateTimePart>) -> Result<DateValue> {
    last_day(dt.date(), part)
}

fn trunc_civil(dt: NaiveDateTime, part: DateTimePart) -> Result<NaiveDateTime> {
    if let Some(unit) = part.fixed_micros() {
        let micros = chrono::Timelike::num_seconds_from_midnight(&dt.time()) as i64 * 1_000_000
            + (chrono::Timelike::nanosecond(&dt.time()) / 1_000) as i64;
        let floored = (micros / unit) * unit;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            (floored / 1_000_000) as u32,
            ((floored % 1_000_000) * 1_000) as u32,
        )
        .ok_or_else(|| Error::internal("truncated time out of range"))?;
        return Ok(NaiveDateTime::new(dt.date(), time));
    }
    Ok(trunc_date(dt.date(), part)?.and_time(NaiveTime::MIN))
}

fn trunc_date(date: NaiveDate, part: DateTimePart) -> Result<NaiveDate> {
    let underflow = || Error::out_of_range(format!("Date arithmetic overflow: {}", date));
    match part {
        DateTimePart::Day => Ok(date),
        DateTimePart::Week
        | DateTimePart::WeekMonday
        | DateTimePart::WeekTuesday
        | DateTimePart::WeekWednesday
        | DateTimePart::WeekThursday
        | DateTimePart::WeekFriday
        | DateTimePart::WeekSaturday => {
            let anchor = part.week_anchor().unwrap_or(0);
            let back = (date.weekday().num_days_from_sunday() + 7 - anchor) % 7;
            date.checked_sub_days(chrono::Days::new(back as u64))
                .ok_or_else(underflow)
        }
        DateTimePart::IsoWeek => {
            let back = date.weekday().num_days_from_monday();
            date.checked_sub_days(chrono::Days::new(back as u64))
                .ok_or_else(underflow)
        }
        DateTimePart::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .ok_or_else(|| Error::internal("first of month missing")),
        DateTimePart::Quarter => {
            NaiveDate::from_ymd_opt(date.year(), (date.month0() / 3) * 3 + 1, 1)
                .ok_or_else(|| Error::internal("first of quarter missing"))
        }
        DateTimePart::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)
            .ok_or_else(|| Error::internal("January 1 missing")),
        DateTimePart::IsoYear => {
            NaiveDate::from_isoywd_opt(date.iso_week().year(), 1, Weekday::Mon)
                .ok_or_else(underflow)
        }
        _ => Err(Error::internal(format!("unhandled part: {}", part))),
    }
}

fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| Error::out_of_range(format!("Date arithmetic overflow: {}-{}", year, month)))
}
