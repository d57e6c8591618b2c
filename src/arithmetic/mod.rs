//! Calendar arithmetic: add/sub, conversions between the value types, and
//! the Unix-epoch views.
//!
//! Extraction, differencing and truncation live in the submodules. All
//! operations are pure; part legality goes through the capability table in
//! `part` so every function reports illegal parts the same way.

mod diff;
mod extract;
mod trunc;

pub use diff::{date_diff, datetime_diff, time_diff, timestamp_diff};
pub use extract::{date_extract, datetime_extract, time_extract, timestamp_extract};
pub use trunc::{
    date_trunc, datetime_trunc, last_day, last_day_of_datetime, time_trunc, timestamp_trunc,
};

use chrono::{Duration, Months, NaiveDate, NaiveDateTime};

use crate::bounds::{self, MICROS_PER_DAY, MICROS_PER_MILLI, MICROS_PER_SECOND};
use crate::error::{Error, Result};
use crate::part::{check_part, DateTimePart, PartFunction};
use crate::timezone::ResolvedTimezone;
use crate::value::{DateValue, DatetimeValue, IntervalValue, TimeValue, TimestampValue};

/// Adds whole months with month-end clamping: 2024-01-31 + 1 MONTH is
/// 2024-02-29, not an error and not March.
fn add_months_clamped(date: NaiveDate, months: i64) -> Result<NaiveDate> {
    let overflow = || Error::out_of_range(format!("Date arithmetic overflow: {}", date));
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| overflow())?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(overflow)
}

fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| Error::out_of_range(format!("Date arithmetic overflow: {}", date)))
}

pub(crate) fn add_interval_to_civil(
    dt: NaiveDateTime,
    interval: IntervalValue,
) -> Result<NaiveDateTime> {
    let mut date = dt.date();
    if interval.months != 0 {
        date = add_months_clamped(date, interval.months as i64)?;
    }
    if interval.days != 0 {
        date = add_days(date, interval.days as i64)?;
    }
    let shifted = NaiveDateTime::new(date, dt.time());
    if interval.micros != 0 {
        shifted
            .checked_add_signed(Duration::microseconds(interval.micros))
            .ok_or_else(|| Error::out_of_range(format!("Datetime arithmetic overflow: {}", dt)))
    } else {
        Ok(shifted)
    }
}

/// DATE_ADD: DAY/WEEK/MONTH/QUARTER/YEAR only; month-sized parts clamp the
/// day-of-month.
pub fn date_add(date: DateValue, amount: i64, part: DateTimePart) -> Result<DateValue> {
    check_part(part, "date_add", PartFunction::DateAdd)?;
    let interval = IntervalValue::from_part(amount, part)?;
    let mut civil = date.civil();
    if interval.months != 0 {
        civil = add_months_clamped(civil, interval.months as i64)?;
    }
    if interval.days != 0 {
        civil = add_days(civil, interval.days as i64)?;
    }
    DateValue::from_civil(civil)
}

pub fn date_sub(date: DateValue, amount: i64, part: DateTimePart) -> Result<DateValue> {
    check_part(part, "date_sub", PartFunction::DateAdd)?;
    let amount = amount
        .checked_neg()
        .ok_or_else(|| Error::out_of_range(format!("Interval overflow: {}", amount)))?;
    let interval = IntervalValue::from_part(amount, part)?;
    let mut civil = date.civil();
    if interval.months != 0 {
        civil = add_months_clamped(civil, interval.months as i64)?;
    }
    if interval.days != 0 {
        civil = add_days(civil, interval.days as i64)?;
    }
    DateValue::from_civil(civil)
}

/// TIME_ADD: the result wraps modulo 24 hours, so it never ranges.
pub fn time_add(time: TimeValue, amount: i64, part: DateTimePart) -> Result<TimeValue> {
    check_part(part, "time_add", PartFunction::TimeAdd)?;
    let unit = part
        .fixed_micros()
        .ok_or_else(|| Error::internal(format!("time part without a duration: {}", part)))?;
    // Wrapping semantics make overflow of amount*unit irrelevant modulo a day.
    let shift = (amount % (MICROS_PER_DAY / unit)) * unit;
    let wrapped = (time.micros_since_midnight() + shift).rem_euclid(MICROS_PER_DAY);
    TimeValue::from_micros_since_midnight(wrapped)
}

pub fn time_sub(time: TimeValue, amount: i64, part: DateTimePart) -> Result<TimeValue> {
    check_part(part, "time_sub", PartFunction::TimeAdd)?;
    let unit = part
        .fixed_micros()
        .ok_or_else(|| Error::internal(format!("time part without a duration: {}", part)))?;
    let shift = (amount % (MICROS_PER_DAY / unit)) * unit;
    let wrapped = (time.micros_since_midnight() - shift).rem_euclid(MICROS_PER_DAY);
    TimeValue::from_micros_since_midnight(wrapped)
}

/// DATETIME_ADD: zone-less civil arithmetic for every supported part.
pub fn datetime_add(dt: DatetimeValue, amount: i64, part: DateTimePart) -> Result<DatetimeValue> {
    check_part(part, "datetime_add", PartFunction::DatetimeAdd)?;
    let interval = IntervalValue::from_part(amount, part)?;
    DatetimeValue::from_civil(add_interval_to_civil(dt.civil(), interval)?)
}

pub fn datetime_sub(dt: DatetimeValue, amount: i64, part: DateTimePart) -> Result<DatetimeValue> {
    check_part(part, "datetime_sub", PartFunction::DatetimeAdd)?;
    let interval = IntervalValue::from_part(amount, part)?.negated()?;
    DatetimeValue::from_civil(add_interval_to_civil(dt.civil(), interval)?)
}

/// TIMESTAMP_ADD: MICROSECOND..HOUR shift the absolute instant;
/// DAY/WEEK/MONTH/QUARTER/YEAR move through the civil calendar of the
/// supplied zone, so a DAY across a DST transition keeps the wall clock.
pub fn timestamp_add(
    ts: TimestampValue,
    amount: i64,
    part: DateTimePart,
    tz: &ResolvedTimezone,
) -> Result<TimestampValue> {
    timestamp_shift(ts, amount, part, tz, "timestamp_add")
}

pub fn timestamp_sub(
    ts: TimestampValue,
    amount: i64,
    part: DateTimePart,
    tz: &ResolvedTimezone,
) -> Result<TimestampValue> {
    let amount = amount
        .checked_neg()
        .ok_or_else(|| Error::out_of_range(format!("Interval overflow: {}", amount)))?;
    timestamp_shift(ts, amount, part, tz, "timestamp_sub")
}

fn timestamp_shift(
    ts: TimestampValue,
    amount: i64,
    part: DateTimePart,
    tz: &ResolvedTimezone,
    function_name: &str,
) -> Result<TimestampValue> {
    check_part(part, function_name, PartFunction::TimestampAdd)?;
    if let Some(unit) = part.fixed_micros() {
        let shift = amount
            .checked_mul(unit)
            .ok_or_else(|| Error::out_of_range(format!("Interval overflow: {}", amount)))?;
        let micros = ts
            .micros()
            .checked_add(shift)
            .ok_or_else(|| Error::out_of_range("Timestamp arithmetic overflow"))?;
        return TimestampValue::from_micros(micros);
    }
    let interval = IntervalValue::from_part(amount, part)?;
    let civil = tz.civil_from_instant(ts);
    let shifted = bounds::validate_datetime(add_interval_to_civil(civil, interval)?)?;
    tz.instant_from_civil(shifted)
}

// Conversions between the value types.

/// The date at midnight, as a civil datetime.
pub fn datetime_from_date(date: DateValue) -> Result<DatetimeValue> {
    let time = TimeValue::from_hms(0, 0, 0)?;
    Ok(DatetimeValue::new(date, time))
}

pub fn date_from_datetime(dt: DatetimeValue) -> DateValue {
    dt.date()
}

pub fn time_from_datetime(dt: DatetimeValue) -> TimeValue {
    dt.time()
}

/// Midnight of the date in the given zone, as an absolute instant.
pub fn timestamp_from_date(date: DateValue, tz: &ResolvedTimezone) -> Result<TimestampValue> {
    timestamp_from_datetime(datetime_from_date(date)?, tz)
}

pub fn timestamp_from_datetime(
    dt: DatetimeValue,
    tz: &ResolvedTimezone,
) -> Result<TimestampValue> {
    tz.instant_from_civil(dt.civil())
}

pub fn datetime_from_timestamp(
    ts: TimestampValue,
    tz: &ResolvedTimezone,
) -> Result<DatetimeValue> {
    DatetimeValue::from_civil(tz.civil_from_instant(ts))
}

pub fn date_from_timestamp(ts: TimestampValue, tz: &ResolvedTimezone) -> Result<DateValue> {
    Ok(datetime_from_timestamp(ts, tz)?.date())
}

pub fn time_from_timestamp(ts: TimestampValue, tz: &ResolvedTimezone) -> Result<TimeValue> {
    Ok(datetime_from_timestamp(ts, tz)?.time())
}

// The Unix-epoch integer views.

pub fn unix_date(date: DateValue) -> i64 {
    date.days_since_epoch() as i64
}

pub fn date_from_unix_date(days: i64) -> Result<DateValue> {
    DateValue::from_days_since_epoch(days)
}

pub fn timestamp_from_unix_micros(micros: i64) -> Result<TimestampValue> {
    TimestampValue::from_micros(micros)
}

pub fn timestamp_from_unix_millis(millis: i64) -> Result<TimestampValue> {
    TimestampValue::from_micros(bounds::scaled_multiply(millis, MICROS_PER_MILLI)?)
}

pub fn timestamp_from_unix_seconds(seconds: i64) -> Result<TimestampValue> {
    TimestampValue::from_micros(bounds::scaled_multiply(seconds, MICROS_PER_SECOND)?)
}

pub fn unix_micros(ts: TimestampValue) -> i64 {
    ts.micros()
}

/// Milliseconds since the epoch, truncated toward negative infinity so the
/// same instant always maps to the same millisecond.
pub fn unix_millis(ts: TimestampValue) -> i64 {
    ts.micros().div_euclid(MICROS_PER_MILLI)
}

pub fn unix_seconds(ts: TimestampValue) -> i64 {
    ts.micros().div_euclid(MICROS_PER_SECOND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i64, m: i64, day: i64) -> DateValue {
        DateValue::from_ymd(y, m, day).unwrap()
    }

    fn dt(y: i64, mo: i64, da: i64, h: i64, mi: i64, s: i64) -> DatetimeValue {
        DatetimeValue::from_ymd_hms(y, mo, da, h, mi, s).unwrap()
    }

    #[test]
    fn test_date_add_clamps_month_end() {
        assert_eq!(date_add(d(2024, 1, 31), 1, DateTimePart::Month).unwrap(), d(2024, 2, 29));
        assert_eq!(date_add(d(2023, 1, 31), 1, DateTimePart::Month).unwrap(), d(2023, 2, 28));
        assert_eq!(date_add(d(2024, 2, 29), 1, DateTimePart::Year).unwrap(), d(2025, 2, 28));
        assert_eq!(date_add(d(2023, 1, 10), 2, DateTimePart::Quarter).unwrap(), d(2023, 7, 10));
    }

    #[test]
    fn test_date_add_day_and_week() {
        assert_eq!(date_add(d(2023, 1, 10), 5, DateTimePart::Day).unwrap(), d(2023, 1, 15));
        assert_eq!(date_add(d(2023, 1, 10), 2, DateTimePart::Week).unwrap(), d(2023, 1, 24));
        assert_eq!(date_sub(d(2023, 1, 10), 10, DateTimePart::Day).unwrap(), d(2022, 12, 31));
    }

    #[test]
    fn test_date_add_rejects_time_parts() {
        let err = date_add(d(2023, 1, 10), 1, DateTimePart::Hour).unwrap_err();
        assert_eq!(err, Error::invalid_argument("Unsupported part in date_add: HOUR"));
    }

    #[test]
    fn test_date_add_out_of_range() {
        assert!(matches!(
            date_add(d(9999, 12, 31), 1, DateTimePart::Day),
            Err(Error::OutOfRange(_))
        ));
        assert!(matches!(
            date_sub(d(1, 1, 1), 1, DateTimePart::Day),
            Err(Error::OutOfRange(_))
        ));
    }

    #[test]
    fn test_time_add_wraps() {
        let t = TimeValue::from_hms(23, 0, 0).unwrap();
        assert_eq!(
            time_add(t, 2, DateTimePart::Hour).unwrap(),
            TimeValue::from_hms(1, 0, 0).unwrap()
        );
        assert_eq!(
            time_sub(TimeValue::from_hms(0, 10, 0).unwrap(), 20, DateTimePart::Minute).unwrap(),
            TimeValue::from_hms(23, 50, 0).unwrap()
        );
        // Huge amounts reduce modulo a day instead of overflowing.
        assert_eq!(
            time_add(t, i64::MAX, DateTimePart::Microsecond).unwrap(),
            time_add(t, i64::MAX % crate::bounds::MICROS_PER_DAY, DateTimePart::Microsecond)
                .unwrap()
        );
    }

    #[test]
    fn test_datetime_add_mixed_parts() {
        let base = dt(2023, 1, 31, 12, 30, 0);
        assert_eq!(
            datetime_add(base, 1, DateTimePart::Month).unwrap(),
            dt(2023, 2, 28, 12, 30, 0)
        );
        assert_eq!(
            datetime_add(base, 36, DateTimePart::Hour).unwrap(),
            dt(2023, 2, 2, 0, 30, 0)
        );
        assert_eq!(
            datetime_sub(base, 1, DateTimePart::Day).unwrap(),
            dt(2023, 1, 30, 12, 30, 0)
        );
    }

    #[test]
    fn test_timestamp_add_hour_is_absolute() {
        let tz = ResolvedTimezone::resolve("America/Los_Angeles").unwrap();
        // 2023-03-12 01:30 PST, half an hour before the spring-forward gap.
        let ts = timestamp_from_datetime(dt(2023, 3, 12, 1, 30, 0), &tz).unwrap();
        let plus = timestamp_add(ts, 1, DateTimePart::Hour, &tz).unwrap();
        assert_eq!(plus.micros() - ts.micros(), crate::bounds::MICROS_PER_HOUR);
        // The wall clock jumps from 01:30 to 03:30.
        assert_eq!(datetime_from_timestamp(plus, &tz).unwrap(), dt(2023, 3, 12, 3, 30, 0));
    }

    #[test]
    fn test_timestamp_add_day_keeps_wall_clock_across_dst() {
        let tz = ResolvedTimezone::resolve("America/Los_Angeles").unwrap();
        let ts = timestamp_from_datetime(dt(2023, 3, 11, 12, 0, 0), &tz).unwrap();
        let next = timestamp_add(ts, 1, DateTimePart::Day, &tz).unwrap();
        assert_eq!(datetime_from_timestamp(next, &tz).unwrap(), dt(2023, 3, 12, 12, 0, 0));
        // Spring forward: the civil day lasted 23 absolute hours.
        assert_eq!(next.micros() - ts.micros(), 23 * crate::bounds::MICROS_PER_HOUR);
    }

    #[test]
    fn test_timestamp_add_month_in_utc() {
        let utc = ResolvedTimezone::utc();
        let ts = timestamp_from_datetime(dt(2024, 1, 31, 10, 0, 0), &utc).unwrap();
        let shifted = timestamp_add(ts, 1, DateTimePart::Month, &utc).unwrap();
        assert_eq!(
            datetime_from_timestamp(shifted, &utc).unwrap(),
            dt(2024, 2, 29, 10, 0, 0)
        );
    }

    #[test]
    fn test_conversions_between_types() {
        let date = d(2023, 1, 10);
        let as_dt = datetime_from_date(date).unwrap();
        assert_eq!(as_dt, dt(2023, 1, 10, 0, 0, 0));
        assert_eq!(date_from_datetime(as_dt), date);

        let tz = ResolvedTimezone::resolve("America/Los_Angeles").unwrap();
        let ts = timestamp_from_date(date, &tz).unwrap();
        assert_eq!(date_from_timestamp(ts, &tz).unwrap(), date);
        // Same instant reads as the previous UTC evening.
        assert_eq!(
            datetime_from_timestamp(ts, &ResolvedTimezone::utc()).unwrap(),
            dt(2023, 1, 10, 8, 0, 0)
        );
    }

    #[test]
    fn test_unix_views() {
        assert_eq!(unix_date(d(1970, 1, 1)), 0);
        assert_eq!(unix_date(d(2023, 1, 10)), 19_367);
        assert_eq!(date_from_unix_date(19_367).unwrap(), d(2023, 1, 10));

        let ts = timestamp_from_unix_seconds(1_673_308_800).unwrap();
        assert_eq!(unix_micros(ts), 1_673_308_800_000_000);
        assert_eq!(unix_millis(ts), 1_673_308_800_000);
        assert_eq!(unix_seconds(ts), 1_673_308_800);
        assert_eq!(ts, timestamp_from_unix_millis(1_673_308_800_000).unwrap());

        // Negative sub-second instants floor toward the earlier second.
        let before_epoch = timestamp_from_unix_micros(-1).unwrap();
        assert_eq!(unix_seconds(before_epoch), -1);
        assert_eq!(unix_millis(before_epoch), -1);
    }

    #[test]
    fn test_unix_scale_overflow() {
        assert!(matches!(
            timestamp_from_unix_seconds(i64::MAX / 2),
            Err(Error::OutOfRange(_))
        ));
    }
}
