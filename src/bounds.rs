//! Representable ranges and checked scale conversions.
//!
//! Every constructor and every arithmetic result is validated here before it
//! is returned to the caller. The bounds are the BigQuery ones: years 1 to
//! 9999, with the timestamp range expressed in microseconds since the Unix
//! epoch so the value stays representable in a 64-bit wire encoding.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// 0001-01-01 as days since 1970-01-01.
pub const DATE_MIN_DAYS: i32 = -719_162;
/// 9999-12-31 as days since 1970-01-01.
pub const DATE_MAX_DAYS: i32 = 2_932_896;

/// 0001-01-01 00:00:00 UTC in microseconds since the Unix epoch.
pub const TIMESTAMP_MIN_MICROS: i64 = -62_135_596_800_000_000;
/// 9999-12-31 23:59:59.999999 UTC in microseconds since the Unix epoch.
pub const TIMESTAMP_MAX_MICROS: i64 = 253_402_300_799_999_999;

pub const MICROS_PER_MILLI: i64 = 1_000;
pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
pub const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;
pub const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01.
pub(crate) const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    chrono::Datelike::num_days_from_ce(&date) - UNIX_EPOCH_DAYS_FROM_CE
}

pub(crate) fn date_from_epoch_days(days: i64) -> Result<NaiveDate> {
    if days < DATE_MIN_DAYS as i64 || days > DATE_MAX_DAYS as i64 {
        return Err(Error::out_of_range(format!("Date value out of range: {}", days)));
    }
    NaiveDate::from_num_days_from_ce_opt(days as i32 + UNIX_EPOCH_DAYS_FROM_CE)
        .ok_or_else(|| Error::internal(format!("in-range day count rejected: {}", days)))
}

/// Bounds-checks a date against years 1..=9999.
pub fn validate_date(date: NaiveDate) -> Result<NaiveDate> {
    let days = epoch_days(date);
    if (DATE_MIN_DAYS..=DATE_MAX_DAYS).contains(&days) {
        Ok(date)
    } else {
        Err(Error::out_of_range(format!("Date value out of range: {}", date)))
    }
}

/// Bounds-checks a civil datetime; the embedded date carries the range and
/// the time of day is unconstrained beyond its own field ranges.
pub fn validate_datetime(dt: NaiveDateTime) -> Result<NaiveDateTime> {
    validate_date(dt.date())?;
    if dt.time().nanosecond() % 1_000 != 0 {
        return Err(Error::invalid_argument(format!(
            "Datetime has sub-microsecond precision: {}",
            dt
        )));
    }
    Ok(dt)
}

/// Bounds-checks an absolute instant in microseconds since the epoch.
pub fn validate_timestamp(micros: i64) -> Result<i64> {
    if (TIMESTAMP_MIN_MICROS..=TIMESTAMP_MAX_MICROS).contains(&micros) {
        Ok(micros)
    } else {
        Err(Error::out_of_range(format!(
            "Timestamp value out of range: {} microseconds",
            micros
        )))
    }
}

/// Checked multiply for fixed-point scale conversion (seconds or
/// milliseconds to microseconds). Overflow is reported as a distinct
/// out-of-range error rather than wrapping.
pub fn scaled_multiply(value: i64, scale: i64) -> Result<i64> {
    debug_assert!(scale == 1 || scale == MICROS_PER_MILLI || scale == MICROS_PER_SECOND);
    value
        .checked_mul(scale)
        .ok_or_else(|| Error::out_of_range(format!("Overflow scaling {} by {}", value, scale)))
}
