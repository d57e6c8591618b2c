//! The civil-time value model: DATE, TIME, DATETIME, TIMESTAMP and the
//! calendar interval.
//!
//! All four value types are small, copyable and immutable; they validate on
//! construction and stay valid for their lifetime. DATETIME is a civil
//! (zone-less) reading; TIMESTAMP is an absolute instant with no calendar
//! attached until it is combined with a timezone.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::bounds::{
    self, MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MILLI, MICROS_PER_MINUTE, MICROS_PER_SECOND,
};
use crate::error::{Error, Result};
use crate::part::DateTimePart;

/// A calendar date, observable as a signed day count since 1970-01-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateValue(NaiveDate);

impl DateValue {
    pub fn from_ymd(year: i64, month: i64, day: i64) -> Result<Self> {
        let year = i32::try_from(year)
            .map_err(|_| Error::invalid_argument(format!("Invalid year: {}", year)))?;
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_argument(format!("Invalid month: {}", month)));
        }
        if !(1..=31).contains(&day) {
            return Err(Error::invalid_argument(format!("Invalid day: {}", day)));
        }
        let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
            Error::invalid_argument(format!("Invalid date: {:04}-{:02}-{:02}", year, month, day))
        })?;
        Ok(DateValue(bounds::validate_date(date)?))
    }

    pub fn from_days_since_epoch(days: i64) -> Result<Self> {
        Ok(DateValue(bounds::date_from_epoch_days(days)?))
    }

    pub(crate) fn from_civil(date: NaiveDate) -> Result<Self> {
        Ok(DateValue(bounds::validate_date(date)?))
    }

    pub fn days_since_epoch(&self) -> i32 {
        bounds::epoch_days(self.0)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub(crate) fn civil(&self) -> NaiveDate {
        self.0
    }
}

/// A wall-clock time of day at microsecond granularity, with no date or
/// zone association and no leap-second representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeValue(NaiveTime);

impl TimeValue {
    pub fn from_hms(hour: i64, minute: i64, second: i64) -> Result<Self> {
        Self::from_hms_micros(hour, minute, second, 0)
    }

    pub fn from_hms_micros(hour: i64, minute: i64, second: i64, micros: i64) -> Result<Self> {
        if !(0..=23).contains(&hour) {
            return Err(Error::invalid_argument(format!("Invalid hour: {}", hour)));
        }
        if !(0..=59).contains(&minute) {
            return Err(Error::invalid_argument(format!("Invalid minute: {}", minute)));
        }
        if !(0..=59).contains(&second) {
            return Err(Error::invalid_argument(format!("Invalid second: {}", second)));
        }
        if !(0..MICROS_PER_SECOND).contains(&micros) {
            return Err(Error::invalid_argument(format!(
                "Invalid microsecond: {}",
                micros
            )));
        }
        let time = NaiveTime::from_hms_micro_opt(
            hour as u32,
            minute as u32,
            second as u32,
            micros as u32,
        )
        .ok_or_else(|| Error::internal("validated time components rejected"))?;
        Ok(TimeValue(time))
    }

    /// Builds a time from a microsecond offset into the day, 0 ..< 86_400e6.
    pub fn from_micros_since_midnight(micros: i64) -> Result<Self> {
        if !(0..MICROS_PER_DAY).contains(&micros) {
            return Err(Error::invalid_argument(format!(
                "Invalid time-of-day microseconds: {}",
                micros
            )));
        }
        let secs = (micros / MICROS_PER_SECOND) as u32;
        let sub = (micros % MICROS_PER_SECOND) as u32;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, sub * 1_000)
            .ok_or_else(|| Error::internal("validated time-of-day rejected"))?;
        Ok(TimeValue(time))
    }

    pub fn micros_since_midnight(&self) -> i64 {
        self.0.num_seconds_from_midnight() as i64 * MICROS_PER_SECOND
            + (self.0.nanosecond() / 1_000) as i64
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    pub fn microsecond(&self) -> u32 {
        self.0.nanosecond() / 1_000
    }

    pub(crate) fn from_civil(time: NaiveTime) -> Result<Self> {
        if time.nanosecond() >= 1_000_000_000 {
            return Err(Error::invalid_argument("Leap seconds are not representable"));
        }
        if time.nanosecond() % 1_000 != 0 {
            return Err(Error::invalid_argument(format!(
                "Time has sub-microsecond precision: {}",
                time
            )));
        }
        Ok(TimeValue(time))
    }

    pub(crate) fn civil(&self) -> NaiveTime {
        self.0
    }
}

/// A civil date and time of day combined; no zone, no DST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatetimeValue(NaiveDateTime);

impl DatetimeValue {
    pub fn new(date: DateValue, time: TimeValue) -> Self {
        DatetimeValue(NaiveDateTime::new(date.civil(), time.civil()))
    }

    pub fn from_ymd_hms(
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
        minute: i64,
        second: i64,
    ) -> Result<Self> {
        let date = DateValue::from_ymd(year, month, day)?;
        let time = TimeValue::from_hms(hour, minute, second)?;
        Ok(Self::new(date, time))
    }

    pub fn date(&self) -> DateValue {
        DateValue(self.0.date())
    }

    pub fn time(&self) -> TimeValue {
        TimeValue(self.0.time())
    }

    /// Civil microseconds since 1970-01-01 00:00:00, ignoring any zone.
    pub fn micros_since_epoch(&self) -> i64 {
        self.date().days_since_epoch() as i64 * MICROS_PER_DAY
            + self.time().micros_since_midnight()
    }

    pub(crate) fn from_civil(dt: NaiveDateTime) -> Result<Self> {
        Ok(DatetimeValue(bounds::validate_datetime(dt)?))
    }

    pub(crate) fn civil(&self) -> NaiveDateTime {
        self.0
    }
}

/// An absolute instant: signed microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimestampValue(i64);

impl TimestampValue {
    pub fn from_micros(micros: i64) -> Result<Self> {
        Ok(TimestampValue(bounds::validate_timestamp(micros)?))
    }

    pub fn micros(&self) -> i64 {
        self.0
    }

    /// The instant as a UTC civil reading.
    pub(crate) fn utc_civil(&self) -> NaiveDateTime {
        // In range by construction; the timestamp bounds are inside
        // chrono's representable range.
        DateTime::<Utc>::from_timestamp_micros(self.0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_else(|| unreachable!("validated timestamp fits chrono's range"))
    }
}

/// A calendar interval: the operand of add/sub, kept as a (months, days,
/// microseconds) triple so month and day arithmetic stays calendar-aware
/// instead of collapsing to a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalValue {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

impl IntervalValue {
    pub fn new(months: i32, days: i32, micros: i64) -> Self {
        Self { months, days, micros }
    }

    /// Builds the interval `amount * part`. MICROSECOND..HOUR scale into the
    /// microsecond field, DAY/WEEK into days, MONTH/QUARTER/YEAR into months.
    pub fn from_part(amount: i64, part: DateTimePart) -> Result<Self> {
        let int_months = |m: i64| -> Result<IntervalValue> {
            let months = i32::try_from(m)
                .map_err(|_| Error::out_of_range(format!("Interval months overflow: {}", m)))?;
            Ok(IntervalValue::new(months, 0, 0))
        };
        let int_days = |d: i64| -> Result<IntervalValue> {
            let days = i32::try_from(d)
                .map_err(|_| Error::out_of_range(format!("Interval days overflow: {}", d)))?;
            Ok(IntervalValue::new(0, days, 0))
        };
        let int_micros = |unit: i64| -> Result<IntervalValue> {
            let micros = amount
                .checked_mul(unit)
                .ok_or_else(|| Error::out_of_range(format!("Interval overflow: {}", amount)))?;
            Ok(IntervalValue::new(0, 0, micros))
        };
        match part {
            DateTimePart::Microsecond => int_micros(1),
            DateTimePart::Millisecond => int_micros(MICROS_PER_MILLI),
            DateTimePart::Second => int_micros(MICROS_PER_SECOND),
            DateTimePart::Minute => int_micros(MICROS_PER_MINUTE),
            DateTimePart::Hour => int_micros(MICROS_PER_HOUR),
            DateTimePart::Day => int_days(amount),
            DateTimePart::Week => {
                int_days(amount.checked_mul(7).ok_or_else(|| {
                    Error::out_of_range(format!("Interval days overflow: {}", amount))
                })?)
            }
            DateTimePart::Month => int_months(amount),
            DateTimePart::Quarter => {
                int_months(amount.checked_mul(3).ok_or_else(|| {
                    Error::out_of_range(format!("Interval months overflow: {}", amount))
                })?)
            }
            DateTimePart::Year => {
                int_months(amount.checked_mul(12).ok_or_else(|| {
                    Error::out_of_range(format!("Interval months overflow: {}", amount))
                })?)
            }
            DateTimePart::DayOfWeek
            | DateTimePart::DayOfYear
            | DateTimePart::WeekMonday
            | DateTimePart::WeekTuesday
            | DateTimePart::WeekWednesday
            | DateTimePart::WeekThursday
            | DateTimePart::WeekFriday
            | DateTimePart::WeekSaturday
            | DateTimePart::IsoWeek
            | DateTimePart::IsoYear => Err(Error::invalid_argument(format!(
                "Cannot build an interval from part {}",
                part
            ))),
        }
    }

    pub fn negated(&self) -> Result<Self> {
        let months = self
            .months
            .checked_neg()
            .ok_or_else(|| Error::out_of_range("Interval months overflow"))?;
        let days = self
            .days
            .checked_neg()
            .ok_or_else(|| Error::out_of_range("Interval days overflow"))?;
        let micros = self
            .micros
            .checked_neg()
            .ok_or_else(|| Error::out_of_range("Interval microseconds overflow"))?;
        Ok(IntervalValue::new(months, days, micros))
    }
}
