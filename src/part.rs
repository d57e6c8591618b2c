//! Calendar parts and the per-operation capability table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One named calendar field of a civil value.
///
/// Week parts anchored to a weekday (`WeekMonday` .. `WeekSaturday`) start
/// the week on that day; plain `Week` starts on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateTimePart {
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    DayOfWeek,
    DayOfYear,
    Week,
    WeekMonday,
    WeekTuesday,
    WeekWednesday,
    WeekThursday,
    WeekFriday,
    WeekSaturday,
    IsoWeek,
    Month,
    Quarter,
    Year,
    IsoYear,
}

impl DateTimePart {
    /// The canonical upper-case name, as exchanged at the API boundary.
    pub fn name(&self) -> &'static str {
        match self {
            DateTimePart::Microsecond => "MICROSECOND",
            DateTimePart::Millisecond => "MILLISECOND",
            DateTimePart::Second => "SECOND",
            DateTimePart::Minute => "MINUTE",
            DateTimePart::Hour => "HOUR",
            DateTimePart::Day => "DAY",
            DateTimePart::DayOfWeek => "DAYOFWEEK",
            DateTimePart::DayOfYear => "DAYOFYEAR",
            DateTimePart::Week => "WEEK",
            DateTimePart::WeekMonday => "WEEK_MONDAY",
            DateTimePart::WeekTuesday => "WEEK_TUESDAY",
            DateTimePart::WeekWednesday => "WEEK_WEDNESDAY",
            DateTimePart::WeekThursday => "WEEK_THURSDAY",
            DateTimePart::WeekFriday => "WEEK_FRIDAY",
            DateTimePart::WeekSaturday => "WEEK_SATURDAY",
            DateTimePart::IsoWeek => "ISOWEEK",
            DateTimePart::Month => "MONTH",
            DateTimePart::Quarter => "QUARTER",
            DateTimePart::Year => "YEAR",
            DateTimePart::IsoYear => "ISOYEAR",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<DateTimePart> {
        let upper = name.to_ascii_uppercase();
        ALL_PARTS.iter().copied().find(|p| p.name() == upper)
    }

    /// Sunday-based anchor index (Sunday = 0) for the week parts.
    pub(crate) fn week_anchor(&self) -> Option<u32> {
        match self {
            DateTimePart::Week => Some(0),
            DateTimePart::WeekMonday => Some(1),
            DateTimePart::WeekTuesday => Some(2),
            DateTimePart::WeekWednesday => Some(3),
            DateTimePart::WeekThursday => Some(4),
            DateTimePart::WeekFriday => Some(5),
            DateTimePart::WeekSaturday => Some(6),
            DateTimePart::Microsecond
            | DateTimePart::Millisecond
            | DateTimePart::Second
            | DateTimePart::Minute
            | DateTimePart::Hour
            | DateTimePart::Day
            | DateTimePart::DayOfWeek
            | DateTimePart::DayOfYear
            | DateTimePart::IsoWeek
            | DateTimePart::Month
            | DateTimePart::Quarter
            | DateTimePart::Year
            | DateTimePart::IsoYear => None,
        }
    }

    /// Microseconds per unit for the fixed-duration parts.
    pub(crate) fn fixed_micros(&self) -> Option<i64> {
        match self {
            DateTimePart::Microsecond => Some(1),
            DateTimePart::Millisecond => Some(1_000),
            DateTimePart::Second => Some(1_000_000),
            DateTimePart::Minute => Some(60 * 1_000_000),
            DateTimePart::Hour => Some(3_600 * 1_000_000),
            DateTimePart::Day
            | DateTimePart::DayOfWeek
            | DateTimePart::DayOfYear
            | DateTimePart::Week
            | DateTimePart::WeekMonday
            | DateTimePart::WeekTuesday
            | DateTimePart::WeekWednesday
            | DateTimePart::WeekThursday
            | DateTimePart::WeekFriday
            | DateTimePart::WeekSaturday
            | DateTimePart::IsoWeek
            | DateTimePart::Month
            | DateTimePart::Quarter
            | DateTimePart::Year
            | DateTimePart::IsoYear => None,
        }
    }
}

impl fmt::Display for DateTimePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DateTimePart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DateTimePart::from_name(s)
            .ok_or_else(|| Error::invalid_argument(format!("Invalid calendar part: {}", s)))
    }
}

pub(crate) const ALL_PARTS: &[DateTimePart] = &[
    DateTimePart::Microsecond,
    DateTimePart::Millisecond,
    DateTimePart::Second,
    DateTimePart::Minute,
    DateTimePart::Hour,
    DateTimePart::Day,
    DateTimePart::DayOfWeek,
    DateTimePart::DayOfYear,
    DateTimePart::Week,
    DateTimePart::WeekMonday,
    DateTimePart::WeekTuesday,
    DateTimePart::WeekWednesday,
    DateTimePart::WeekThursday,
    DateTimePart::WeekFriday,
    DateTimePart::WeekSaturday,
    DateTimePart::IsoWeek,
    DateTimePart::Month,
    DateTimePart::Quarter,
    DateTimePart::Year,
    DateTimePart::IsoYear,
];

/// An (operation, value type) pair whose legal parts are fixed by the
/// capability table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartFunction {
    DateExtract,
    DateAdd,
    DateDiff,
    DateTrunc,
    LastDay,
    TimeExtract,
    TimeAdd,
    TimeDiff,
    TimeTrunc,
    DatetimeExtract,
    DatetimeAdd,
    DatetimeDiff,
    DatetimeTrunc,
    TimestampExtract,
    TimestampAdd,
    TimestampDiff,
    TimestampTrunc,
}

const TIME_PARTS: &[DateTimePart] = &[
    DateTimePart::Microsecond,
    DateTimePart::Millisecond,
    DateTimePart::Second,
    DateTimePart::Minute,
    DateTimePart::Hour,
];

const DATE_FIELD_PARTS: &[DateTimePart] = &[
    DateTimePart::Day,
    DateTimePart::DayOfWeek,
    DateTimePart::DayOfYear,
    DateTimePart::Week,
    DateTimePart::WeekMonday,
    DateTimePart::WeekTuesday,
    DateTimePart::WeekWednesday,
    DateTimePart::WeekThursday,
    DateTimePart::WeekFriday,
    DateTimePart::WeekSaturday,
    DateTimePart::IsoWeek,
    DateTimePart::Month,
    DateTimePart::Quarter,
    DateTimePart::Year,
    DateTimePart::IsoYear,
];

const DATE_ADD_PARTS: &[DateTimePart] = &[
    DateTimePart::Day,
    DateTimePart::Week,
    DateTimePart::Month,
    DateTimePart::Quarter,
    DateTimePart::Year,
];

const DATE_BUCKET_PARTS: &[DateTimePart] = &[
    DateTimePart::Day,
    DateTimePart::Week,
    DateTimePart::WeekMonday,
    DateTimePart::WeekTuesday,
    DateTimePart::WeekWednesday,
    DateTimePart::WeekThursday,
    DateTimePart::WeekFriday,
    DateTimePart::WeekSaturday,
    DateTimePart::IsoWeek,
    DateTimePart::Month,
    DateTimePart::Quarter,
    DateTimePart::Year,
    DateTimePart::IsoYear,
];

const LAST_DAY_PARTS: &[DateTimePart] = &[
    DateTimePart::Week,
    DateTimePart::WeekMonday,
    DateTimePart::WeekTuesday,
    DateTimePart::WeekWednesday,
    DateTimePart::WeekThursday,
    DateTimePart::WeekFriday,
    DateTimePart::WeekSaturday,
    DateTimePart::IsoWeek,
    DateTimePart::Month,
    DateTimePart::Quarter,
    DateTimePart::Year,
    DateTimePart::IsoYear,
];

const DATETIME_ADD_PARTS: &[DateTimePart] = &[
    DateTimePart::Microsecond,
    DateTimePart::Millisecond,
    DateTimePart::Second,
    DateTimePart::Minute,
    DateTimePart::Hour,
    DateTimePart::Day,
    DateTimePart::Week,
    DateTimePart::Month,
    DateTimePart::Quarter,
    DateTimePart::Year,
];

const DATETIME_TRUNC_PARTS: &[DateTimePart] = &[
    DateTimePart::Microsecond,
    DateTimePart::Millisecond,
    DateTimePart::Second,
    DateTimePart::Minute,
    DateTimePart::Hour,
    DateTimePart::Day,
    DateTimePart::Week,
    DateTimePart::WeekMonday,
    DateTimePart::WeekTuesday,
    DateTimePart::WeekWednesday,
    DateTimePart::WeekThursday,
    DateTimePart::WeekFriday,
    DateTimePart::WeekSaturday,
    DateTimePart::IsoWeek,
    DateTimePart::Month,
    DateTimePart::Quarter,
    DateTimePart::Year,
    DateTimePart::IsoYear,
];

const TIMESTAMP_DIFF_PARTS: &[DateTimePart] = &[
    DateTimePart::Microsecond,
    DateTimePart::Millisecond,
    DateTimePart::Second,
    DateTimePart::Minute,
    DateTimePart::Hour,
    DateTimePart::Day,
];

/// The parts the given (operation, value type) pair accepts.
pub fn supported_parts(function: PartFunction) -> &'static [DateTimePart] {
    match function {
        PartFunction::DateExtract => DATE_FIELD_PARTS,
        PartFunction::DateAdd => DATE_ADD_PARTS,
        PartFunction::DateDiff => DATE_BUCKET_PARTS,
        PartFunction::DateTrunc => DATE_BUCKET_PARTS,
        PartFunction::LastDay => LAST_DAY_PARTS,
        PartFunction::TimeExtract
        | PartFunction::TimeAdd
        | PartFunction::TimeDiff
        | PartFunction::TimeTrunc => TIME_PARTS,
        PartFunction::DatetimeExtract => ALL_PARTS,
        PartFunction::DatetimeAdd => DATETIME_ADD_PARTS,
        PartFunction::DatetimeDiff | PartFunction::DatetimeTrunc => DATETIME_TRUNC_PARTS,
        PartFunction::TimestampExtract => ALL_PARTS,
        PartFunction::TimestampAdd => DATETIME_ADD_PARTS,
        PartFunction::TimestampDiff => TIMESTAMP_DIFF_PARTS,
        PartFunction::TimestampTrunc => DATETIME_TRUNC_PARTS,
    }
}

/// Checks that `part` is legal for the operation, in one shared place.
pub(crate) fn check_part(
    part: DateTimePart,
    function_name: &str,
    function: PartFunction,
) -> Result<()> {
    if supported_parts(function).contains(&part) {
        Ok(())
    } else {
        Err(Error::unsupported_part(function_name, part))
    }
}

/// Resolves a part name for the operation; unknown names and known-but-
/// unsupported parts are distinct errors.
pub fn resolve_part(
    name: &str,
    function_name: &str,
    function: PartFunction,
) -> Result<DateTimePart> {
    let part =
        DateTimePart::from_name(name).ok_or_else(|| Error::invalid_part(function_name, name))?;
    check_part(part, function_name, function)?;
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_name_round_trip() {
        for part in ALL_PARTS {
            assert_eq!(DateTimePart::from_name(part.name()), Some(*part));
        }
    }

    #[test]
    fn test_part_lookup_is_case_insensitive() {
        assert_eq!(
            DateTimePart::from_name("WeeK_TuEsDaY"),
            Some(DateTimePart::WeekTuesday)
        );
        assert_eq!(DateTimePart::from_name("isoweek"), Some(DateTimePart::IsoWeek));
        assert_eq!(DateTimePart::from_name("MICRO"), None);
    }

    #[test]
    fn test_resolve_part_distinguishes_invalid_from_unsupported() {
        let err = resolve_part("RandomPart", "timestamp_add", PartFunction::TimestampAdd)
            .unwrap_err();
        assert_eq!(
            err,
            Error::invalid_argument("Invalid part in timestamp_add: RandomPart")
        );

        let err = resolve_part("SECOND", "date_trunc", PartFunction::DateTrunc).unwrap_err();
        assert_eq!(
            err,
            Error::invalid_argument("Unsupported part in date_trunc: SECOND")
        );
    }

    #[test]
    fn test_time_functions_reject_date_parts() {
        let err = resolve_part("DAY", "time_add", PartFunction::TimeAdd).unwrap_err();
        assert_eq!(err, Error::invalid_argument("Unsupported part in time_add: DAY"));
    }

    #[test]
    fn test_week_anchor_indexes() {
        assert_eq!(DateTimePart::Week.week_anchor(), Some(0));
        assert_eq!(DateTimePart::WeekSaturday.week_anchor(), Some(6));
        assert_eq!(DateTimePart::IsoWeek.week_anchor(), None);
    }
}
