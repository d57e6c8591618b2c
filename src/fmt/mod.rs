//! String conversion: the strptime-style format grammar in both
//! directions, the canonical default formats, sentinel-substituting safe
//! parses, and the lenient `CAST`-style conversions.

mod cast;
mod format;
mod parse;

pub use cast::{
    cast_to_date_from_string, cast_to_datetime_from_string, cast_to_time_from_string,
    cast_to_timestamp_from_string, datetime_display_string, string_from_timestamp,
    time_display_string, timestamp_from_string,
};

use crate::error::Result;
use crate::timezone::ResolvedTimezone;
use crate::value::{DateValue, DatetimeValue, TimeValue, TimestampValue};

/// Canonical output/input format per type.
pub const DATE_FORMAT: &str = "%F";
pub const TIME_FORMAT: &str = "%H:%M:%E6S";
pub const DATETIME_FORMAT: &str = "%F %H:%M:%E6S";
pub const TIMESTAMP_FORMAT: &str = "%F %H:%M:%E1S %z";

/// Sentinels returned by the safe parse variants.
pub const SENTINEL_DATE: &str = "1970-01-01";
pub const SENTINEL_TIME: &str = "12:34:56.123456";
pub const SENTINEL_DATETIME: &str = "1970-01-01 00:00:00.000000";
pub const SENTINEL_TIMESTAMP: &str = "1970-01-01 00:00:00.0 +0000";

/// Default bound on accepted format strings.
pub const DEFAULT_MAX_FORMAT_WIDTH: usize = 1024;

/// Output-side knobs. `expand_quarter`/`expand_iso_day_of_year` gate the
/// `%Q` and `%J` extensions; when off, those elements pass through
/// literally.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub expand_quarter: bool,
    pub expand_iso_day_of_year: bool,
    pub max_format_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            expand_quarter: false,
            expand_iso_day_of_year: false,
            max_format_width: DEFAULT_MAX_FORMAT_WIDTH,
        }
    }
}

impl FormatOptions {
    /// Both extensions on, as used for canonical timestamp output.
    pub fn expanded() -> Self {
        FormatOptions {
            expand_quarter: true,
            expand_iso_day_of_year: true,
            ..FormatOptions::default()
        }
    }
}

/// Input-side knobs. The default is the strict contract: the whole input
/// must be consumed and parsed fields must form a real calendar value.
/// `strict: false` lets overflowing fields normalize forward and drops the
/// per-type element restrictions.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub strict: bool,
    pub max_format_width: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { strict: true, max_format_width: DEFAULT_MAX_FORMAT_WIDTH }
    }
}

pub fn format_date(format: &str, date: DateValue) -> Result<String> {
    format::format_date_value(format, date, &FormatOptions::default())
}

pub fn format_time(format: &str, time: TimeValue) -> Result<String> {
    format::format_time_value(format, time, &FormatOptions::default())
}

pub fn format_datetime(format: &str, dt: DatetimeValue) -> Result<String> {
    format::format_datetime_value(format, dt, &FormatOptions::default())
}

pub fn format_timestamp(
    format: &str,
    ts: TimestampValue,
    tz: &ResolvedTimezone,
    options: &FormatOptions,
) -> Result<String> {
    format::format_timestamp_value(format, ts, tz, options)
}

/// The canonical `%F` rendering, e.g. `2008-12-25`.
pub fn date_to_string(date: DateValue) -> Result<String> {
    format_date(DATE_FORMAT, date)
}

/// The canonical `%H:%M:%E6S` rendering, e.g. `15:30:00.000000`.
pub fn time_to_string(time: TimeValue) -> Result<String> {
    format_time(TIME_FORMAT, time)
}

/// The canonical `%F %H:%M:%E6S` rendering.
pub fn datetime_to_string(dt: DatetimeValue) -> Result<String> {
    format_datetime(DATETIME_FORMAT, dt)
}

/// The canonical UTC rendering, e.g. `2008-12-25 15:30:00.5 +0000`.
pub fn timestamp_to_string(ts: TimestampValue) -> Result<String> {
    format_timestamp(
        TIMESTAMP_FORMAT,
        ts,
        &ResolvedTimezone::utc(),
        &FormatOptions::expanded(),
    )
}

pub fn parse_date(format: &str, input: &str, options: ParseOptions) -> Result<DateValue> {
    parse::parse_date_value(format, input, options)
}

pub fn parse_time(format: &str, input: &str, options: ParseOptions) -> Result<TimeValue> {
    parse::parse_time_value(format, input, options)
}

pub fn parse_datetime(format: &str, input: &str, options: ParseOptions) -> Result<DatetimeValue> {
    parse::parse_datetime_value(format, input, options)
}

/// Parses an instant. An explicit `%z`/`%Ez`/`%Z`/`%s` in the input wins;
/// otherwise the civil reading is interpreted in `tz`.
pub fn parse_timestamp(
    format: &str,
    input: &str,
    tz: &ResolvedTimezone,
    options: ParseOptions,
) -> Result<TimestampValue> {
    parse::parse_timestamp_value(format, input, tz, options)
}

/// Never fails: any parse error yields 1970-01-01.
pub fn safe_parse_date(format: &str, input: &str) -> DateValue {
    parse_date(format, input, ParseOptions::default()).unwrap_or_else(|_| sentinel_date())
}

/// Never fails: any parse error yields 12:34:56.123456.
pub fn safe_parse_time(format: &str, input: &str) -> TimeValue {
    parse_time(format, input, ParseOptions::default()).unwrap_or_else(|_| sentinel_time())
}

/// Never fails: any parse error yields 1970-01-01 00:00:00.
pub fn safe_parse_datetime(format: &str, input: &str) -> DatetimeValue {
    parse_datetime(format, input, ParseOptions::default()).unwrap_or_else(|_| sentinel_datetime())
}

/// Never fails: any parse or zone error yields the Unix epoch.
pub fn safe_parse_timestamp(format: &str, input: &str, timezone: &str) -> TimestampValue {
    ResolvedTimezone::resolve(timezone)
        .and_then(|tz| parse_timestamp(format, input, &tz, ParseOptions::default()))
        .unwrap_or_else(|_| sentinel_timestamp())
}

fn sentinel_date() -> DateValue {
    DateValue::from_days_since_epoch(0).unwrap_or_else(|_| unreachable!("epoch is in range"))
}

fn sentinel_time() -> TimeValue {
    TimeValue::from_hms_micros(12, 34, 56, 123_456)
        .unwrap_or_else(|_| unreachable!("sentinel time is valid"))
}

fn sentinel_datetime() -> DatetimeValue {
    DatetimeValue::from_ymd_hms(1970, 1, 1, 0, 0, 0)
        .unwrap_or_else(|_| unreachable!("epoch is in range"))
}

fn sentinel_timestamp() -> TimestampValue {
    TimestampValue::from_micros(0).unwrap_or_else(|_| unreachable!("epoch is in range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_strings() {
        let date = DateValue::from_ymd(2008, 12, 25).unwrap();
        assert_eq!(date_to_string(date).unwrap(), "2008-12-25");

        let time = TimeValue::from_hms(15, 30, 0).unwrap();
        assert_eq!(time_to_string(time).unwrap(), "15:30:00.000000");

        let dt = DatetimeValue::from_ymd_hms(2008, 12, 25, 15, 30, 0).unwrap();
        assert_eq!(datetime_to_string(dt).unwrap(), "2008-12-25 15:30:00.000000");

        let ts = TimestampValue::from_micros(1_230_219_000_500_000).unwrap();
        assert_eq!(timestamp_to_string(ts).unwrap(), "2008-12-25 15:30:00.5 +0000");
    }

    #[test]
    fn test_canonical_round_trip() {
        let opts = ParseOptions::default();
        let date = parse_date(DATE_FORMAT, "2008-12-25", opts).unwrap();
        assert_eq!(date, DateValue::from_ymd(2008, 12, 25).unwrap());

        let time = parse_time(TIME_FORMAT, "12:34:56.123456", opts).unwrap();
        assert_eq!(time, sentinel_time());

        let dt = parse_datetime(DATETIME_FORMAT, "1998-10-18 13:45:55.000000", opts).unwrap();
        assert_eq!(datetime_to_string(dt).unwrap(), "1998-10-18 13:45:55.000000");

        let ts = parse_timestamp(
            TIMESTAMP_FORMAT,
            "2008-12-25 15:30:00.5 +0000",
            &ResolvedTimezone::utc(),
            opts,
        )
        .unwrap();
        assert_eq!(timestamp_to_string(ts).unwrap(), "2008-12-25 15:30:00.5 +0000");
    }

    #[test]
    fn test_safe_parse_falls_back_to_sentinels() {
        assert_eq!(
            date_to_string(safe_parse_date("%F", "not a date")).unwrap(),
            SENTINEL_DATE
        );
        assert_eq!(
            time_to_string(safe_parse_time("%I:%M:%S", "invalid_time")).unwrap(),
            SENTINEL_TIME
        );
        assert_eq!(
            datetime_to_string(safe_parse_datetime("invalid_format", "1998-10-18 13:45:55"))
                .unwrap(),
            SENTINEL_DATETIME
        );
        assert_eq!(
            timestamp_to_string(safe_parse_timestamp("%c", "garbage", "America/Los_Angeles"))
                .unwrap(),
            SENTINEL_TIMESTAMP
        );
        // A bad zone is also absorbed.
        assert_eq!(
            timestamp_to_string(safe_parse_timestamp(
                "%c",
                "Thu Dec 25 15:30:00 2008",
                "invalid_zone"
            ))
            .unwrap(),
            SENTINEL_TIMESTAMP
        );
    }

    #[test]
    fn test_safe_parse_passes_valid_input_through() {
        let ts = safe_parse_timestamp("%c", "Thu Dec 25 15:30:00 2008", "America/Los_Angeles");
        assert_eq!(timestamp_to_string(ts).unwrap(), "2008-12-25 23:30:00.0 +0000");
    }
}
