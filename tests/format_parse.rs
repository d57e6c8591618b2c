//! Formatting, parsing and CAST-style conversion through the public API.

use bqdt::fmt::{
    self, FormatOptions, ParseOptions, cast_to_date_from_string, cast_to_datetime_from_string,
    cast_to_time_from_string, cast_to_timestamp_from_string, datetime_display_string,
    string_from_timestamp, time_display_string, timestamp_from_string,
};
use bqdt::{DateValue, DatetimeValue, ResolvedTimezone, TimeValue};

fn utc() -> ResolvedTimezone {
    ResolvedTimezone::utc()
}

fn los_angeles() -> ResolvedTimezone {
    ResolvedTimezone::resolve("America/Los_Angeles").unwrap()
}

#[test]
fn test_format_date_elements() {
    let d = DateValue::from_ymd(2008, 12, 25).unwrap();
    assert_eq!(fmt::format_date("%F", d).unwrap(), "2008-12-25");
    assert_eq!(fmt::format_date("%A %b %e %Y", d).unwrap(), "Thursday Dec 25 2008");
    assert_eq!(fmt::format_date("%j", d).unwrap(), "360");
    assert_eq!(fmt::format_date("%U", d).unwrap(), "51");
    assert_eq!(fmt::format_date("%G-%V", d).unwrap(), "2008-52");
}

#[test]
fn test_format_passes_unknown_text_through() {
    let d = DateValue::from_ymd(2008, 12, 25).unwrap();
    assert_eq!(fmt::format_date("abc %Y def", d).unwrap(), "abc 2008 def");
    assert_eq!(fmt::format_date("%N", d).unwrap(), "%N");
    assert_eq!(fmt::format_date("100%%", d).unwrap(), "100%");
}

#[test]
fn test_format_timestamp_in_zone() {
    let ts = timestamp_from_string("2008-12-25 15:30:00+00", &utc(), true).unwrap();
    let la = los_angeles();
    assert_eq!(
        fmt::format_timestamp("%c", ts, &la, &FormatOptions::default()).unwrap(),
        "Thu Dec 25 07:30:00 2008"
    );
    assert_eq!(
        fmt::format_timestamp("%z %Z", ts, &la, &FormatOptions::default()).unwrap(),
        "-0800 PST"
    );
}

#[test]
fn test_format_quarter_extension_is_gated() {
    let d = DateValue::from_ymd(2008, 12, 25).unwrap();
    assert_eq!(fmt::format_date("%Q", d).unwrap(), "%Q");
    let ts = timestamp_from_string("2008-12-25 15:30:00+00", &utc(), true).unwrap();
    assert_eq!(
        fmt::format_timestamp("%Q %J", ts, &utc(), &FormatOptions::expanded()).unwrap(),
        "4 361"
    );
}

#[test]
fn test_parse_accepts_quarter_and_iso_day_of_year() {
    let opts = ParseOptions::default();
    let d = fmt::parse_date("%Y-%Q", "2023-1", opts).unwrap();
    assert_eq!(fmt::date_to_string(d).unwrap(), "2023-01-01");
    assert!(fmt::parse_date("%Y %J", "2008 361", opts).is_ok());
}

#[test]
fn test_parse_error_wording() {
    let opts = ParseOptions::default();
    let err = fmt::parse_date("%Y-%m-%d", "2008.12-25", opts).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument: Mismatch between format character '-' and string character '.'"
    );

    let err = fmt::parse_date("%Y-%m-%d", "2008-12-25 junk", opts).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument: Failed to parse input string \"2008-12-25 junk\""
    );

    let err = fmt::parse_date("%Y-%m-%d", "2023-02-29", opts).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument: Out-of-range datetime field in parsing function"
    );
}

#[test]
fn test_parse_rejects_foreign_elements_by_type() {
    let opts = ParseOptions::default();
    let err = fmt::parse_date("%H", "12", opts).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument: Invalid format: %H is not allowed for the DATE type"
    );
    assert!(fmt::parse_time("%Y", "2023", opts).is_err());
    assert!(fmt::parse_datetime("%Y %z", "2023 +0800", opts).is_err());
}

#[test]
fn test_lenient_parse_normalizes() {
    let lenient = ParseOptions { strict: false, ..ParseOptions::default() };
    let d = fmt::parse_date("%m/%d/%Y", "02/29/2018", lenient).unwrap();
    assert_eq!(fmt::date_to_string(d).unwrap(), "2018-03-01");
}

#[test]
fn test_parse_twelve_hour_clock() {
    let opts = ParseOptions::default();
    let t = fmt::parse_time("%I:%M %p", "07:30 PM", opts).unwrap();
    assert_eq!(t, TimeValue::from_hms(19, 30, 0).unwrap());
    let t = fmt::parse_time("%I:%M %p", "12:00 AM", opts).unwrap();
    assert_eq!(t, TimeValue::from_hms(0, 0, 0).unwrap());
}

#[test]
fn test_parse_two_digit_year_pivot() {
    let opts = ParseOptions::default();
    let d = fmt::parse_date("%y-%m-%d", "69-01-01", opts).unwrap();
    assert_eq!(fmt::date_to_string(d).unwrap(), "1969-01-01");
    let d = fmt::parse_date("%y-%m-%d", "68-01-01", opts).unwrap();
    assert_eq!(fmt::date_to_string(d).unwrap(), "2068-01-01");
}

#[test]
fn test_parse_timestamp_zone_precedence() {
    let opts = ParseOptions::default();
    let la = los_angeles();

    // Explicit offset beats the default zone.
    let ts = fmt::parse_timestamp("%Y-%m-%d %H:%M:%S %z", "2008-12-25 15:30:00 +0000", &la, opts)
        .unwrap();
    assert_eq!(fmt::timestamp_to_string(ts).unwrap(), "2008-12-25 15:30:00.0 +0000");

    // Named zone in the input beats the default too.
    let ts = fmt::parse_timestamp("%Y-%m-%d %H:%M:%S %Z", "2008-12-25 15:30:00 UTC", &la, opts)
        .unwrap();
    assert_eq!(fmt::timestamp_to_string(ts).unwrap(), "2008-12-25 15:30:00.0 +0000");

    // %s overrides everything else.
    let ts = fmt::parse_timestamp("%s", "1230219000", &la, opts).unwrap();
    assert_eq!(fmt::timestamp_to_string(ts).unwrap(), "2008-12-25 15:30:00.0 +0000");

    // No zone in the input: the default applies.
    let ts = fmt::parse_timestamp("%Y-%m-%d %H:%M:%S", "2008-12-25 15:30:00", &la, opts).unwrap();
    assert_eq!(fmt::timestamp_to_string(ts).unwrap(), "2008-12-25 23:30:00.0 +0000");
}

#[test]
fn test_safe_parse_never_fails() {
    assert_eq!(
        fmt::date_to_string(fmt::safe_parse_date("%F", "nonsense")).unwrap(),
        fmt::SENTINEL_DATE
    );
    assert_eq!(
        fmt::timestamp_to_string(fmt::safe_parse_timestamp("%F", "nonsense", "bad/zone")).unwrap(),
        fmt::SENTINEL_TIMESTAMP
    );
    let d = fmt::safe_parse_date("%F", "2008-12-25");
    assert_eq!(fmt::date_to_string(d).unwrap(), "2008-12-25");
}

#[test]
fn test_cast_literals() {
    assert_eq!(
        cast_to_date_from_string("2018-12-03", None).unwrap(),
        DateValue::from_ymd(2018, 12, 3).unwrap()
    );
    assert_eq!(
        cast_to_datetime_from_string("2018-12-03T07:31:15", None).unwrap(),
        DatetimeValue::from_ymd_hms(2018, 12, 3, 7, 31, 15).unwrap()
    );
    assert_eq!(
        cast_to_time_from_string("07:31:15", None).unwrap(),
        TimeValue::from_hms(7, 31, 15).unwrap()
    );
    let err = cast_to_date_from_string("12/03/2018", None).unwrap_err();
    assert_eq!(err.to_string(), "Invalid argument: Invalid date: '12/03/2018'");
}

#[test]
fn test_cast_with_format_elements() {
    assert_eq!(
        cast_to_date_from_string("18-12-03", Some("YY-MM-DD")).unwrap(),
        DateValue::from_ymd(2018, 12, 3).unwrap()
    );
    assert_eq!(
        cast_to_time_from_string("03:30 P.M.", Some("HH:MI P.M.")).unwrap(),
        TimeValue::from_hms(15, 30, 0).unwrap()
    );
    let err = cast_to_date_from_string("2018-12-03", Some("QQ")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument: Cannot find matched format element at 0"
    );
}

#[test]
fn test_cast_timestamp_with_zone_elements() {
    let la = los_angeles();
    let ts = cast_to_timestamp_from_string(
        "2008-12-25 15:30:00+00:00",
        Some("YYYY-MM-DD HH24:MI:SSTZH:TZM"),
        &la,
    )
    .unwrap();
    assert_eq!(fmt::timestamp_to_string(ts).unwrap(), "2008-12-25 15:30:00.0 +0000");

    let ts =
        cast_to_timestamp_from_string("2008-12-25 15:30:00", Some("YYYY-MM-DD HH24:MI:SS"), &la)
            .unwrap();
    assert_eq!(fmt::timestamp_to_string(ts).unwrap(), "2008-12-25 23:30:00.0 +0000");
}

#[test]
fn test_timestamp_string_round_trip() {
    let utc = utc();
    let la = los_angeles();
    let ts = timestamp_from_string("2023-01-10 12:34:56.7 +1234", &utc, true).unwrap();
    assert_eq!(string_from_timestamp(ts, &utc).unwrap(), "2023-01-10 00:00:56.700+00");
    assert_eq!(string_from_timestamp(ts, &la).unwrap(), "2023-01-09 16:00:56.700-08");
}

#[test]
fn test_display_strings() {
    assert_eq!(
        time_display_string(TimeValue::from_hms_micros(1, 2, 3, 450_000).unwrap()),
        "01:02:03.450"
    );
    assert_eq!(
        datetime_display_string(DatetimeValue::from_ymd_hms(2018, 12, 3, 7, 31, 15).unwrap()),
        "2018-12-03 07:31:15"
    );
}
