//! `CAST`-style string conversion: canonical literal forms, the
//! `YYYY-MM-DD`-family format elements, and the trimmed display strings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};
use crate::fmt::DEFAULT_MAX_FORMAT_WIDTH;
use crate::timezone::ResolvedTimezone;
use crate::value::{DateValue, DatetimeValue, TimeValue, TimestampValue};

/// CAST(string AS DATE). Without a format the canonical `YYYY-[M]M-[D]D`
/// literal is expected.
pub fn cast_to_date_from_string(input: &str, format: Option<&str>) -> Result<DateValue> {
    let bad = || Error::invalid_argument(format!("Invalid date: '{}'", input));
    let date = match format {
        None => parse_date_literal(&mut Scanner::new(input)).ok_or_else(bad)?,
        Some(format) => {
            let elements = tokenize_cast_format(format, CastTarget::Date)?;
            let fields = match_cast_elements(&elements, input).ok_or_else(bad)?;
            fields.to_date().ok_or_else(bad)?
        }
    };
    DateValue::from_civil(date)
}

/// CAST(string AS TIME). Canonical literal: `[H]H:[M]M:[S]S[.F...]`.
pub fn cast_to_time_from_string(input: &str, format: Option<&str>) -> Result<TimeValue> {
    let bad = || Error::invalid_argument(format!("Invalid time string \"{}\"", input));
    let time = match format {
        None => parse_time_literal(&mut Scanner::new(input)).ok_or_else(bad)?,
        Some(format) => {
            let elements = tokenize_cast_format(format, CastTarget::Time)?;
            let fields = match_cast_elements(&elements, input).ok_or_else(bad)?;
            fields.to_time().ok_or_else(bad)?
        }
    };
    TimeValue::from_civil(time)
}

/// CAST(string AS DATETIME). Canonical literal: date, separator space or
/// `T`, optional time of day.
pub fn cast_to_datetime_from_string(input: &str, format: Option<&str>) -> Result<DatetimeValue> {
    let bad = || Error::invalid_argument(format!("Invalid datetime string \"{}\"", input));
    let civil = match format {
        None => parse_datetime_literal(&mut Scanner::new(input)).ok_or_else(bad)?,
        Some(format) => {
            let elements = tokenize_cast_format(format, CastTarget::Datetime)?;
            let fields = match_cast_elements(&elements, input).ok_or_else(bad)?;
            fields.to_datetime().ok_or_else(bad)?
        }
    };
    DatetimeValue::from_civil(civil)
}

/// CAST(string AS TIMESTAMP) with a format: the cast element set plus
/// `TZH`/`TZM`. Without a format the canonical timestamp literal applies.
pub fn cast_to_timestamp_from_string(
    input: &str,
    format: Option<&str>,
    default_timezone: &ResolvedTimezone,
) -> Result<TimestampValue> {
    let Some(format) = format else {
        return timestamp_from_string(input, default_timezone, true);
    };
    let bad = || Error::invalid_argument(format!("Invalid timestamp: '{}'", input));
    let elements = tokenize_cast_format(format, CastTarget::Timestamp)?;
    let fields = match_cast_elements(&elements, input).ok_or_else(bad)?;
    let civil = fields.to_datetime().ok_or_else(bad)?;
    match fields.offset_seconds().ok_or_else(bad)? {
        Some(secs) => {
            let offset = chrono::FixedOffset::east_opt(secs).ok_or_else(bad)?;
            ResolvedTimezone::Fixed(offset).instant_from_civil(civil)
        }
        None => default_timezone.instant_from_civil(civil),
    }
}

/// CAST(string AS TIMESTAMP): the datetime literal plus an optional
/// trailing zone (offset or IANA name). Without an in-string zone the
/// supplied default applies.
pub fn timestamp_from_string(
    input: &str,
    default_timezone: &ResolvedTimezone,
    allow_timezone_in_string: bool,
) -> Result<TimestampValue> {
    let bad = || Error::invalid_argument(format!("Invalid timestamp: '{}'", input));
    let mut scanner = Scanner::new(input);
    let civil = parse_datetime_literal_prefix(&mut scanner).ok_or_else(bad)?;
    scanner.skip_spaces();
    let zone_text = scanner.rest();
    if zone_text.is_empty() {
        return default_timezone.instant_from_civil(civil);
    }
    if !allow_timezone_in_string {
        return Err(Error::invalid_argument(format!(
            "Timezone is not allowed in \"{}\"",
            input
        )));
    }
    if zone_text == "Z" || zone_text == "z" {
        return ResolvedTimezone::utc().instant_from_civil(civil);
    }
    let zone = ResolvedTimezone::resolve(&zone_text).map_err(|e| {
        // A malformed offset is an invalid timestamp; an unknown name is
        // an invalid zone.
        if zone_text.starts_with('+') || zone_text.starts_with('-') { bad() } else { e }
    })?;
    zone.instant_from_civil(civil)
}

/// The trimmed rendering CAST(time AS STRING) produces: fractional digits
/// shown as 0, 3 or 6.
pub fn time_display_string(time: TimeValue) -> String {
    let mut out = format!("{:02}:{:02}:{:02}", time.hour(), time.minute(), time.second());
    push_trimmed_fraction(&mut out, time.microsecond());
    out
}

/// CAST(datetime AS STRING).
pub fn datetime_display_string(dt: DatetimeValue) -> String {
    let date = dt.date();
    format!(
        "{:04}-{:02}-{:02} {}",
        date.year(),
        date.month(),
        date.day(),
        time_display_string(dt.time())
    )
}

/// CAST(timestamp AS STRING): the civil reading in `tz` with a compact
/// offset suffix, e.g. `2023-01-09 16:00:56.700-08`.
pub fn string_from_timestamp(ts: TimestampValue, tz: &ResolvedTimezone) -> Result<String> {
    let civil = DatetimeValue::from_civil(tz.civil_from_instant(ts))?;
    let offset = tz.offset_seconds_at(ts);
    let sign = if offset < 0 { '-' } else { '+' };
    let abs = offset.abs();
    let mut out = datetime_display_string(civil);
    out.push(sign);
    out.push_str(&format!("{:02}", abs / 3600));
    if abs % 3600 != 0 {
        out.push_str(&format!(":{:02}", (abs % 3600) / 60));
    }
    Ok(out)
}

fn push_trimmed_fraction(out: &mut String, micros: u32) {
    if micros == 0 {
        return;
    }
    if micros % 1_000 == 0 {
        out.push_str(&format!(".{:03}", micros / 1_000));
    } else {
        out.push_str(&format!(".{:06}", micros));
    }
}

// Canonical literal scanning.

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Scanner { chars: input.chars().collect(), pos: 0 }
    }

    fn done(&self) -> bool {
        self.pos == self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn digits(&mut self, min: usize, max: usize) -> Option<i64> {
        let mut value = 0i64;
        let mut count = 0;
        while count < max {
            match self.peek().and_then(|c| c.to_digit(10)) {
                Some(d) => {
                    value = value * 10 + d as i64;
                    self.pos += 1;
                    count += 1;
                }
                None => break,
            }
        }
        if count < min { None } else { Some(value) }
    }
}

fn parse_date_literal(scanner: &mut Scanner) -> Option<NaiveDate> {
    let date = parse_date_literal_prefix(scanner)?;
    if scanner.done() { Some(date) } else { None }
}

fn parse_date_literal_prefix(scanner: &mut Scanner) -> Option<NaiveDate> {
    let year = scanner.digits(4, 4)?;
    if !scanner.eat('-') {
        return None;
    }
    let month = scanner.digits(1, 2)?;
    if !scanner.eat('-') {
        return None;
    }
    let day = scanner.digits(1, 2)?;
    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
}

fn parse_time_literal(scanner: &mut Scanner) -> Option<NaiveTime> {
    let time = parse_time_literal_prefix(scanner)?;
    if scanner.done() { Some(time) } else { None }
}

fn parse_time_literal_prefix(scanner: &mut Scanner) -> Option<NaiveTime> {
    let hour = scanner.digits(1, 2)?;
    if !scanner.eat(':') {
        return None;
    }
    let minute = scanner.digits(1, 2)?;
    if !scanner.eat(':') {
        return None;
    }
    let second = scanner.digits(1, 2)?;
    let micros = if scanner.eat('.') {
        let start = scanner.pos;
        let value = scanner.digits(1, 6)?;
        let count = scanner.pos - start;
        // Reject a seventh digit rather than silently truncating.
        if scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        value * 10i64.pow(6 - count as u32)
    } else {
        0
    };
    NaiveTime::from_hms_micro_opt(hour as u32, minute as u32, second as u32, micros as u32)
}

fn parse_datetime_literal(scanner: &mut Scanner) -> Option<NaiveDateTime> {
    let civil = parse_datetime_literal_prefix(scanner)?;
    if scanner.done() { Some(civil) } else { None }
}

fn parse_datetime_literal_prefix(scanner: &mut Scanner) -> Option<NaiveDateTime> {
    let date = parse_date_literal_prefix(scanner)?;
    if scanner.done() {
        return Some(date.and_time(NaiveTime::MIN));
    }
    match scanner.peek() {
        Some(' ') | Some('T') | Some('t') => {
            let checkpoint = scanner.pos;
            scanner.pos += 1;
            match parse_time_literal_prefix(scanner) {
                Some(time) => Some(NaiveDateTime::new(date, time)),
                None => {
                    // A trailing zone may follow the bare date.
                    scanner.pos = checkpoint;
                    Some(date.and_time(NaiveTime::MIN))
                }
            }
        }
        _ => Some(date.and_time(NaiveTime::MIN)),
    }
}

// Cast format elements.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastTarget {
    Date,
    Time,
    Datetime,
    Timestamp,
}

impl CastTarget {
    fn name(&self) -> &'static str {
        match self {
            CastTarget::Date => "DATE",
            CastTarget::Time => "TIME",
            CastTarget::Datetime => "DATETIME",
            CastTarget::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastElement {
    Year4,
    Year2,
    Month,
    Day,
    Hour24,
    Hour12,
    Minute,
    Second,
    Fraction(u32),
    Meridian { dotted: bool },
    TzHour,
    TzMinute,
    Literal(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldClass {
    Date,
    Time,
    Zone,
    Neutral,
}

const CAST_SEPARATORS: &str = "-/.,;: ";

fn tokenize_cast_format(format: &str, target: CastTarget) -> Result<Vec<CastElement>> {
    if format.chars().count() > DEFAULT_MAX_FORMAT_WIDTH {
        return Err(Error::out_of_range(format!(
            "Format string too long; limit {}",
            DEFAULT_MAX_FORMAT_WIDTH
        )));
    }
    let chars: Vec<char> = format.chars().collect();
    let mut elements = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (element, len, class) = match_cast_token(&chars[i..]).ok_or_else(|| {
            Error::invalid_argument(format!("Cannot find matched format element at {}", i))
        })?;
        let allowed = match class {
            FieldClass::Date => target != CastTarget::Time,
            FieldClass::Time => target != CastTarget::Date,
            FieldClass::Zone => target == CastTarget::Timestamp,
            FieldClass::Neutral => true,
        };
        if !allowed {
            return Err(Error::invalid_argument(format!(
                "Format element at {} is not allowed for the {} type",
                i,
                target.name()
            )));
        }
        elements.push(element);
        i += len;
    }
    Ok(elements)
}

/// Longest-match lookup; element names are case-insensitive. Returns the
/// element, its length, and the field class it populates.
fn match_cast_token(rest: &[char]) -> Option<(CastElement, usize, FieldClass)> {
    let upper: String = rest.iter().take(4).map(|c| c.to_ascii_uppercase()).collect();
    let starts = |name: &str| upper.starts_with(name);
    if starts("HH24") {
        return Some((CastElement::Hour24, 4, FieldClass::Time));
    }
    if starts("HH12") {
        return Some((CastElement::Hour12, 4, FieldClass::Time));
    }
    if starts("FF") {
        if let Some(precision) = rest.get(2).and_then(|c| c.to_digit(10)) {
            if (1..=6).contains(&precision) {
                return Some((CastElement::Fraction(precision), 3, FieldClass::Time));
            }
        }
        return None;
    }
    if starts("YYYY") {
        return Some((CastElement::Year4, 4, FieldClass::Date));
    }
    if starts("A.M.") || starts("P.M.") {
        return Some((CastElement::Meridian { dotted: true }, 4, FieldClass::Time));
    }
    if starts("TZH") {
        return Some((CastElement::TzHour, 3, FieldClass::Zone));
    }
    if starts("TZM") {
        return Some((CastElement::TzMinute, 3, FieldClass::Zone));
    }
    if starts("YY") {
        return Some((CastElement::Year2, 2, FieldClass::Date));
    }
    if starts("MM") {
        return Some((CastElement::Month, 2, FieldClass::Date));
    }
    if starts("DD") {
        return Some((CastElement::Day, 2, FieldClass::Date));
    }
    if starts("HH") {
        return Some((CastElement::Hour12, 2, FieldClass::Time));
    }
    if starts("MI") {
        return Some((CastElement::Minute, 2, FieldClass::Time));
    }
    if starts("SS") {
        return Some((CastElement::Second, 2, FieldClass::Time));
    }
    if starts("AM") || starts("PM") {
        return Some((CastElement::Meridian { dotted: false }, 2, FieldClass::Time));
    }
    let first = *rest.first()?;
    if CAST_SEPARATORS.contains(first) {
        return Some((CastElement::Literal(first), 1, FieldClass::Neutral));
    }
    None
}

#[derive(Debug, Default)]
struct CastFields {
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    hour: Option<i64>,
    hour_is_12h: bool,
    pm: bool,
    minute: Option<i64>,
    second: Option<i64>,
    micros: i64,
    tz_hour: Option<i64>,
    tz_negative: bool,
    tz_minute: Option<i64>,
}

impl CastFields {
    /// Outer `None` means an invalid zone-field combination (a minute with no
    /// hour); inner `None` means the format carried no zone fields at all.
    fn offset_seconds(&self) -> Option<Option<i32>> {
        match (self.tz_hour, self.tz_minute) {
            (None, None) => Some(None),
            (None, Some(_)) => None,
            (Some(hours), minutes) => {
                let magnitude = hours * 3600 + minutes.unwrap_or(0) * 60;
                let secs = if self.tz_negative { -magnitude } else { magnitude };
                Some(Some(secs as i32))
            }
        }
    }

    fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.year.unwrap_or(1970) as i32,
            self.month.unwrap_or(1) as u32,
            self.day.unwrap_or(1) as u32,
        )
    }

    fn to_time(&self) -> Option<NaiveTime> {
        let hour = match self.hour {
            Some(h) if self.hour_is_12h => (h % 12) + if self.pm { 12 } else { 0 },
            Some(h) => h,
            None => 0,
        };
        NaiveTime::from_hms_micro_opt(
            hour as u32,
            self.minute.unwrap_or(0) as u32,
            self.second.unwrap_or(0) as u32,
            self.micros as u32,
        )
    }

    fn to_datetime(&self) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::new(self.to_date()?, self.to_time()?))
    }
}

fn match_cast_elements(elements: &[CastElement], input: &str) -> Option<CastFields> {
    let mut scanner = Scanner::new(input);
    let mut fields = CastFields::default();
    for element in elements {
        match element {
            CastElement::Year4 => fields.year = Some(scanner.digits(1, 4)?),
            CastElement::Year2 => {
                // Two-digit years land in the 2000s.
                fields.year = Some(2000 + scanner.digits(1, 2)?);
            }
            CastElement::Month => {
                let m = scanner.digits(1, 2)?;
                if !(1..=12).contains(&m) {
                    return None;
                }
                fields.month = Some(m);
            }
            CastElement::Day => {
                let d = scanner.digits(1, 2)?;
                if !(1..=31).contains(&d) {
                    return None;
                }
                fields.day = Some(d);
            }
            CastElement::Hour24 => {
                let h = scanner.digits(1, 2)?;
                if h > 23 {
                    return None;
                }
                fields.hour = Some(h);
                fields.hour_is_12h = false;
            }
            CastElement::Hour12 => {
                let h = scanner.digits(1, 2)?;
                if !(1..=12).contains(&h) {
                    return None;
                }
                fields.hour = Some(h);
                fields.hour_is_12h = true;
            }
            CastElement::Minute => {
                let m = scanner.digits(1, 2)?;
                if m > 59 {
                    return None;
                }
                fields.minute = Some(m);
            }
            CastElement::Second => {
                let s = scanner.digits(1, 2)?;
                if s > 59 {
                    return None;
                }
                fields.second = Some(s);
            }
            CastElement::Fraction(precision) => {
                let start = scanner.pos;
                let value = scanner.digits(1, *precision as usize)?;
                let count = (scanner.pos - start) as u32;
                fields.micros = value * 10i64.pow(6 - count);
            }
            CastElement::Meridian { dotted } => {
                let len = if *dotted { 4 } else { 2 };
                if scanner.pos + len > scanner.chars.len() {
                    return None;
                }
                let text: String = scanner.chars[scanner.pos..scanner.pos + len]
                    .iter()
                    .map(|c| c.to_ascii_uppercase())
                    .collect();
                let expected_am = if *dotted { "A.M." } else { "AM" };
                let expected_pm = if *dotted { "P.M." } else { "PM" };
                if text == expected_pm {
                    fields.pm = true;
                } else if text != expected_am {
                    return None;
                }
                scanner.pos += len;
            }
            CastElement::TzHour => {
                fields.tz_negative = if scanner.eat('-') {
                    true
                } else {
                    scanner.eat('+');
                    false
                };
                let h = scanner.digits(1, 2)?;
                if h > 14 {
                    return None;
                }
                fields.tz_hour = Some(h);
            }
            CastElement::TzMinute => {
                let m = scanner.digits(1, 2)?;
                if m > 59 {
                    return None;
                }
                fields.tz_minute = Some(m);
            }
            CastElement::Literal(c) => {
                if !scanner.eat(*c) {
                    return None;
                }
            }
        }
    }
    if scanner.done() { Some(fields) } else { None }
}
