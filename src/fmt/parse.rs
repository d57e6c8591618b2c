//! The input half of the format grammar.
//!
//! Error surface, matching the reference wording exactly:
//!  - a literal format character that does not match the input:
//!    `Mismatch between format character 'x' and string character 'y'`;
//!  - an element that cannot be matched (bad name, out-of-range number,
//!    truncated input, leftover input): `Failed to parse input string "…"`;
//!  - syntactically matched fields that do not form a real calendar value
//!    under the strict contract: `Out-of-range datetime field in parsing
//!    function`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::bounds::{MICROS_PER_DAY, MICROS_PER_SECOND};
use crate::error::{Error, Result};
use crate::fmt::format::{
    MONTH_ABBREVIATIONS, MONTH_NAMES, WEEKDAY_ABBREVIATIONS, WEEKDAY_NAMES,
};
use crate::fmt::ParseOptions;
use crate::timezone::ResolvedTimezone;
use crate::value::{DateValue, DatetimeValue, TimeValue, TimestampValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseTarget {
    Date,
    Time,
    Datetime,
    Timestamp,
}

impl ParseTarget {
    fn name(&self) -> &'static str {
        match self {
            ParseTarget::Date => "DATE",
            ParseTarget::Time => "TIME",
            ParseTarget::Datetime => "DATETIME",
            ParseTarget::Timestamp => "TIMESTAMP",
        }
    }

    fn allows_date_fields(&self) -> bool {
        !matches!(self, ParseTarget::Time)
    }

    fn allows_time_fields(&self) -> bool {
        !matches!(self, ParseTarget::Date)
    }

    fn allows_zone_fields(&self) -> bool {
        matches!(self, ParseTarget::Timestamp)
    }

    /// `%s` denotes a whole instant; only the combined types accept it.
    fn allows_epoch_seconds(&self) -> bool {
        matches!(self, ParseTarget::Datetime | ParseTarget::Timestamp)
    }
}

#[derive(Debug, Default)]
struct Fields {
    year: Option<i64>,
    century: Option<i64>,
    year_of_century: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    day_of_year: Option<i64>,
    hour: Option<i64>,
    hour12: Option<i64>,
    pm: Option<bool>,
    minute: Option<i64>,
    second: Option<i64>,
    micros: Option<i64>,
    epoch_seconds: Option<i64>,
    offset_seconds: Option<i32>,
    zone_name: Option<String>,
}

pub(super) fn parse_date_value(
    format: &str,
    input: &str,
    options: ParseOptions,
) -> Result<DateValue> {
    let civil = parse_to_civil(format, input, ParseTarget::Date, options)?;
    DateValue::from_civil(civil.date())
}

pub(super) fn parse_time_value(
    format: &str,
    input: &str,
    options: ParseOptions,
) -> Result<TimeValue> {
    let civil = parse_to_civil(format, input, ParseTarget::Time, options)?;
    TimeValue::from_civil(civil.time())
}

pub(super) fn parse_datetime_value(
    format: &str,
    input: &str,
    options: ParseOptions,
) -> Result<DatetimeValue> {
    let civil = parse_to_civil(format, input, ParseTarget::Datetime, options)?;
    DatetimeValue::from_civil(civil)
}

pub(super) fn parse_timestamp_value(
    format: &str,
    input: &str,
    tz: &ResolvedTimezone,
    options: ParseOptions,
) -> Result<TimestampValue> {
    let fields = run_parser(format, input, ParseTarget::Timestamp, options)?;
    if let Some(seconds) = fields.epoch_seconds {
        let micros = seconds
            .checked_mul(MICROS_PER_SECOND)
            .ok_or_else(|| out_of_range_field())?;
        return TimestampValue::from_micros(micros);
    }
    let civil = assemble_civil(&fields, options)?;
    if let Some(offset) = fields.offset_seconds {
        let shifted = civil
            .checked_sub_signed(Duration::seconds(offset as i64))
            .ok_or_else(out_of_range_field)?;
        let micros = civil_epoch_micros(shifted);
        return TimestampValue::from_micros(micros);
    }
    let zone = match &fields.zone_name {
        Some(name) => ResolvedTimezone::resolve(name)?,
        None => *tz,
    };
    zone.instant_from_civil(civil)
}

fn parse_to_civil(
    format: &str,
    input: &str,
    target: ParseTarget,
    options: ParseOptions,
) -> Result<NaiveDateTime> {
    let fields = run_parser(format, input, target, options)?;
    if let Some(seconds) = fields.epoch_seconds {
        // %s is an instant; civil targets read it as UTC.
        let micros = seconds
            .checked_mul(MICROS_PER_SECOND)
            .ok_or_else(out_of_range_field)?;
        return Ok(TimestampValue::from_micros(micros)?.utc_civil());
    }
    assemble_civil(&fields, options)
}

fn out_of_range_field() -> Error {
    Error::invalid_argument("Out-of-range datetime field in parsing function")
}

fn civil_epoch_micros(civil: NaiveDateTime) -> i64 {
    crate::bounds::epoch_days(civil.date()) as i64 * MICROS_PER_DAY
        + chrono::Timelike::num_seconds_from_midnight(&civil.time()) as i64 * MICROS_PER_SECOND
        + (chrono::Timelike::nanosecond(&civil.time()) / 1_000) as i64
}

fn assemble_civil(fields: &Fields, options: ParseOptions) -> Result<NaiveDateTime> {
    let year = resolve_year(fields);
    let month = fields.month.unwrap_or(1);
    let day = fields.day.unwrap_or(1);

    let year = i32::try_from(year).map_err(|_| out_of_range_field())?;
    let date = if fields.month.is_none() && fields.day.is_none() {
        if let Some(ordinal) = fields.day_of_year {
            NaiveDate::from_yo_opt(year, ordinal as u32).ok_or_else(out_of_range_field)?
        } else {
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(out_of_range_field)?
        }
    } else if options.strict {
        NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(out_of_range_field)?
    } else {
        // Lenient: a day past the end of the month rolls forward.
        NaiveDate::from_ymd_opt(year, month as u32, 1)
            .ok_or_else(out_of_range_field)?
            .checked_add_signed(Duration::days(day - 1))
            .ok_or_else(out_of_range_field)?
    };

    let hour = resolve_hour(fields);
    let minute = fields.minute.unwrap_or(0);
    let second = fields.second.unwrap_or(0);
    let micros = fields.micros.unwrap_or(0);

    if options.strict {
        if second > 59 {
            return Err(out_of_range_field());
        }
        let time = NaiveTime::from_hms_micro_opt(
            hour as u32,
            minute as u32,
            second as u32,
            micros as u32,
        )
        .ok_or_else(out_of_range_field)?;
        Ok(NaiveDateTime::new(date, time))
    } else {
        // Lenient: excess seconds spill into the following minutes/days.
        let total = hour * 3_600_000_000 + minute * 60_000_000 + second * MICROS_PER_SECOND
            + micros;
        let extra_days = total.div_euclid(MICROS_PER_DAY);
        let in_day = total.rem_euclid(MICROS_PER_DAY);
        let date = date
            .checked_add_signed(Duration::days(extra_days))
            .ok_or_else(out_of_range_field)?;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            (in_day / MICROS_PER_SECOND) as u32,
            ((in_day % MICROS_PER_SECOND) * 1_000) as u32,
        )
        .ok_or_else(out_of_range_field)?;
        Ok(NaiveDateTime::new(date, time))
    }
}

fn resolve_year(fields: &Fields) -> i64 {
    if let Some(year) = fields.year {
        return year;
    }
    match (fields.century, fields.year_of_century) {
        (Some(century), year_of_century) => century * 100 + year_of_century.unwrap_or(0),
        (None, Some(yy)) => {
            // POSIX pivot: 69..99 are the 1900s.
            if yy >= 69 { 1900 + yy } else { 2000 + yy }
        }
        (None, None) => 1970,
    }
}

fn resolve_hour(fields: &Fields) -> i64 {
    if let Some(hour) = fields.hour {
        return hour;
    }
    match fields.hour12 {
        Some(h) => (h % 12) + if fields.pm.unwrap_or(false) { 12 } else { 0 },
        None => 0,
    }
}

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    input: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor { chars: input.chars().collect(), pos: 0, input }
    }

    fn fail(&self) -> Error {
        Error::parse_failure(self.input)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Greedy run of up to `max` ASCII digits, at least one.
    fn digits(&mut self, max: usize) -> Result<i64> {
        let mut value: i64 = 0;
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
        if count == 0 { Err(self.fail()) } else { Ok(value) }
    }

    fn digits_in_range(&mut self, max_width: usize, lo: i64, hi: i64) -> Result<i64> {
        let value = self.digits(max_width)?;
        if (lo..=hi).contains(&value) { Ok(value) } else { Err(self.fail()) }
    }

    /// Case-insensitive match of the longest fitting candidate; returns its
    /// index in `candidates`.
    fn match_name(&mut self, candidates: &[&str]) -> Result<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let len = candidate.chars().count();
            if self.pos + len > self.chars.len() {
                continue;
            }
            let matches = candidate
                .chars()
                .zip(&self.chars[self.pos..self.pos + len])
                .all(|(a, b)| a.eq_ignore_ascii_case(b));
            if matches && best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((idx, len));
            }
        }
        match best {
            Some((idx, len)) => {
                self.pos += len;
                Ok(idx)
            }
            None => Err(self.fail()),
        }
    }

    /// `[+-]HH[MM]`, or `[+-]H[H][:MM]` and `Z` when `extended`.
    fn utc_offset(&mut self, extended: bool) -> Result<i32> {
        if extended && self.peek().is_some_and(|c| c == 'Z' || c == 'z') {
            self.pos += 1;
            return Ok(0);
        }
        let sign = match self.bump() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Err(self.fail()),
        };
        let hours = self.digits_in_range(2, 0, 23)?;
        let minutes = if extended {
            if self.peek() == Some(':') {
                self.pos += 1;
                self.digits_in_range(2, 0, 59)?
            } else {
                0
            }
        } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.digits_in_range(2, 0, 59)?
        } else {
            0
        };
        Ok(sign * (hours * 3600 + minutes * 60) as i32)
    }
}

/// Replaces the composite elements with their expansions so the main loop
/// only sees primitive ones.
fn expand_composites(format: &str) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('c') => {
                chars.next();
                out.push_str("%a %b %e %H:%M:%S %Y");
            }
            Some('D') | Some('x') => {
                chars.next();
                out.push_str("%m/%d/%y");
            }
            Some('F') => {
                chars.next();
                out.push_str("%Y-%m-%d");
            }
            Some('R') => {
                chars.next();
                out.push_str("%H:%M");
            }
            Some('T') | Some('X') => {
                chars.next();
                out.push_str("%H:%M:%S");
            }
            _ => out.push('%'),
        }
    }
    out
}

fn run_parser(
    format: &str,
    input: &str,
    target: ParseTarget,
    options: ParseOptions,
) -> Result<Fields> {
    if format.chars().count() > options.max_format_width {
        return Err(Error::out_of_range(format!(
            "Format string too long; limit {}",
            options.max_format_width
        )));
    }
    let format = expand_composites(format);
    let format_chars: Vec<char> = format.chars().collect();
    let mut cursor = Cursor::new(input);
    let mut fields = Fields::default();
    let mut i = 0;

    let reject = |element: &str| -> Error {
        Error::invalid_argument(format!(
            "Invalid format: %{} is not allowed for the {} type",
            element,
            target.name()
        ))
    };
    let check_date = |element: &str| -> Result<()> {
        if options.strict && !target.allows_date_fields() { Err(reject(element)) } else { Ok(()) }
    };
    let check_time = |element: &str| -> Result<()> {
        if options.strict && !target.allows_time_fields() { Err(reject(element)) } else { Ok(()) }
    };
    let check_zone = |element: &str| -> Result<()> {
        if options.strict && !target.allows_zone_fields() { Err(reject(element)) } else { Ok(()) }
    };

    while i < format_chars.len() {
        let fc = format_chars[i];
        if fc.is_whitespace() {
            cursor.skip_whitespace();
            i += 1;
            continue;
        }
        if fc != '%' {
            match cursor.bump() {
                Some(c) if c == fc => {}
                Some(c) => {
                    return Err(Error::invalid_argument(format!(
                        "Mismatch between format character '{}' and string character '{}'",
                        fc, c
                    )));
                }
                None => return Err(cursor.fail()),
            }
            i += 1;
            continue;
        }
        let Some(&element) = format_chars.get(i + 1) else {
            return Err(cursor.fail());
        };
        i += 2;
        let name = element.to_string();
        match element {
            'A' | 'a' => {
                check_date(&name)?;
                let mut names: Vec<&str> = WEEKDAY_NAMES.to_vec();
                names.extend_from_slice(&WEEKDAY_ABBREVIATIONS);
                // The weekday carries no information beyond the date fields.
                cursor.match_name(&names)?;
            }
            'B' | 'b' | 'h' => {
                check_date(&name)?;
                let mut names: Vec<&str> = MONTH_NAMES.to_vec();
                names.extend_from_slice(&MONTH_ABBREVIATIONS);
                fields.month = Some((cursor.match_name(&names)? % 12) as i64 + 1);
            }
            'C' => {
                check_date("C")?;
                fields.century = Some(cursor.digits(2)?);
            }
            'Y' => {
                check_date("Y")?;
                fields.year = Some(cursor.digits(4)?);
            }
            'y' => {
                check_date("y")?;
                fields.year_of_century = Some(cursor.digits_in_range(2, 0, 99)?);
            }
            'G' => {
                check_date("G")?;
                cursor.digits(4)?;
            }
            'g' => {
                check_date("g")?;
                cursor.digits(2)?;
            }
            'm' => {
                check_date("m")?;
                fields.month = Some(cursor.digits_in_range(2, 1, 12)?);
            }
            'd' | 'e' => {
                check_date(&name)?;
                if element == 'e' && cursor.peek() == Some(' ') {
                    cursor.pos += 1;
                }
                fields.day = Some(cursor.digits_in_range(2, 1, 31)?);
            }
            'j' => {
                check_date("j")?;
                fields.day_of_year = Some(cursor.digits_in_range(3, 1, 366)?);
            }
            'U' | 'W' | 'V' => {
                check_date(&name)?;
                cursor.digits_in_range(2, 0, 53)?;
            }
            // Quarter and ISO day of year carry no information beyond the
            // date fields, like %G/%U/%w.
            'Q' => {
                check_date("Q")?;
                cursor.digits_in_range(1, 1, 4)?;
            }
            'J' => {
                check_date("J")?;
                cursor.digits_in_range(3, 1, 371)?;
            }
            'u' => {
                check_date("u")?;
                cursor.digits_in_range(1, 1, 7)?;
            }
            'w' => {
                check_date("w")?;
                cursor.digits_in_range(1, 0, 6)?;
            }
            'H' | 'k' => {
                check_time(&name)?;
                if element == 'k' && cursor.peek() == Some(' ') {
                    cursor.pos += 1;
                }
                fields.hour = Some(cursor.digits_in_range(2, 0, 23)?);
            }
            'I' | 'l' => {
                check_time(&name)?;
                if element == 'l' && cursor.peek() == Some(' ') {
                    cursor.pos += 1;
                }
                fields.hour12 = Some(cursor.digits_in_range(2, 1, 12)?);
            }
            'M' => {
                check_time("M")?;
                fields.minute = Some(cursor.digits_in_range(2, 0, 59)?);
            }
            'S' => {
                check_time("S")?;
                fields.second = Some(cursor.digits_in_range(2, 0, 60)?);
            }
            'p' | 'P' => {
                check_time(&name)?;
                fields.pm = Some(cursor.match_name(&["AM", "PM"])? == 1);
            }
            's' => {
                if options.strict && !target.allows_epoch_seconds() {
                    return Err(reject("s"));
                }
                let negative = cursor.peek() == Some('-');
                if negative || cursor.peek() == Some('+') {
                    cursor.pos += 1;
                }
                let value = cursor.digits(18)?;
                fields.epoch_seconds = Some(if negative { -value } else { value });
            }
            'z' => {
                check_zone("z")?;
                fields.offset_seconds = Some(cursor.utc_offset(false)?);
            }
            'Z' => {
                check_zone("Z")?;
                let start = cursor.pos;
                while cursor
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || "/_+-".contains(c))
                {
                    cursor.pos += 1;
                }
                if cursor.pos == start {
                    return Err(cursor.fail());
                }
                fields.zone_name =
                    Some(cursor.chars[start..cursor.pos].iter().collect());
            }
            'n' | 't' => cursor.skip_whitespace(),
            '%' => match cursor.bump() {
                Some('%') => {}
                _ => return Err(cursor.fail()),
            },
            'E' => i += parse_extension(&format_chars[i..], &mut cursor, &mut fields, &|e| {
                check_zone_or_time(e, target, options)
            })?,
            other => {
                return Err(Error::invalid_argument(format!(
                    "Format element %{} is not supported for parsing",
                    other
                )));
            }
        }
    }

    cursor.skip_whitespace();
    if cursor.pos != cursor.chars.len() {
        return Err(cursor.fail());
    }
    Ok(fields)
}

fn check_zone_or_time(element: &str, target: ParseTarget, options: ParseOptions) -> Result<()> {
    let allowed = match element {
        "Ez" => target.allows_zone_fields(),
        "E4Y" => target.allows_date_fields(),
        _ => target.allows_time_fields(),
    };
    if options.strict && !allowed {
        return Err(Error::invalid_argument(format!(
            "Invalid format: %{} is not allowed for the {} type",
            element,
            target.name()
        )));
    }
    Ok(())
}

/// `%Ez`, `%E4Y`, `%E#S`, `%E*S`. `rest` starts just past the `E`; returns
/// how many format characters past the `E` were consumed.
fn parse_extension(
    rest: &[char],
    cursor: &mut Cursor<'_>,
    fields: &mut Fields,
    check: &dyn Fn(&str) -> Result<()>,
) -> Result<usize> {
    match rest.first() {
        Some('z') => {
            check("Ez")?;
            fields.offset_seconds = Some(cursor.utc_offset(true)?);
            Ok(1)
        }
        Some('4') if rest.get(1) == Some(&'Y') => {
            check("E4Y")?;
            fields.year = Some(cursor.digits(4)?);
            Ok(2)
        }
        Some('*') if rest.get(1) == Some(&'S') => {
            check("E*S")?;
            fields.second = Some(cursor.digits_in_range(2, 0, 60)?);
            fields.micros = Some(parse_fraction(cursor, 6)?);
            Ok(2)
        }
        Some(d) if d.is_ascii_digit() => {
            let mut len = 0;
            let mut precision = 0usize;
            while let Some(c) = rest.get(len) {
                if let Some(v) = c.to_digit(10) {
                    precision = precision * 10 + v as usize;
                    len += 1;
                } else {
                    break;
                }
            }
            if rest.get(len) != Some(&'S') {
                return Err(Error::invalid_argument(
                    "Format element %E must be %Ez, %E4Y, %E*S or %E<digits>S",
                ));
            }
            check("E#S")?;
            fields.second = Some(cursor.digits_in_range(2, 0, 60)?);
            fields.micros = Some(parse_fraction(cursor, precision.min(6))?);
            Ok(len + 1)
        }
        _ => Err(Error::invalid_argument(
            "Format element %E must be %Ez, %E4Y, %E*S or %E<digits>S",
        )),
    }
}

/// Optional `.` plus up to `max_digits` fraction digits, scaled to
/// microseconds.
fn parse_fraction(cursor: &mut Cursor<'_>, max_digits: usize) -> Result<i64> {
    if cursor.peek() != Some('.') {
        return Ok(0);
    }
    // A bare dot with no digits is left for the next format element.
    if !cursor
        .chars
        .get(cursor.pos + 1)
        .is_some_and(|c| c.is_ascii_digit())
    {
        return Ok(0);
    }
    cursor.pos += 1;
    let mut micros: i64 = 0;
    let mut count = 0;
    while count < max_digits {
        match cursor.peek().and_then(|c| c.to_digit(10)) {
            Some(d) => {
                micros = micros * 10 + d as i64;
                cursor.pos += 1;
                count += 1;
            }
            None => break,
        }
    }
    if count == 0 {
        return Err(cursor.fail());
    }
    for _ in count..6 {
        micros *= 10;
    }
    Ok(micros)
}
