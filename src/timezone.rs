//! Timezone resolution and civil ↔ absolute conversion.
//!
//! A resolved zone is either a named IANA zone (backed by chrono-tz's
//! compiled tzdata) or a fixed UTC offset. It is immutable after resolution
//! and can be shared freely across threads; callers are expected to resolve
//! once per batch and reuse the value.

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::value::TimestampValue;

const MAX_OFFSET_HOURS: i32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTimezone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl ResolvedTimezone {
    pub fn utc() -> Self {
        ResolvedTimezone::Named(Tz::UTC)
    }

    /// Resolves an IANA zone name (case-sensitive) or a fixed offset of the
    /// form `(+|-)H[H][:MM]` / `(+|-)HHMM`.
    pub fn resolve(name_or_offset: &str) -> Result<Self> {
        if name_or_offset.starts_with('+') || name_or_offset.starts_with('-') {
            return parse_fixed_offset(name_or_offset);
        }
        if let Ok(tz) = name_or_offset.parse::<Tz>() {
            return Ok(ResolvedTimezone::Named(tz));
        }
        // Mitigates tzdata version skew between the two spellings.
        let renamed = match name_or_offset {
            "Europe/Kyiv" => Some("Europe/Kiev"),
            "Europe/Kiev" => Some("Europe/Kyiv"),
            _ => None,
        };
        if let Some(alias) = renamed
            && let Ok(tz) = alias.parse::<Tz>()
        {
            log::debug!("time zone {} resolved through alias {}", name_or_offset, alias);
            return Ok(ResolvedTimezone::Named(tz));
        }
        Err(Error::invalid_argument(format!(
            "Invalid time zone: {}",
            name_or_offset
        )))
    }

    /// The civil reading of an instant in this zone.
    pub fn civil_from_instant(&self, ts: TimestampValue) -> NaiveDateTime {
        let utc = utc_datetime(ts);
        match self {
            ResolvedTimezone::Named(tz) => utc.with_timezone(tz).naive_local(),
            ResolvedTimezone::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        }
    }

    /// The instant a civil reading denotes in this zone.
    ///
    /// Readings repeated by a backward transition resolve to the earlier
    /// instant; readings skipped by a forward transition are interpreted
    /// with the offset in effect before the transition.
    pub fn instant_from_civil(&self, civil: NaiveDateTime) -> Result<TimestampValue> {
        let utc: DateTime<Utc> = match self {
            ResolvedTimezone::Named(tz) => match tz.from_local_datetime(&civil) {
                LocalResult::Single(t) => t.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
                LocalResult::None => {
                    let probe = civil - Duration::days(1);
                    let pre_offset = tz.offset_from_utc_datetime(&probe).fix();
                    Utc.from_utc_datetime(&(civil - pre_offset))
                }
            },
            ResolvedTimezone::Fixed(offset) => {
                Utc.from_utc_datetime(&(civil - *offset))
            }
        };
        TimestampValue::from_micros(utc.timestamp_micros())
    }

    /// UTC offset in seconds in effect at the given instant.
    pub fn offset_seconds_at(&self, ts: TimestampValue) -> i32 {
        let utc = utc_datetime(ts);
        match self {
            ResolvedTimezone::Named(tz) => {
                tz.offset_from_utc_datetime(&utc.naive_utc()).fix().local_minus_utc()
            }
            ResolvedTimezone::Fixed(offset) => offset.local_minus_utc(),
        }
    }

    /// Zone label at the given instant, for the `%Z` format element:
    /// the zone abbreviation for named zones, `UTC` or `(+|-)HH:MM` for
    /// fixed offsets.
    pub fn display_name_at(&self, ts: TimestampValue) -> String {
        match self {
            ResolvedTimezone::Named(tz) => {
                let utc = utc_datetime(ts);
                tz.offset_from_utc_datetime(&utc.naive_utc()).to_string()
            }
            ResolvedTimezone::Fixed(offset) => {
                let secs = offset.local_minus_utc();
                if secs == 0 {
                    "UTC".to_string()
                } else {
                    let sign = if secs < 0 { '-' } else { '+' };
                    let abs = secs.abs();
                    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
                }
            }
        }
    }
}

fn utc_datetime(ts: TimestampValue) -> DateTime<Utc> {
    // Timestamp bounds sit well inside chrono's representable range.
    DateTime::<Utc>::from_timestamp_micros(ts.micros())
        .unwrap_or_else(|| unreachable!("validated timestamp fits chrono's range"))
}

fn parse_fixed_offset(text: &str) -> Result<ResolvedTimezone> {
    let bad = || Error::invalid_argument(format!("Invalid time zone: {}", text));
    let mut chars = text.chars();
    let sign = match chars.next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Err(bad()),
    };
    let rest: Vec<char> = chars.collect();
    if rest.is_empty() || !rest.iter().all(|c| c.is_ascii_digit() || *c == ':') {
        return Err(bad());
    }
    let (hours, minutes) = if let Some(colon) = rest.iter().position(|c| *c == ':') {
        let (h, m) = rest.split_at(colon);
        let m = &m[1..];
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(bad());
        }
        (digits_to_i32(h), digits_to_i32(m))
    } else if rest.len() <= 2 {
        (digits_to_i32(&rest), 0)
    } else if rest.len() == 4 {
        (digits_to_i32(&rest[..2]), digits_to_i32(&rest[2..]))
    } else {
        return Err(bad());
    };
    if minutes > 59 || hours > MAX_OFFSET_HOURS || (hours == MAX_OFFSET_HOURS && minutes > 0) {
        return Err(bad());
    }
    let secs = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(secs)
        .map(ResolvedTimezone::Fixed)
        .ok_or_else(bad)
}

fn digits_to_i32(digits: &[char]) -> i32 {
    digits.iter().fold(0, |acc, c| acc * 10 + (*c as i32 - '0' as i32))
}
