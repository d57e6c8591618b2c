//! bqdt - BigQuery-compatible civil date/time semantics.
//!
//! The crate models the four civil value types of the BigQuery dialect and
//! the operations the dialect defines over them:
//!
//! ```text
//! DATE      calendar date, 0001-01-01 .. 9999-12-31
//! TIME      wall-clock time of day, microsecond granularity
//! DATETIME  civil date + time, no zone attached
//! TIMESTAMP absolute instant, microseconds since the Unix epoch
//! ```
//!
//! Three engines sit on top of the value model:
//!
//! * [`arithmetic`] - part-based add/sub/diff/trunc/extract/last_day and
//!   the conversions between the four types,
//! * [`timezone`] - IANA name and fixed-offset resolution plus the
//!   civil-to-instant mapping with its DST disambiguation policy,
//! * [`fmt`] - the strptime-style format grammar in both directions,
//!   canonical string forms, and the lenient `CAST`-style conversions.
//!
//! # Example
//!
//! ```rust,ignore
//! use bqdt::{DateTimePart, DateValue, date_add, date_diff};
//!
//! let start = DateValue::from_ymd(2024, 1, 31)?;
//! let next = date_add(start, 1, DateTimePart::Month)?; // 2024-02-29
//! assert_eq!(date_diff(next, start, DateTimePart::Month)?, 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![allow(missing_docs)]

pub mod arithmetic;
pub mod bounds;
pub mod error;
pub mod fmt;
pub mod part;
pub mod timezone;
pub mod value;

pub use arithmetic::{
    date_add, date_diff, date_extract, date_from_datetime, date_from_timestamp,
    date_from_unix_date, date_sub, date_trunc, datetime_add, datetime_diff, datetime_extract,
    datetime_from_date, datetime_from_timestamp, datetime_sub, datetime_trunc, last_day,
    last_day_of_datetime, time_add, time_diff, time_extract, time_from_datetime,
    time_from_timestamp, time_sub, time_trunc, timestamp_add, timestamp_diff, timestamp_extract,
    timestamp_from_date, timestamp_from_datetime, timestamp_from_unix_micros,
    timestamp_from_unix_millis, timestamp_from_unix_seconds, timestamp_sub, timestamp_trunc,
    unix_date, unix_micros, unix_millis, unix_seconds,
};
pub use error::{Error, Result};
pub use part::DateTimePart;
pub use timezone::ResolvedTimezone;
pub use value::{DateValue, DatetimeValue, IntervalValue, TimeValue, TimestampValue};
