//! Boundary input types for instants and durations.
//!
//! Callers may hand the engine either textual or already-parsed values.
//! Both forms are modelled as small enums ([`TimeInput`], [`DurationInput`])
//! that are resolved exactly once, before any aggregation work starts.
//!
//! Accepted text forms:
//!
//! - instants: `YYYY-MM-DDTHH:MM:SS` with optional fractional seconds; a
//!   single space may replace the `T`. Values are interpreted as UTC.
//!   RFC 3339 strings with an explicit offset are accepted as well.
//! - durations: either comma-separated `key=value` pairs
//!   (`hours=1,minutes=5`) or a step spec (`5m`, see [`Step`]).

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use snafu::prelude::*;

use crate::step::{ParseStepError, Step};

const ISO_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ISO_WHOLE: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors raised while resolving textual instants or durations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseTimeError {
    /// The string is not a recognised ISO-8601-like timestamp.
    #[snafu(display("could not convert '{input}' to a timestamp: {source}"))]
    InvalidTimestamp {
        /// The original input.
        input: String,
        /// Error from the last attempted format.
        source: chrono::ParseError,
    },

    /// The duration spec was empty.
    #[snafu(display("duration spec is empty"))]
    EmptyDuration,

    /// A comma-separated part is not of the form `key=value`.
    #[snafu(display("malformed duration part '{part}' in '{spec}' (expected key=value)"))]
    MalformedDurationPart {
        /// The original spec.
        spec: String,
        /// The offending part.
        part: String,
    },

    /// A key is not one of the supported duration units.
    #[snafu(display(
        "unknown duration key '{key}' in '{spec}' (expected weeks|days|hours|minutes|seconds)"
    ))]
    UnknownDurationKey {
        /// The original spec.
        spec: String,
        /// The unrecognised key.
        key: String,
    },

    /// A value could not be parsed as an integer.
    #[snafu(display("invalid duration value '{value}' in '{spec}': {source}"))]
    InvalidDurationValue {
        /// The original spec.
        spec: String,
        /// The value that failed to parse.
        value: String,
        /// Integer parse failure.
        source: std::num::ParseIntError,
    },

    /// The summed duration does not fit in a `chrono::Duration`.
    #[snafu(display("duration '{spec}' is out of range"))]
    DurationOverflow {
        /// The original spec.
        spec: String,
    },

    /// The spec is neither `key=value` pairs nor a valid step spec.
    #[snafu(display("invalid duration spec '{spec}': {source}"))]
    InvalidStep {
        /// The original spec.
        spec: String,
        /// Underlying step parse failure.
        source: ParseStepError,
    },
}

/// An instant given either as text or as an already-parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeInput {
    /// ISO-8601-like text, parsed by [`TimeInput::resolve`].
    Iso(String),
    /// An instant that needs no parsing.
    Instant(DateTime<Utc>),
}

impl TimeInput {
    /// Resolve to a native UTC instant.
    pub fn resolve(&self) -> Result<DateTime<Utc>, ParseTimeError> {
        match self {
            TimeInput::Iso(s) => parse_timestamp(s),
            TimeInput::Instant(t) => Ok(*t),
        }
    }
}

impl From<&str> for TimeInput {
    fn from(value: &str) -> Self {
        TimeInput::Iso(value.to_string())
    }
}

impl From<String> for TimeInput {
    fn from(value: String) -> Self {
        TimeInput::Iso(value)
    }
}

impl From<DateTime<Utc>> for TimeInput {
    fn from(value: DateTime<Utc>) -> Self {
        TimeInput::Instant(value)
    }
}

/// A duration given either as text or as an already-parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationInput {
    /// `key=value` pairs or a step spec, parsed by [`DurationInput::resolve`].
    Spec(String),
    /// A duration that needs no parsing.
    Native(Duration),
}

impl DurationInput {
    /// Resolve to a native duration.
    pub fn resolve(&self) -> Result<Duration, ParseTimeError> {
        match self {
            DurationInput::Spec(s) => parse_duration(s),
            DurationInput::Native(d) => Ok(*d),
        }
    }
}

impl From<&str> for DurationInput {
    fn from(value: &str) -> Self {
        DurationInput::Spec(value.to_string())
    }
}

impl From<String> for DurationInput {
    fn from(value: String) -> Self {
        DurationInput::Spec(value)
    }
}

impl From<Duration> for DurationInput {
    fn from(value: Duration) -> Self {
        DurationInput::Native(value)
    }
}

impl From<Step> for DurationInput {
    fn from(value: Step) -> Self {
        DurationInput::Native(value.to_duration())
    }
}

/// Parse an ISO-8601-like timestamp into a UTC instant.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, ParseTimeError> {
    let trimmed = input.trim();
    let iso = trimmed.replacen(' ', "T", 1);

    if let Ok(naive) = NaiveDateTime::parse_from_str(&iso, ISO_FRACTIONAL) {
        return Ok(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&iso, ISO_WHOLE)
        .map(|naive| naive.and_utc())
        .context(InvalidTimestampSnafu { input })
}

/// Parse a duration spec.
///
/// Specs containing `=` are read as comma-separated `key=value` pairs with
/// integer values, where keys are `weeks`, `days`, `hours`, `minutes` or
/// `seconds` (singular forms accepted). Anything else is parsed as a
/// [`Step`].
pub fn parse_duration(spec: &str) -> Result<Duration, ParseTimeError> {
    let spec = spec.trim();
    ensure!(!spec.is_empty(), EmptyDurationSnafu);

    if !spec.contains('=') {
        let step = Step::parse(spec).context(InvalidStepSnafu { spec })?;
        return Ok(step.to_duration());
    }

    let mut total = Duration::zero();
    for part in spec.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return MalformedDurationPartSnafu { spec, part }.fail();
        };
        let key = key.trim();
        let value = value.trim();
        let n: i64 = value
            .parse()
            .context(InvalidDurationValueSnafu { spec, value })?;

        let piece = match key.to_ascii_lowercase().as_str() {
            "weeks" | "week" => Duration::try_weeks(n),
            "days" | "day" => Duration::try_days(n),
            "hours" | "hour" => Duration::try_hours(n),
            "minutes" | "minute" => Duration::try_minutes(n),
            "seconds" | "second" => Duration::try_seconds(n),
            _ => return UnknownDurationKeySnafu { spec, key }.fail(),
        };
        total = piece
            .and_then(|p| total.checked_add(&p))
            .context(DurationOverflowSnafu { spec })?;
    }
    Ok(total)
}
