//! Human-friendly fixed step sizes (`30s`, `15m`, `6h`, `1d`).
//!
//! A [`Step`] describes the spacing of an equidistant grid. It is only a
//! configuration convenience: every aggregator works on `chrono::Duration`
//! internally and [`Step::to_duration`] performs the conversion.

use std::{fmt, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Errors produced when parsing a step spec (e.g. `1h`).
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseStepError {
    /// The spec string was empty or only whitespace.
    #[snafu(display("step spec is empty"))]
    Empty,

    /// The spec did not include a numeric value.
    #[snafu(display("step spec '{spec}' is missing a numeric value"))]
    MissingNumber {
        /// The original spec string.
        spec: String,
    },

    /// The spec did not include a required unit suffix.
    #[snafu(display("step spec '{spec}' is missing a unit suffix (expected s|m|h|d)"))]
    MissingUnit {
        /// The original spec string.
        spec: String,
    },

    /// The numeric portion of the spec failed to parse.
    #[snafu(display("invalid step value in '{spec}': {source}"))]
    InvalidNumber {
        /// The original spec string.
        spec: String,
        /// The parse error returned by `u64::from_str`.
        source: std::num::ParseIntError,
    },

    /// The parsed numeric value was zero.
    #[snafu(display("step value must be > 0 (got {value}) in '{spec}'"))]
    NonPositive {
        /// The original spec string.
        spec: String,
        /// The parsed numeric value.
        value: u64,
    },

    /// The parsed numeric value did not fit in a `u32`.
    #[snafu(display("step value too large for u32 (got {value}) in '{spec}'"))]
    TooLarge {
        /// The original spec string.
        spec: String,
        /// The parsed numeric value.
        value: u64,
    },

    /// The spec used an unsupported unit suffix.
    #[snafu(display("unknown step unit '{unit}' in '{spec}' (expected s|m|h|d)"))]
    UnknownUnit {
        /// The original spec string.
        spec: String,
        /// The unrecognized unit suffix.
        unit: String,
    },
}

/// A fixed, positive grid spacing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Step {
    /// A step spanning a fixed number of seconds.
    Seconds(u32),
    /// A step spanning a fixed number of minutes.
    Minutes(u32),
    /// A step spanning a fixed number of hours.
    Hours(u32),
    /// A step spanning a fixed number of days.
    Days(u32),
}

impl Step {
    /// Parse a step spec (e.g. `1h`, `15m`, `30s`, `2d`).
    ///
    /// Accepts the common unit aliases `sec`, `min`, `hr`, `day` and their
    /// plurals.
    ///
    /// # Errors
    /// Returns [`ParseStepError`] if the spec is empty, missing a unit, has an
    /// invalid or non-positive number, overflows `u32`, or uses an unsupported
    /// unit.
    pub fn parse(spec: &str) -> Result<Self, ParseStepError> {
        spec.parse()
    }

    /// Step length in whole seconds.
    pub fn len_secs(&self) -> i64 {
        match *self {
            Step::Seconds(n) => n as i64,
            Step::Minutes(n) => (n as i64) * SECONDS_PER_MINUTE,
            Step::Hours(n) => (n as i64) * SECONDS_PER_HOUR,
            Step::Days(n) => (n as i64) * SECONDS_PER_DAY,
        }
    }

    /// Step length as a `chrono::Duration`.
    pub fn to_duration(&self) -> Duration {
        Duration::seconds(self.len_secs())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Step::Seconds(n) => write!(f, "{n}s"),
            Step::Minutes(n) => write!(f, "{n}m"),
            Step::Hours(n) => write!(f, "{n}h"),
            Step::Days(n) => write!(f, "{n}d"),
        }
    }
}

impl FromStr for Step {
    type Err = ParseStepError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let spec = input.trim();
        if spec.is_empty() {
            return Err(ParseStepError::Empty);
        }

        // Numeric prefix + unit suffix; the unit starts at the first alphabetic char.
        let Some(unit_start) = spec
            .char_indices()
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i)
        else {
            return MissingUnitSnafu { spec }.fail();
        };

        if unit_start == 0 {
            return MissingNumberSnafu { spec }.fail();
        }

        let (num_str, unit_str) = spec.split_at(unit_start);
        let unit_str = unit_str.trim();
        let make: fn(u32) -> Step = match unit_str.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Step::Seconds,
            "m" | "min" | "mins" | "minute" | "minutes" => Step::Minutes,
            "h" | "hr" | "hrs" | "hour" | "hours" => Step::Hours,
            "d" | "day" | "days" => Step::Days,
            _ => {
                return UnknownUnitSnafu {
                    spec,
                    unit: unit_str,
                }
                .fail();
            }
        };

        let value: u64 = num_str
            .trim()
            .parse()
            .context(InvalidNumberSnafu { spec })?;

        ensure!(value > 0, NonPositiveSnafu { spec, value });
        ensure!(value <= u32::MAX as u64, TooLargeSnafu { spec, value });

        Ok(make(value as u32))
    }
}
