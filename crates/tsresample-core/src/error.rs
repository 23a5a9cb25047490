//! Error types and SNAFU context selectors for the aggregation engine.
//!
//! `AggregateError` is the single error returned by every public aggregator.
//! Its variants fall into two families (see [`ErrorKind`]):
//!
//! - configuration problems detected before any window is evaluated
//!   (`InvalidArgument`), and
//! - malformed timestamp / duration strings coming from the boundary input
//!   types (`Parse`).
//!
//! Data-quality issues inside individual windows are never errors; they are
//! absorbed into the result as NaN.

use chrono::{DateTime, Utc};
use snafu::prelude::*;

use crate::{reduce::ParseReductionError, time_input::ParseTimeError};

/// Convenience alias used throughout the crate.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Coarse classification of an [`AggregateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed configuration: the call was aborted before producing output.
    InvalidArgument,
    /// A timestamp or duration string could not be parsed.
    Parse,
}

/// Errors from the temporal aggregation engine.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AggregateError {
    /// A grid step (or source/target resolution) was zero or negative.
    #[snafu(display("{what} must be positive (got {seconds} s)"))]
    NonPositiveStep {
        /// Which parameter carried the step.
        what: &'static str,
        /// The offending value in seconds.
        seconds: f64,
    },

    /// The start of a range lies after its end.
    #[snafu(display("Invalid range: start={start}, end={end} (expect start <= end)"))]
    StartAfterEnd {
        /// Lower bound supplied by the caller.
        start: DateTime<Utc>,
        /// Upper bound supplied by the caller.
        end: DateTime<Utc>,
    },

    /// The target resolution is not an integer multiple of the source resolution.
    #[snafu(display(
        "Target resolution {target_secs} s is not a multiple of source resolution {source_secs} s"
    ))]
    NotMultiple {
        /// Target step in seconds.
        target_secs: f64,
        /// Source step in seconds.
        source_secs: f64,
    },

    /// A step is too long to be counted in nanoseconds.
    #[snafu(display("{what} of {seconds} s is too long to resolve in nanoseconds"))]
    StepOutOfRange {
        /// Which parameter carried the step.
        what: &'static str,
        /// The offending value in seconds.
        seconds: f64,
    },

    /// The target window holds more source slots than can be tracked.
    #[snafu(display(
        "Target/source resolution ratio {ratio} exceeds the limit of {limit} slots per window"
    ))]
    TooManySlots {
        /// Number of source steps per target window.
        ratio: i64,
        /// Largest supported number of slots.
        limit: u32,
    },

    /// Two arrays that must be aligned have incompatible lengths.
    #[snafu(display("Length mismatch: {what} (expected {expected}, got {actual})"))]
    LengthMismatch {
        /// Description of the relationship that was violated.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A sequence of time stamps is not in ascending order.
    #[snafu(display("{what} are not in chronological order (first violation at index {index})"))]
    NotAscending {
        /// Which sequence was out of order.
        what: &'static str,
        /// Index of the first element smaller than its predecessor.
        index: usize,
    },

    /// An edge array must hold at least two edges to define one window.
    #[snafu(display("{what} must contain at least 2 edges (got {actual})"))]
    TooFewEdges {
        /// Which edge array was too short.
        what: &'static str,
        /// Number of edges supplied.
        actual: usize,
    },

    /// The designated time axis does not exist in the source array.
    #[snafu(display("Time axis {axis} is out of bounds for an array of rank {ndim}"))]
    AxisOutOfBounds {
        /// Requested axis.
        axis: usize,
        /// Rank of the source array.
        ndim: usize,
    },

    /// The source series holds no samples at all.
    #[snafu(display("{what} is empty"))]
    EmptySource {
        /// Which input was empty.
        what: &'static str,
    },

    /// The maximum-distance tolerance was negative or not finite.
    #[snafu(display("max_dist must be a finite, non-negative number of seconds (got {value})"))]
    InvalidMaxDist {
        /// The offending tolerance.
        value: f64,
    },

    /// A coverage threshold outside `[0, 100]` was supplied.
    #[snafu(display("min_valid_percent must lie in [0, 100] (got {value})"))]
    InvalidThreshold {
        /// The offending threshold.
        value: f64,
    },

    /// A timestamp or duration string could not be parsed.
    #[snafu(transparent)]
    Parse {
        /// Underlying parse failure.
        source: ParseTimeError,
    },

    /// A reduction name did not resolve to a known reduction.
    #[snafu(transparent)]
    UnknownReduction {
        /// Underlying lookup failure.
        source: ParseReductionError,
    },
}

impl AggregateError {
    /// Classify this error into the engine's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AggregateError::Parse { .. } => ErrorKind::Parse,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

/// Ensure `stamps` is non-decreasing, reporting the first violation.
pub(crate) fn ensure_ascending<T: PartialOrd>(
    what: &'static str,
    stamps: &[T],
) -> AggregateResult<()> {
    if let Some(index) = stamps.windows(2).position(|w| w[1] < w[0]) {
        return NotAscendingSnafu {
            what,
            index: index + 1,
        }
        .fail();
    }
    Ok(())
}
