//! Regular time grids and time-stamp arithmetic.
//!
//! - [`from_to`] builds `start, start + step, ...` up to and including the
//!   last grid point that does not exceed `end`.
//! - [`RegularGrid`] bundles `(start, end, step)` and turns the grid into
//!   target windows: consecutive grid points form `(start, end)` pairs, so a
//!   grid of `n + 1` points defines `n` windows. A trailing partial window
//!   (when `end - start` is not a multiple of `step`) is dropped.
//! - [`timestamp_to_index`] maps an instant to its index in an equidistant
//!   series.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{
    error::{AggregateError, AggregateResult, NonPositiveStepSnafu, StartAfterEndSnafu},
    time_input::{DurationInput, TimeInput},
};

/// Duration as fractional seconds (nanosecond precision where representable).
pub fn duration_secs(d: Duration) -> f64 {
    match d.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => d.num_milliseconds() as f64 / 1e3,
    }
}

/// Instant as fractional seconds since the Unix epoch.
pub fn epoch_secs(t: DateTime<Utc>) -> f64 {
    t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9
}

fn ensure_positive_step(what: &'static str, step: Duration) -> AggregateResult<()> {
    ensure!(
        step > Duration::zero(),
        NonPositiveStepSnafu {
            what,
            seconds: duration_secs(step),
        }
    );
    Ok(())
}

/// Return the grid `start, start + step, start + 2 * step, ...` up to `end`.
///
/// The result always contains `start`; every subsequent point is included
/// as long as it does not exceed `end`.
///
/// # Errors
/// - [`AggregateError::NonPositiveStep`] if `step <= 0`.
/// - [`AggregateError::StartAfterEnd`] if `start > end`.
pub fn from_to(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> AggregateResult<Vec<DateTime<Utc>>> {
    ensure_positive_step("grid step", step)?;
    ensure!(start <= end, StartAfterEndSnafu { start, end });
    Ok(grid_points(start, end, step))
}

fn grid_points(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Vec<DateTime<Utc>> {
    let mut out = vec![start];
    let mut cur = start;
    loop {
        let Some(next) = cur.checked_add_signed(step) else {
            break;
        };
        if next > end {
            break;
        }
        out.push(next);
        cur = next;
    }
    out
}

/// Index of `ts` in an equidistant series whose index 0 lies at `reference`.
///
/// Offsets are counted in whole seconds and divided with floor semantics,
/// so instants before `reference` map to negative indices.
///
/// # Errors
/// [`AggregateError::NonPositiveStep`] if `delta` is shorter than one second.
pub fn timestamp_to_index(
    ts: DateTime<Utc>,
    delta: Duration,
    reference: DateTime<Utc>,
) -> AggregateResult<i64> {
    let delta_secs = delta.num_seconds();
    ensure!(
        delta_secs > 0,
        NonPositiveStepSnafu {
            what: "index delta",
            seconds: duration_secs(delta),
        }
    );
    let offset_secs = (ts - reference).num_seconds();
    Ok(offset_secs.div_euclid(delta_secs))
}

/// [`timestamp_to_index`] over boundary inputs (text or native values).
pub fn timestamp_to_index_from(
    ts: impl Into<TimeInput>,
    delta: impl Into<DurationInput>,
    reference: impl Into<TimeInput>,
) -> AggregateResult<i64> {
    let ts = ts.into().resolve()?;
    let delta = delta.into().resolve()?;
    let reference = reference.into().resolve()?;
    timestamp_to_index(ts, delta, reference)
}

/// A validated regular grid `(start, end, step)`.
///
/// Serializes `step` as whole nanoseconds. Deserializing runs the same
/// checks as [`RegularGrid::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRegularGrid")]
pub struct RegularGrid {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(with = "duration_as_nanos")]
    step: Duration,
}

#[derive(Deserialize)]
struct RawRegularGrid {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(with = "duration_as_nanos")]
    step: Duration,
}

impl RegularGrid {
    /// Validate and build a grid.
    ///
    /// # Errors
    /// Same conditions as [`from_to`].
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> AggregateResult<Self> {
        ensure_positive_step("grid step", step)?;
        ensure!(start <= end, StartAfterEndSnafu { start, end });
        Ok(Self { start, end, step })
    }

    /// Resolve boundary inputs once and build a grid.
    pub fn parse(
        start: impl Into<TimeInput>,
        end: impl Into<TimeInput>,
        step: impl Into<DurationInput>,
    ) -> AggregateResult<Self> {
        let start = start.into().resolve()?;
        let end = end.into().resolve()?;
        let step = step.into().resolve()?;
        Self::new(start, end, step)
    }

    /// First grid point.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Requested upper bound (not necessarily a grid point).
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Grid spacing.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// All grid points (see [`from_to`]).
    pub fn points(&self) -> Vec<DateTime<Utc>> {
        grid_points(self.start, self.end, self.step)
    }

    /// Window `(start, end)` pairs formed by consecutive grid points.
    pub fn windows(&self) -> (Vec<DateTime<Utc>>, Vec<DateTime<Utc>>) {
        let points = self.points();
        let starts = points[..points.len() - 1].to_vec();
        let ends = points[1..].to_vec();
        (starts, ends)
    }
}

impl TryFrom<(DateTime<Utc>, DateTime<Utc>, Duration)> for RegularGrid {
    type Error = AggregateError;

    fn try_from(value: (DateTime<Utc>, DateTime<Utc>, Duration)) -> Result<Self, Self::Error> {
        Self::new(value.0, value.1, value.2)
    }
}

impl TryFrom<RawRegularGrid> for RegularGrid {
    type Error = AggregateError;

    fn try_from(raw: RawRegularGrid) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end, raw.step)
    }
}

mod duration_as_nanos {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer, ser::Error};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let nanos = d
            .num_nanoseconds()
            .ok_or_else(|| S::Error::custom("duration does not fit in i64 nanoseconds"))?;
        s.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::nanoseconds(i64::deserialize(d)?))
    }
}
