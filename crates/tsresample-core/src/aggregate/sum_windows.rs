//! Windowed sum of an interval series that tolerates some missing values.
//!
//! Source step `j` spans `edges_src[j]..edges_src[j + 1]`. Target window `i`
//! is the half-open interval `(edges_trg[i], edges_trg[i + 1]]` and collects
//! every step whose *end* edge falls inside it.

use chrono::{DateTime, Utc};
use snafu::prelude::*;
use tracing::debug;

use crate::{
    aggregate::{map_windows, validate_edges, validate_threshold},
    error::{AggregateResult, LengthMismatchSnafu},
    reduce::Reduction,
};

/// Source steps whose end edge lies in `(a, b]`.
pub fn steps_ending_in(
    edges_src: &[DateTime<Utc>],
    a: DateTime<Utc>,
    b: DateTime<Utc>,
) -> std::ops::Range<usize> {
    // Edge 0 closes no step.
    let ends = edges_src.get(1..).unwrap_or_default();
    let first = ends.partition_point(|e| *e <= a);
    let past_last = ends.partition_point(|e| *e <= b);
    first..past_last.max(first)
}

/// Sum `src` over each target window.
///
/// A window is summed (NaN-skipping) when at least `min_valid_percent` of its
/// steps are not NaN, otherwise it is NaN. Windows selecting no step are NaN.
///
/// # Errors
/// `InvalidArgument`-class errors when the edge arrays are too short or not
/// ascending, `edges_src.len()` is not `src.len() + 1`, or the threshold lies
/// outside `[0, 100]`.
pub fn sum_over_time_windows(
    src: &[f64],
    edges_src: &[DateTime<Utc>],
    edges_trg: &[DateTime<Utc>],
    min_valid_percent: f64,
) -> AggregateResult<Vec<f64>> {
    ensure!(
        edges_src.len() == src.len() + 1,
        LengthMismatchSnafu {
            what: "source edges vs. source steps + 1",
            expected: src.len() + 1,
            actual: edges_src.len(),
        }
    );
    validate_edges("source edges", edges_src)?;
    validate_edges("target edges", edges_trg)?;
    validate_threshold(min_valid_percent)?;

    let sums = map_windows(edges_trg.len() - 1, |i| {
        let steps = steps_ending_in(edges_src, edges_trg[i], edges_trg[i + 1]);
        if steps.is_empty() {
            return f64::NAN;
        }
        let values = &src[steps];
        let valid = values.iter().filter(|v| !v.is_nan()).count();
        let fraction = valid as f64 / values.len() as f64;
        if fraction * 100.0 >= min_valid_percent {
            Reduction::NanSum.apply(values)
        } else {
            debug!(window = i, valid, total = values.len(), "too few valid steps");
            f64::NAN
        }
    });
    Ok(sums)
}
