//! Temporal aggregators.
//!
//! Each submodule is one independent, pure transformation from a source
//! series onto target windows:
//!
//! - [`equidistant`]: regular, possibly gappy source onto a regular target
//!   grid, with a per-window coverage threshold.
//! - [`in_time`]: arbitrary-rank array aggregated along a time axis into
//!   windows given by explicit edges, with a named reduction.
//! - [`overlap`]: exact duration-weighted mean of an interval series over
//!   arbitrary windows.
//! - [`interpolated`]: approximate windowed mean of an irregular series via
//!   a dense helper grid, linear interpolation and distance masking.
//! - [`sum_windows`]: windowed sum of an interval series with a tolerance
//!   for missing values.
//!
//! Windows never share state, so they may be evaluated in parallel (feature
//! `parallel`); results are identical to the sequential path because every
//! window is reduced in the same order either way.

use chrono::{DateTime, Utc};
use snafu::prelude::*;

use crate::error::{AggregateResult, InvalidThresholdSnafu, TooFewEdgesSnafu, ensure_ascending};

pub mod equidistant;
pub mod in_time;
pub mod interpolated;
pub mod overlap;
pub mod sum_windows;

/// Evaluate `f` for every window index `0..n`, preserving order.
#[cfg(not(feature = "parallel"))]
pub(crate) fn map_windows<T, F>(n: usize, f: F) -> Vec<T>
where
    F: Fn(usize) -> T,
{
    (0..n).map(f).collect()
}

/// Evaluate `f` for every window index `0..n` on the rayon pool, preserving order.
#[cfg(feature = "parallel")]
pub(crate) fn map_windows<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    use rayon::prelude::*;

    (0..n).into_par_iter().map(f).collect()
}

/// Validate an edge array: at least two edges, non-decreasing.
pub(crate) fn validate_edges(what: &'static str, edges: &[DateTime<Utc>]) -> AggregateResult<()> {
    ensure!(
        edges.len() >= 2,
        TooFewEdgesSnafu {
            what,
            actual: edges.len(),
        }
    );
    ensure_ascending(what, edges)
}

/// Validate a coverage threshold given in percent.
pub(crate) fn validate_threshold(min_valid_percent: f64) -> AggregateResult<()> {
    ensure!(
        (0.0..=100.0).contains(&min_valid_percent),
        InvalidThresholdSnafu {
            value: min_valid_percent,
        }
    );
    Ok(())
}
