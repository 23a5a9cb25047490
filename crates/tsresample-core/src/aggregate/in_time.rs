//! Aggregate an arbitrary-rank array along its time axis into coarser windows.
//!
//! Source steps and target windows are both described by edge arrays: step
//! `j` spans `edges_src[j]..edges_src[j + 1]` and window `i` spans
//! `edges_trg[i]..edges_trg[i + 1]`.
//!
//! Membership is decided by edge containment, without partial weighting: all
//! source edges inside the closed window `[edges_trg[i], edges_trg[i + 1]]`
//! are collected, and the steps *starting* at every matched edge but the
//! last one are reduced. `k` matched edges therefore select `k - 1` steps.
//! Windows selecting no step are NaN.

use chrono::{DateTime, Utc};
use ndarray::{Array, ArrayView, ArrayView1, Axis, Dimension, RemoveAxis, Slice};
use snafu::prelude::*;

use crate::{
    aggregate::{map_windows, validate_edges},
    error::{AggregateResult, AxisOutOfBoundsSnafu, LengthMismatchSnafu},
    reduce::Reduction,
};

/// Source step range reduced into target window `[lo_edge, hi_edge]`.
///
/// Returns an empty range when fewer than two source edges fall inside.
pub fn steps_in_window(
    edges_src: &[DateTime<Utc>],
    lo_edge: DateTime<Utc>,
    hi_edge: DateTime<Utc>,
) -> std::ops::Range<usize> {
    let first = edges_src.partition_point(|e| *e < lo_edge);
    let past_last = edges_src.partition_point(|e| *e <= hi_edge);
    if past_last <= first + 1 {
        return first..first;
    }
    first..past_last - 1
}

pub(crate) fn reduce_lane(reduction: Reduction, lane: ArrayView1<'_, f64>) -> f64 {
    match lane.as_slice() {
        Some(values) => reduction.apply(values),
        None => reduction.apply(&lane.to_vec()),
    }
}

/// Aggregate `src` along `axis` from `edges_src` steps into `edges_trg` windows.
///
/// The output has the same shape as `src` except along `axis`, whose length
/// becomes `edges_trg.len() - 1`.
///
/// # Errors
/// `InvalidArgument`-class errors when `axis` is out of bounds, the edge
/// arrays are too short or not ascending, or `edges_src.len()` differs from
/// the number of source steps plus one.
pub fn aggregate_in_time<D>(
    src: ArrayView<'_, f64, D>,
    edges_src: &[DateTime<Utc>],
    edges_trg: &[DateTime<Utc>],
    axis: usize,
    reduction: Reduction,
) -> AggregateResult<Array<f64, D>>
where
    D: Dimension + RemoveAxis,
{
    let ndim = src.ndim();
    ensure!(axis < ndim, AxisOutOfBoundsSnafu { axis, ndim });
    let n_steps = src.len_of(Axis(axis));
    ensure!(
        edges_src.len() == n_steps + 1,
        LengthMismatchSnafu {
            what: "source edges vs. source steps + 1",
            expected: n_steps + 1,
            actual: edges_src.len(),
        }
    );
    validate_edges("source edges", edges_src)?;
    validate_edges("target edges", edges_trg)?;

    let n_windows = edges_trg.len() - 1;
    let mut shape = src.raw_dim();
    shape[axis] = n_windows;
    let mut out = Array::from_elem(shape, f64::NAN);

    let reduced = map_windows(n_windows, |i| {
        let steps = steps_in_window(edges_src, edges_trg[i], edges_trg[i + 1]);
        if steps.is_empty() {
            return None;
        }
        let selected = src.slice_axis(Axis(axis), Slice::from(steps));
        Some(selected.map_axis(Axis(axis), |lane| reduce_lane(reduction, lane)))
    });

    for (i, lanes) in reduced.into_iter().enumerate() {
        if let Some(lanes) = lanes {
            out.index_axis_mut(Axis(axis), i).assign(&lanes);
        }
    }
    Ok(out)
}
