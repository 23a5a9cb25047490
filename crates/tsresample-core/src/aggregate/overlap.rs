//! Exact duration-weighted mean over arbitrary target windows.
//!
//! Source step `j` spans `edges_src[j]..edges_src[j + 1]` and carries the row
//! `src[j]` (axis 0 is time). For a target window `[a, b)` every source step
//! contributes the fraction of `b - a` that it overlaps:
//!
//! ```text
//!   a                                   b
//!   |-------- target window ------------|
//! --+---|---------|---------|-----------+--|
//!   left  inner     inner      right
//! ```
//!
//! The edges strictly inside `(a, b)` split the window into a left partial
//! interval (attributed to the step before the first inner edge), full inner
//! steps, and a right partial interval (attributed to the step starting at
//! the last inner edge). A window lying entirely within one step takes that
//! step's value.
//!
//! Windows reaching outside the source edges have no support for part of
//! their duration and yield NaN.

use chrono::{DateTime, Utc};
use ndarray::{Array, ArrayView, Axis, Dimension, RemoveAxis};
use snafu::prelude::*;

use crate::{
    aggregate::{map_windows, validate_edges},
    error::{AggregateResult, AxisOutOfBoundsSnafu, LengthMismatchSnafu},
    grid::duration_secs,
};

/// Per-step weights of window `[a, b)`: `(step index, fraction of b - a)`.
///
/// Returns `None` when part of the window is not covered by any source step
/// or the window has zero width.
pub fn overlap_weights(
    edges_src: &[DateTime<Utc>],
    a: DateTime<Utc>,
    b: DateTime<Utc>,
) -> Option<Vec<(usize, f64)>> {
    let width = duration_secs(b - a);
    if width <= 0.0 || edges_src.len() < 2 {
        return None;
    }
    let n_edges = edges_src.len();
    // Edges strictly inside (a, b).
    let lo = edges_src.partition_point(|e| *e <= a);
    let hi = edges_src.partition_point(|e| *e < b);

    // The step to the left of the first inner edge must start at or before `a`,
    // and the step starting at the last inner edge must reach `b`.
    if lo == 0 || lo == n_edges {
        return None;
    }

    if lo == hi {
        // No inner edge: the window sits inside step `lo - 1`.
        return Some(vec![(lo - 1, 1.0)]);
    }

    if hi == n_edges {
        return None;
    }

    let mut weights = Vec::with_capacity(hi - lo + 1);
    weights.push((lo - 1, duration_secs(edges_src[lo] - a) / width));
    for j in lo..hi - 1 {
        weights.push((j, duration_secs(edges_src[j + 1] - edges_src[j]) / width));
    }
    weights.push((hi - 1, duration_secs(b - edges_src[hi - 1]) / width));
    Some(weights)
}

/// Duration-weighted mean of `src` (axis 0 = time) over each target window.
///
/// The output keeps the trailing dimensions of `src`; axis 0 gets length
/// `edges_trg.len() - 1`.
///
/// # Errors
/// `InvalidArgument`-class errors when the edge arrays are too short or not
/// ascending, `src` has no time axis, or `edges_src.len()` is not the number
/// of source steps plus one.
pub fn mean_over_time_windows<D>(
    src: ArrayView<'_, f64, D>,
    edges_src: &[DateTime<Utc>],
    edges_trg: &[DateTime<Utc>],
) -> AggregateResult<Array<f64, D>>
where
    D: Dimension + RemoveAxis,
{
    ensure!(
        src.ndim() > 0,
        AxisOutOfBoundsSnafu {
            axis: 0usize,
            ndim: src.ndim(),
        }
    );
    let n_steps = src.len_of(Axis(0));
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
    shape[0] = n_windows;
    let mut out = Array::from_elem(shape, f64::NAN);
    let row_dim = src.raw_dim().remove_axis(Axis(0));

    let means = map_windows(n_windows, |i| {
        let weights = overlap_weights(edges_src, edges_trg[i], edges_trg[i + 1])?;
        let mut acc: Array<f64, D::Smaller> = Array::zeros(row_dim.clone());
        for (step, w) in weights {
            acc.scaled_add(w, &src.index_axis(Axis(0), step));
        }
        Some(acc)
    });

    for (i, mean) in means.into_iter().enumerate() {
        if let Some(mean) = mean {
            out.index_axis_mut(Axis(0), i).assign(&mean);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use ndarray::{Array1, Array2, array};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 6, 2, 0, 0, 0).unwrap()
    }

    fn minutes(ms: &[i64]) -> Vec<DateTime<Utc>> {
        ms.iter().map(|m| base() + Duration::minutes(*m)).collect()
    }

    #[test]
    fn aligned_windows_equal_plain_mean() {
        let src: Array1<f64> = array![1.0, 2.0, 3.0, 4.0];
        let edges = minutes(&[0, 15, 30, 45, 60]);
        let out = mean_over_time_windows(src.view(), &edges, &minutes(&[0, 30, 60])).unwrap();
        assert!((out[0] - 1.5).abs() < 1e-12);
        assert!((out[1] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn straddling_steps_contribute_their_overlap_only() {
        // Steps: [0,20) = 10, [20,40) = 40, [40,60) = 70.
        let src: Array1<f64> = array![10.0, 40.0, 70.0];
        let edges = minutes(&[0, 20, 40, 60]);
        // Window [10, 50): 10 min of step 0, 20 of step 1, 10 of step 2.
        let out = mean_over_time_windows(src.view(), &edges, &minutes(&[10, 50])).unwrap();
        let expected = (10.0 * 10.0 + 20.0 * 40.0 + 10.0 * 70.0) / 40.0;
        assert!((out[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn weights_sum_to_one() {
        let edges = minutes(&[0, 7, 19, 23, 41, 60]);
        for (a, b) in [(1, 59), (7, 23), (3, 5), (0, 60), (22, 42)] {
            let (start, end) = (base() + Duration::minutes(a), base() + Duration::minutes(b));
            let w = overlap_weights(&edges, start, end).unwrap();
            let total: f64 = w.iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-12, "window ({a}, {b}) sums to {total}");
        }
    }

    #[test]
    fn window_inside_one_step_takes_its_value() {
        let src: Array1<f64> = array![5.0, 9.0];
        let edges = minutes(&[0, 30, 60]);
        let out = mean_over_time_windows(src.view(), &edges, &minutes(&[35, 50])).unwrap();
        assert_eq!(out[0], 9.0);
    }

    #[test]
    fn windows_outside_the_source_are_nan() {
        let src: Array1<f64> = array![1.0, 1.0];
        let edges = minutes(&[10, 20, 30]);
        let out =
            mean_over_time_windows(src.view(), &edges, &minutes(&[0, 15, 25, 40, 50])).unwrap();
        assert!(out[0].is_nan());
        assert_eq!(out[1], 1.0);
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
    }

    #[test]
    fn weights_apply_per_column() {
        let src: Array2<f64> = array![[0.0, 100.0], [10.0, 200.0]];
        let edges = minutes(&[0, 10, 20]);
        let out = mean_over_time_windows(src.view(), &edges, &minutes(&[5, 15])).unwrap();
        assert_eq!(out.shape(), &[1, 2]);
        assert!((out[[0, 0]] - 5.0).abs() < 1e-12);
        assert!((out[[0, 1]] - 150.0).abs() < 1e-12);
    }

    #[test]
    fn nan_in_a_contributing_step_propagates() {
        let src: Array1<f64> = array![1.0, f64::NAN, 3.0];
        let edges = minutes(&[0, 10, 20, 30]);
        let out = mean_over_time_windows(src.view(), &edges, &minutes(&[0, 10, 30])).unwrap();
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
    }

    #[test]
    fn rejects_misaligned_edges() {
        let src: Array1<f64> = array![1.0, 2.0];
        let err = mean_over_time_windows(src.view(), &minutes(&[0, 10]), &minutes(&[0, 10]))
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::LengthMismatch { .. }));
    }

    #[test]
    fn rejects_zero_dimensional_source() {
        let src = ndarray::arr0(1.0).into_dyn();
        let err = mean_over_time_windows(src.view(), &minutes(&[0, 10]), &minutes(&[0, 10]))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::AggregateError::AxisOutOfBounds { axis: 0, ndim: 0 }
        ));
    }
}
