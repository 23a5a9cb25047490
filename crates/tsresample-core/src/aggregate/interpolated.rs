//! Approximate windowed mean of an irregular series via a helper grid.
//!
//! This is an approximation, kept separate from the exact weighting in
//! [`crate::aggregate::overlap`]:
//!
//! 1. A regular helper grid is laid over `[edges_trg[0], edges_trg[last])`
//!    at `helper_interval_secs` spacing.
//! 2. Source rows are linearly interpolated onto the helper grid. Helper
//!    points outside the sampled range take the value of their nearest
//!    source sample.
//! 3. Every helper point farther than `max_dist_secs` from its nearest source
//!    sample is masked to NaN, so gaps in the source are not bridged by
//!    interpolation.
//! 4. Each target window `[start, end]` averages its unmasked helper values.
//!    Windows without any unmasked helper value are NaN.

use chrono::{DateTime, Utc};
use ndarray::{Array, ArrayView, Axis, Dimension, RemoveAxis, Slice};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{
    aggregate::{in_time::reduce_lane, map_windows, validate_edges},
    error::{
        AggregateResult, EmptySourceSnafu, InvalidMaxDistSnafu, LengthMismatchSnafu,
        NonPositiveStepSnafu, ensure_ascending,
    },
    grid::epoch_secs,
    helpers::{interp::interpolate_row, nearest::NearestIndex},
    reduce::Reduction,
};

/// Tunables of [`average_over_time_windows`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationParams {
    /// Helper points farther than this from every source sample are masked.
    pub max_dist_secs: f64,
    /// Spacing of the helper grid.
    pub helper_interval_secs: f64,
}

impl Default for InterpolationParams {
    fn default() -> Self {
        Self {
            max_dist_secs: 3600.0,
            helper_interval_secs: 300.0,
        }
    }
}

/// Helper grid of the interpolated aggregator.
#[derive(Debug, Clone)]
pub struct HelperSeries<D: Dimension> {
    /// Helper positions in seconds after the first target edge.
    pub secs: Vec<f64>,
    /// Helper rows (axis 0 aligned with `secs`); masked points are NaN.
    pub values: Array<f64, D>,
}

/// Interpolate and mask `src` onto the helper grid spanning `edges_trg`.
///
/// Inputs are validated as in [`average_over_time_windows`].
pub fn helper_series<D>(
    src: ArrayView<'_, f64, D>,
    stamps_src: &[DateTime<Utc>],
    edges_trg: &[DateTime<Utc>],
    params: &InterpolationParams,
) -> AggregateResult<HelperSeries<D>>
where
    D: Dimension + RemoveAxis,
{
    validate(&src, stamps_src, edges_trg, params)?;

    let origin = epoch_secs(edges_trg[0]);
    let span = epoch_secs(edges_trg[edges_trg.len() - 1]) - origin;
    let src_secs: Vec<f64> = stamps_src.iter().map(|t| epoch_secs(*t) - origin).collect();

    let h = params.helper_interval_secs;
    let secs: Vec<f64> = (0u64..)
        .map(|k| k as f64 * h)
        .take_while(|&x| x < span)
        .collect();

    let mut shape = src.raw_dim();
    shape[0] = secs.len();
    let mut values = Array::from_elem(shape, f64::NAN);
    let nearest = NearestIndex::new(&src_secs);

    for (k, &x) in secs.iter().enumerate() {
        let Some((ix, dist)) = nearest.query(x) else {
            continue;
        };
        if dist > params.max_dist_secs {
            // Masked regardless of what interpolation would produce.
            continue;
        }
        let mut row = values.index_axis_mut(Axis(0), k);
        match interpolate_row(&src_secs, &src, x) {
            Some(interpolated) => row.assign(&interpolated),
            // Outside the sampled range: patch from the nearest sample.
            None => row.assign(&src.index_axis(Axis(0), ix)),
        }
    }

    Ok(HelperSeries { secs, values })
}

/// Approximate mean of an irregular series over each target window.
///
/// `src` holds one row per source time stamp (axis 0 = time). The output
/// keeps the trailing dimensions of `src`; axis 0 gets length
/// `edges_trg.len() - 1`.
///
/// # Errors
/// `InvalidArgument`-class errors when the source is empty, stamps and rows
/// differ in count, stamps or edges are not ascending, fewer than two target
/// edges are given, the helper interval is not positive or `max_dist_secs`
/// is negative.
pub fn average_over_time_windows<D>(
    src: ArrayView<'_, f64, D>,
    stamps_src: &[DateTime<Utc>],
    edges_trg: &[DateTime<Utc>],
    params: &InterpolationParams,
) -> AggregateResult<Array<f64, D>>
where
    D: Dimension + RemoveAxis,
{
    let helpers = helper_series(src.view(), stamps_src, edges_trg, params)?;

    let origin = epoch_secs(edges_trg[0]);
    let trg_secs: Vec<f64> = edges_trg.iter().map(|t| epoch_secs(*t) - origin).collect();
    let n_windows = edges_trg.len() - 1;

    let mut shape = src.raw_dim();
    shape[0] = n_windows;
    let mut out = Array::from_elem(shape, f64::NAN);

    let means = map_windows(n_windows, |i| {
        let lo = helpers.secs.partition_point(|&x| x < trg_secs[i]);
        let hi = helpers.secs.partition_point(|&x| x <= trg_secs[i + 1]);
        if lo >= hi {
            return None;
        }
        let inside = helpers.values.slice_axis(Axis(0), Slice::from(lo..hi));
        Some(inside.map_axis(Axis(0), |lane| reduce_lane(Reduction::NanMean, lane)))
    });

    for (i, mean) in means.into_iter().enumerate() {
        if let Some(mean) = mean {
            out.index_axis_mut(Axis(0), i).assign(&mean);
        }
    }
    Ok(out)
}

fn validate<D: Dimension>(
    src: &ArrayView<'_, f64, D>,
    stamps_src: &[DateTime<Utc>],
    edges_trg: &[DateTime<Utc>],
    params: &InterpolationParams,
) -> AggregateResult<()> {
    ensure!(src.ndim() > 0, EmptySourceSnafu { what: "source array" });
    let n = src.len_of(Axis(0));
    ensure!(n > 0, EmptySourceSnafu { what: "source array" });
    ensure!(
        stamps_src.len() == n,
        LengthMismatchSnafu {
            what: "source stamps vs. source rows",
            expected: n,
            actual: stamps_src.len(),
        }
    );
    ensure_ascending("source stamps", stamps_src)?;
    validate_edges("target edges", edges_trg)?;
    ensure!(
        params.helper_interval_secs.is_finite() && params.helper_interval_secs > 0.0,
        NonPositiveStepSnafu {
            what: "helper interval",
            seconds: params.helper_interval_secs,
        }
    );
    ensure!(
        params.max_dist_secs.is_finite() && params.max_dist_secs >= 0.0,
        InvalidMaxDistSnafu {
            value: params.max_dist_secs,
        }
    );
    Ok(())
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

    fn params(max_dist_min: f64, helper_min: f64) -> InterpolationParams {
        InterpolationParams {
            max_dist_secs: max_dist_min * 60.0,
            helper_interval_secs: helper_min * 60.0,
        }
    }

    #[test]
    fn constant_series_averages_to_itself() {
        let src: Array1<f64> = array![2.0, 2.0, 2.0, 2.0];
        let stamps = minutes(&[0, 20, 40, 60]);
        let out = average_over_time_windows(
            src.view(),
            &stamps,
            &minutes(&[0, 30, 60]),
            &InterpolationParams::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn linear_ramp_averages_helper_values() {
        // value == minutes since base
        let src: Array1<f64> = array![0.0, 60.0];
        let stamps = minutes(&[0, 60]);
        let out = average_over_time_windows(
            src.view(),
            &stamps,
            &minutes(&[0, 30, 60]),
            &params(60.0, 10.0),
        )
        .unwrap();
        // Helpers at 0,10,...,50; window [0,30] holds 0,10,20,30 and [30,60] holds 30,40,50.
        assert!((out[0] - 15.0).abs() < 1e-9);
        assert!((out[1] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn helpers_far_from_any_sample_are_masked() {
        let src: Array1<f64> = array![1.0, 3.0];
        let stamps = minutes(&[0, 120]);
        let helpers =
            helper_series(src.view(), &stamps, &minutes(&[0, 120]), &params(30.0, 10.0)).unwrap();
        assert_eq!(helpers.secs.len(), 12);
        for (x, v) in helpers.secs.iter().zip(helpers.values.iter()) {
            let dist_min = (x / 60.0).min(120.0 - x / 60.0);
            if dist_min > 30.0 {
                assert!(v.is_nan(), "helper at {x}s should be masked");
            } else {
                assert!(!v.is_nan(), "helper at {x}s should be kept");
            }
        }
    }

    #[test]
    fn fully_masked_window_is_nan() {
        let src: Array1<f64> = array![1.0, 3.0];
        let stamps = minutes(&[0, 120]);
        let out = average_over_time_windows(
            src.view(),
            &stamps,
            &minutes(&[0, 30, 50, 70, 120]),
            &params(20.0, 5.0),
        )
        .unwrap();
        assert!(!out[0].is_nan());
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert!(!out[3].is_nan());
    }

    #[test]
    fn out_of_range_helpers_are_patched_from_nearest_sample() {
        let src: Array1<f64> = array![4.0, 8.0];
        let stamps = minutes(&[20, 40]);
        let helpers =
            helper_series(src.view(), &stamps, &minutes(&[0, 60]), &params(15.0, 10.0)).unwrap();
        // Helpers at 0..=50 min: 0 masked (20 min away), 10 patched from 4,
        // 20..40 interpolated, 50 patched from 8.
        let v = helpers.values;
        assert!(v[0].is_nan());
        assert_eq!(v[1], 4.0);
        assert_eq!(v[2], 4.0);
        assert_eq!(v[3], 6.0);
        assert_eq!(v[4], 8.0);
        assert_eq!(v[5], 8.0);
    }

    #[test]
    fn columns_are_averaged_independently() {
        let src: Array2<f64> = array![[0.0, 1.0], [60.0, 1.0]];
        let stamps = minutes(&[0, 60]);
        let out =
            average_over_time_windows(src.view(), &stamps, &minutes(&[0, 60]), &params(60.0, 30.0))
                .unwrap();
        assert_eq!(out.shape(), &[1, 2]);
        assert!((out[[0, 0]] - 15.0).abs() < 1e-9);
        assert_eq!(out[[0, 1]], 1.0);
    }

    #[test]
    fn rejects_bad_configuration() {
        let src: Array1<f64> = array![1.0];
        let stamps = minutes(&[0]);
        let edges = minutes(&[0, 60]);

        let err = average_over_time_windows(src.view(), &stamps, &edges, &params(10.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::NonPositiveStep { .. }));

        let err = average_over_time_windows(src.view(), &stamps, &edges, &params(-1.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::InvalidMaxDist { .. }));

        let empty: Array1<f64> = Array1::zeros(0);
        let err = average_over_time_windows(empty.view(), &[], &edges, &params(10.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::EmptySource { .. }));

        let err = average_over_time_windows(src.view(), &minutes(&[0, 5]), &edges, &params(10.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::LengthMismatch { .. }));
    }
}
