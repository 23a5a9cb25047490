//! Equidistant source series onto an equidistant target grid.
//!
//! Both grids are regular and the source step divides the target step, so
//! every target window `(start, end]` expects exactly
//! `n = target_step / source_step` source slots whose end stamps are
//! `start + k * source_step` for `k = 1..=n`.
//!
//! The source may have gaps (missing end stamps) and NaN values. For each
//! window:
//!
//! 1. Source entries whose end stamp falls in `(start, end]` are mapped onto
//!    the expected slots. An entry that does not land on a slot, or lands on
//!    a slot already taken, makes the window *inconsistent*: its value is
//!    NaN and it is counted once in
//!    [`EquidistantAggregate::inconsistent_windows`].
//! 2. Otherwise the fraction of slots holding a non-NaN value is compared
//!    against `min_valid_percent / 100`. Windows at or above the threshold
//!    get the NaN-skipping sum or mean; the rest stay NaN.
//!
//! A single `warn!` summarises inconsistencies after all windows are done.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::{
    aggregate::{map_windows, validate_threshold},
    coverage::{Coverage, Slot, expected_slots},
    error::{
        AggregateResult, LengthMismatchSnafu, NonPositiveStepSnafu, NotMultipleSnafu,
        StepOutOfRangeSnafu, TooManySlotsSnafu, ensure_ascending,
    },
    grid::{RegularGrid, duration_secs},
    reduce::AccumulationMethod,
};

/// Tunables of [`aggregate_equidistant`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquidistantParams {
    /// How valid values inside a window are combined.
    pub method: AccumulationMethod,
    /// Minimum percentage of expected source slots that must hold a valid
    /// value for the window to get an aggregate.
    pub min_valid_percent: f64,
}

impl Default for EquidistantParams {
    fn default() -> Self {
        Self {
            method: AccumulationMethod::Sum,
            min_valid_percent: 100.0,
        }
    }
}

/// A regular source series described by the END stamp of each step.
#[derive(Debug, Clone, Copy)]
pub struct EquidistantSeries<'a> {
    /// End stamp of every source step, ascending.
    pub ends: &'a [DateTime<Utc>],
    /// Length of every source step.
    pub step: Duration,
    /// One value per end stamp; NaN marks a missing value.
    pub values: &'a [f64],
}

/// Output of [`aggregate_equidistant`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquidistantAggregate {
    /// Start of each target window.
    pub starts: Vec<DateTime<Utc>>,
    /// End of each target window.
    pub ends: Vec<DateTime<Utc>>,
    /// Aggregate per window; NaN where support was insufficient.
    pub values: Vec<f64>,
    /// Fraction of expected slots holding a valid value (NaN if inconsistent).
    pub coverage: Vec<f64>,
    /// Number of windows whose source stamps did not match the expected slots.
    pub inconsistent_windows: usize,
}

impl EquidistantAggregate {
    /// Number of target windows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no target windows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum WindowOutcome {
    Inconsistent,
    Evaluated { value: f64, coverage: f64 },
}

/// Aggregate a regular, possibly gappy source series onto `target`.
///
/// # Errors
/// Returns an `InvalidArgument`-class [`crate::AggregateError`] when the
/// source stamps and values differ in length, the stamps are not ascending,
/// the source step is not positive, the target step is not a whole multiple
/// of the source step, or the threshold lies outside `[0, 100]`.
pub fn aggregate_equidistant(
    target: &RegularGrid,
    source: &EquidistantSeries<'_>,
    params: &EquidistantParams,
) -> AggregateResult<EquidistantAggregate> {
    ensure!(
        source.ends.len() == source.values.len(),
        LengthMismatchSnafu {
            what: "source values vs. source end stamps",
            expected: source.ends.len(),
            actual: source.values.len(),
        }
    );
    ensure_ascending("source end stamps", source.ends)?;
    validate_threshold(params.min_valid_percent)?;

    let src_ns = step_nanos("source step", source.step)?;
    ensure!(
        src_ns > 0,
        NonPositiveStepSnafu {
            what: "source step",
            seconds: duration_secs(source.step),
        }
    );
    let trg_ns = step_nanos("target step", target.step())?;
    ensure!(
        trg_ns % src_ns == 0,
        NotMultipleSnafu {
            target_secs: duration_secs(target.step()),
            source_secs: duration_secs(source.step),
        }
    );
    let ratio = trg_ns / src_ns;
    let n_expected = u32::try_from(ratio).ok().context(TooManySlotsSnafu {
        ratio,
        limit: u32::MAX,
    })?;

    let (starts, ends) = target.windows();
    let expected = expected_slots(n_expected);
    let threshold = params.min_valid_percent / 100.0;
    let reduction = params.method.reduction();

    let outcomes = map_windows(starts.len(), |i| {
        let (begin, end) = (starts[i], ends[i]);
        let lo = source.ends.partition_point(|t| *t <= begin);
        let hi = source.ends.partition_point(|t| *t <= end);

        let Some(filled) = fill_slots(
            begin,
            src_ns,
            n_expected,
            &source.ends[lo..hi],
            &source.values[lo..hi],
        ) else {
            debug!(window = i, %begin, %end, "source stamps do not match expected slots");
            return WindowOutcome::Inconsistent;
        };

        let present: Coverage = filled
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(k, _)| k as Slot)
            .collect();
        if present.cardinality() > u64::from(n_expected) {
            return WindowOutcome::Inconsistent;
        }

        let coverage = present.coverage_ratio(&expected);
        let value = if coverage >= threshold {
            reduction.apply(&filled)
        } else {
            f64::NAN
        };
        debug!(
            window = i,
            coverage,
            longest_gap = present.max_gap_len(&expected),
            "evaluated window"
        );
        WindowOutcome::Evaluated { value, coverage }
    });

    let mut values = Vec::with_capacity(outcomes.len());
    let mut coverage = Vec::with_capacity(outcomes.len());
    let mut inconsistent_windows = 0usize;
    for outcome in outcomes {
        match outcome {
            WindowOutcome::Inconsistent => {
                inconsistent_windows += 1;
                values.push(f64::NAN);
                coverage.push(f64::NAN);
            }
            WindowOutcome::Evaluated { value, coverage: c } => {
                values.push(value);
                coverage.push(c);
            }
        }
    }

    if inconsistent_windows > 0 {
        warn!(
            inconsistent_windows,
            "inconsistent source times in {inconsistent_windows} target time windows"
        );
    }

    Ok(EquidistantAggregate {
        starts,
        ends,
        values,
        coverage,
        inconsistent_windows,
    })
}

fn step_nanos(what: &'static str, step: Duration) -> AggregateResult<i64> {
    step.num_nanoseconds().context(StepOutOfRangeSnafu {
        what,
        seconds: duration_secs(step),
    })
}

/// Place window entries onto their expected slots, gaps filled with NaN.
///
/// Returns `None` if an entry is off-grid or collides with another entry.
fn fill_slots(
    begin: DateTime<Utc>,
    step_ns: i64,
    n_expected: u32,
    ends: &[DateTime<Utc>],
    values: &[f64],
) -> Option<Vec<f64>> {
    let mut filled = vec![f64::NAN; n_expected as usize];
    let mut taken = Coverage::empty();
    for (t, &v) in ends.iter().zip(values) {
        let offset_ns = (*t - begin).num_nanoseconds()?;
        if offset_ns % step_ns != 0 {
            return None;
        }
        let k = offset_ns / step_ns;
        if k < 1 || k > i64::from(n_expected) {
            return None;
        }
        let slot = (k - 1) as Slot;
        if !taken.insert(slot) {
            return None;
        }
        filled[slot as usize] = v;
    }
    Some(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn day_grid(step_hours: i64) -> RegularGrid {
        RegularGrid::new(at(0), at(24), Duration::hours(step_hours)).unwrap()
    }

    #[test]
    fn partial_support_above_threshold_is_summed() {
        let ends = [at(2), at(3), at(4), at(5), at(12)];
        let values = [1.0; 5];
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values,
        };
        let params = EquidistantParams {
            min_valid_percent: 50.0,
            ..Default::default()
        };

        let agg = aggregate_equidistant(&day_grid(6), &source, &params).unwrap();
        assert_eq!(agg.len(), 4);
        assert_eq!(agg.values[0], 4.0);
        assert!(agg.values[1..].iter().all(|v| v.is_nan()));
        assert_eq!(agg.inconsistent_windows, 0);
        assert_eq!(agg.starts[1], at(6));
        assert_eq!(agg.ends[3], at(24));
        assert!((agg.coverage[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((agg.coverage[1] - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn full_threshold_rejects_any_gap() {
        let ends: Vec<_> = (1..=6).filter(|h| *h != 3).map(at).collect();
        let values = vec![2.0; ends.len()];
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values,
        };
        let agg =
            aggregate_equidistant(&day_grid(6), &source, &EquidistantParams::default()).unwrap();
        assert!(agg.values[0].is_nan());
    }

    #[test]
    fn nan_values_count_as_missing() {
        let ends: Vec<_> = (1..=6).map(at).collect();
        let values = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0];
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values,
        };
        let params = EquidistantParams {
            method: AccumulationMethod::Mean,
            min_valid_percent: 80.0,
        };
        let agg = aggregate_equidistant(&day_grid(6), &source, &params).unwrap();
        assert!((agg.values[0] - 18.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn misaligned_stamp_marks_window_inconsistent() {
        let ends = [at(1), at(2) + Duration::minutes(30), at(7)];
        let values = [1.0, 1.0, 1.0];
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values,
        };
        let params = EquidistantParams {
            min_valid_percent: 0.0,
            ..Default::default()
        };
        let agg = aggregate_equidistant(&day_grid(6), &source, &params).unwrap();
        assert!(agg.values[0].is_nan());
        assert!(agg.coverage[0].is_nan());
        assert_eq!(agg.values[1], 1.0);
        assert_eq!(agg.inconsistent_windows, 1);
    }

    #[test]
    fn duplicate_stamps_mark_window_inconsistent() {
        let ends = [at(1), at(1), at(13), at(13)];
        let values = [1.0; 4];
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values,
        };
        let params = EquidistantParams {
            min_valid_percent: 0.0,
            ..Default::default()
        };
        let agg = aggregate_equidistant(&day_grid(6), &source, &params).unwrap();
        assert_eq!(agg.inconsistent_windows, 2);
        assert!(agg.values[0].is_nan());
        assert!(agg.values[2].is_nan());
        assert_eq!(agg.values[1], 0.0);
    }

    #[test]
    fn identical_grids_return_source_values() {
        let ends: Vec<_> = (1..=24).map(at).collect();
        let values: Vec<f64> = (0..24).map(|i| i as f64 * 0.5).collect();
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values,
        };
        for method in [AccumulationMethod::Sum, AccumulationMethod::Mean] {
            let params = EquidistantParams {
                method,
                min_valid_percent: 100.0,
            };
            let agg = aggregate_equidistant(&day_grid(1), &source, &params).unwrap();
            assert_eq!(agg.values, values);
        }
    }

    #[test]
    fn rejects_non_multiple_resolution() {
        let ends = [at(1)];
        let values = [1.0];
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::minutes(45),
            values: &values,
        };
        let err = aggregate_equidistant(&day_grid(1), &source, &EquidistantParams::default())
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::NotMultiple { .. }));
    }

    #[test]
    fn rejects_misaligned_inputs() {
        let ends = [at(2), at(1)];
        let values = [1.0, 1.0];
        let unsorted = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values,
        };
        let err = aggregate_equidistant(&day_grid(6), &unsorted, &EquidistantParams::default())
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::NotAscending { .. }));

        let short = EquidistantSeries {
            ends: &ends,
            step: Duration::hours(1),
            values: &values[..1],
        };
        let err = aggregate_equidistant(&day_grid(6), &short, &EquidistantParams::default())
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::LengthMismatch { .. }));
    }

    #[test]
    fn rejects_out_of_range_threshold_and_zero_step() {
        let source = EquidistantSeries {
            ends: &[],
            step: Duration::hours(1),
            values: &[],
        };
        let params = EquidistantParams {
            min_valid_percent: 120.0,
            ..Default::default()
        };
        assert!(aggregate_equidistant(&day_grid(6), &source, &params).is_err());

        let zero = EquidistantSeries {
            step: Duration::zero(),
            ..source
        };
        let err = aggregate_equidistant(&day_grid(6), &zero, &EquidistantParams::default())
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::NonPositiveStep { .. }));
    }

    #[test]
    fn sub_millisecond_steps_are_resolved() {
        let begin = at(0);
        let target = RegularGrid::new(
            begin,
            begin + Duration::milliseconds(2),
            Duration::milliseconds(1),
        )
        .unwrap();
        let ends: Vec<_> = (1..=4).map(|k| begin + Duration::microseconds(500 * k)).collect();
        let values = [1.0; 4];
        let source = EquidistantSeries {
            ends: &ends,
            step: Duration::microseconds(500),
            values: &values,
        };
        let agg = aggregate_equidistant(&target, &source, &EquidistantParams::default()).unwrap();
        assert_eq!(agg.values, vec![2.0, 2.0]);
        assert_eq!(agg.inconsistent_windows, 0);

        let shifted: Vec<_> = ends.iter().map(|t| *t + Duration::microseconds(1)).collect();
        let source = EquidistantSeries {
            ends: &shifted,
            ..source
        };
        let agg = aggregate_equidistant(&target, &source, &EquidistantParams::default()).unwrap();
        assert!(agg.inconsistent_windows > 0);
    }

    #[test]
    fn not_multiple_error_reports_fractional_seconds() {
        let target = RegularGrid::new(at(0), at(1), Duration::milliseconds(1500)).unwrap();
        let source = EquidistantSeries {
            ends: &[],
            step: Duration::milliseconds(400),
            values: &[],
        };
        let err = aggregate_equidistant(&target, &source, &EquidistantParams::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Target resolution 1.5 s is not a multiple of source resolution 0.4 s"
        );
    }

    #[test]
    fn rejects_ratios_beyond_slot_range() {
        let target = RegularGrid::new(at(0), at(24 * 365), Duration::days(365)).unwrap();
        let source = EquidistantSeries {
            ends: &[],
            step: Duration::nanoseconds(1),
            values: &[],
        };
        let err = aggregate_equidistant(&target, &source, &EquidistantParams::default())
            .unwrap_err();
        assert!(matches!(err, crate::AggregateError::TooManySlots { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: EquidistantParams = serde_json::from_str(r#"{"method":"mean"}"#).unwrap();
        assert_eq!(params.method, AccumulationMethod::Mean);
        assert_eq!(params.min_valid_percent, 100.0);
    }
}
