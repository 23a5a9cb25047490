//! Core engine for temporal resampling of time series.
//!
//! This crate provides the pieces behind `tsresample`:
//!
//! - Regular time grids, instant/duration parsing and time-stamp arithmetic
//!   (`grid`, `step` and `time_input` modules).
//! - Five independent aggregators that map a source series onto target
//!   windows (`aggregate` module): equidistant with a coverage threshold,
//!   edge-based with a named reduction, exact duration-weighted mean,
//!   interpolated mean over a helper grid, and a windowed sum tolerating
//!   missing values.
//! - RoaringBitmap-based slot coverage for reasoning about which source
//!   slots of a window are present or missing (`coverage` module).
//! - Small numeric helpers: interpolation, nearest-neighbour lookup and
//!   validity detection (`helpers` module).
//!
//! Every aggregator is a pure function. Configuration problems are reported
//! as [`AggregateError`] before any window is evaluated; data-quality issues
//! inside a window never fail a call and surface as NaN instead.
//!
//! With the `parallel` feature, target windows are evaluated on the rayon
//! thread pool. Results are identical to the sequential path.
#![deny(missing_docs)]
pub mod aggregate;
pub mod coverage;
pub mod error;
pub mod grid;
pub mod helpers;
pub mod reduce;
pub mod step;
pub mod time_input;

pub use aggregate::{
    equidistant::{
        EquidistantAggregate, EquidistantParams, EquidistantSeries, aggregate_equidistant,
    },
    in_time::aggregate_in_time,
    interpolated::{InterpolationParams, average_over_time_windows},
    overlap::mean_over_time_windows,
    sum_windows::sum_over_time_windows,
};
pub use error::{AggregateError, AggregateResult, ErrorKind};
pub use grid::{RegularGrid, from_to, timestamp_to_index, timestamp_to_index_from};
pub use helpers::validity::{ValidityRules, valid_indices};
pub use reduce::{AccumulationMethod, ParseReductionError, Reduction};
pub use step::{ParseStepError, Step};
pub use time_input::{DurationInput, ParseTimeError, TimeInput};
