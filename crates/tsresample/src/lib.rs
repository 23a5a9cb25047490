//! # tsresample
//!
//! Resample time series between regular and irregular temporal grids.
//!
//! This crate is the supported public entry point and provides a small, stable surface.
//!
//! ## Features
//!
//! - `parallel`: Evaluates independent target windows on the rayon thread pool
//!
//! ## Example
//!
//! ```rust
//! use tsresample::prelude::*;
//!
//! # fn main() -> Result<(), AggregateError> {
//! let grid = RegularGrid::parse("2008-06-02T00:00:00", "2008-06-02T02:00:00", "1h")?;
//! let edges = grid.points();
//! let src = ndarray::Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
//! let src_edges = from_to(grid.start(), grid.end(), chrono::Duration::minutes(30))?;
//! let hourly = aggregate_in_time(src.view(), &src_edges, &edges, 0, Reduction::Sum)?;
//! assert_eq!(hourly.to_vec(), vec![3.0, 7.0]);
//! # Ok(())
//! # }
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// Coverage namespace (wrapper-only).
pub mod coverage {
    pub use tsresample_core::coverage::{Coverage, Slot, expected_slots};
}

pub use tsresample_core::aggregate::equidistant::{
    EquidistantAggregate, EquidistantParams, EquidistantSeries, aggregate_equidistant,
};
pub use tsresample_core::aggregate::in_time::aggregate_in_time;
pub use tsresample_core::aggregate::interpolated::{
    InterpolationParams, average_over_time_windows,
};
pub use tsresample_core::aggregate::overlap::mean_over_time_windows;
pub use tsresample_core::aggregate::sum_windows::sum_over_time_windows;
pub use tsresample_core::error::{AggregateError, AggregateResult, ErrorKind};
pub use tsresample_core::grid::{RegularGrid, from_to, timestamp_to_index, timestamp_to_index_from};
pub use tsresample_core::helpers::validity::{ValidityRules, valid_indices};
pub use tsresample_core::reduce::{AccumulationMethod, ParseReductionError, Reduction};
pub use tsresample_core::step::{ParseStepError, Step};
pub use tsresample_core::time_input::{DurationInput, ParseTimeError, TimeInput};
