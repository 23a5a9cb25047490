//! Wrapper prelude.
//!
//! The `tsresample` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::coverage;
pub use crate::{
    AccumulationMethod, AggregateError, AggregateResult, DurationInput, EquidistantAggregate,
    EquidistantParams, EquidistantSeries, ErrorKind, InterpolationParams, Reduction, RegularGrid,
    Step, TimeInput, aggregate_equidistant, aggregate_in_time, average_over_time_windows, from_to,
    mean_over_time_windows, sum_over_time_windows, timestamp_to_index, valid_indices,
};
