//! Numeric building blocks shared by the aggregators.
//!
//! - `interp`: piecewise-linear interpolation over sorted sample positions,
//!   without extrapolation.
//! - `nearest`: nearest-neighbour lookup over a sorted 1-D set of points.
//! - `validity`: detection of valid entries (finite, non-sentinel, in range).
pub mod interp;
pub mod nearest;
pub mod validity;
