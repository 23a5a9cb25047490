//! Piecewise-linear interpolation over sorted sample positions.
//!
//! Queries outside `[xs[0], xs[n - 1]]` resolve to `None`; the caller decides
//! what an out-of-range point means.

use ndarray::{Array, ArrayView, Axis, Dimension, RemoveAxis};

/// Where a query falls relative to the sample positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bracket {
    /// The query coincides with sample `i`.
    Exact(usize),
    /// The query lies strictly between samples `lo` and `lo + 1`;
    /// `frac` is the relative distance from `xs[lo]`.
    Between {
        /// Lower neighbour.
        lo: usize,
        /// Relative position in `(0, 1)`.
        frac: f64,
    },
}

/// Locate `x` among the non-decreasing positions `xs`.
///
/// With repeated positions the last sample at that position wins.
pub fn bracket(xs: &[f64], x: f64) -> Option<Bracket> {
    let (&first, &last) = (xs.first()?, xs.last()?);
    if x.is_nan() || x < first || x > last {
        return None;
    }

    // First index whose position is strictly greater than `x`.
    let hi = xs.partition_point(|&p| p <= x);
    let lo = hi - 1;
    if xs[lo] == x || hi == xs.len() {
        return Some(Bracket::Exact(lo));
    }
    Some(Bracket::Between {
        lo,
        frac: (x - xs[lo]) / (xs[hi] - xs[lo]),
    })
}

/// Interpolate the rows of `ys` (axis 0 aligned with `xs`) at position `x`.
///
/// Returns `None` outside the sample range.
pub fn interpolate_row<D>(
    xs: &[f64],
    ys: &ArrayView<'_, f64, D>,
    x: f64,
) -> Option<Array<f64, D::Smaller>>
where
    D: Dimension + RemoveAxis,
{
    match bracket(xs, x)? {
        Bracket::Exact(i) => Some(ys.index_axis(Axis(0), i).to_owned()),
        Bracket::Between { lo, frac } => {
            let y0 = ys.index_axis(Axis(0), lo);
            let y1 = ys.index_axis(Axis(0), lo + 1);
            let mut out = y0.to_owned();
            out.zip_mut_with(&y1, |a, &b| *a += (b - *a) * frac);
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    #[test]
    fn bracket_classifies_positions() {
        let xs = [0.0, 10.0, 20.0];
        assert_eq!(bracket(&xs, 0.0), Some(Bracket::Exact(0)));
        assert_eq!(bracket(&xs, 20.0), Some(Bracket::Exact(2)));
        assert_eq!(bracket(&xs, 15.0), Some(Bracket::Between { lo: 1, frac: 0.5 }));
        assert_eq!(bracket(&xs, -1.0), None);
        assert_eq!(bracket(&xs, 20.5), None);
        assert_eq!(bracket(&[], 1.0), None);
    }

    #[test]
    fn bracket_with_repeated_positions() {
        let xs = [0.0, 5.0, 5.0, 10.0];
        assert_eq!(bracket(&xs, 5.0), Some(Bracket::Exact(2)));
        assert_eq!(bracket(&xs, 7.5), Some(Bracket::Between { lo: 2, frac: 0.5 }));
    }

    #[test]
    fn interpolates_1d_rows() {
        let xs = [0.0, 10.0];
        let ys: Array1<f64> = array![1.0, 3.0];
        let v = interpolate_row(&xs, &ys.view(), 2.5).unwrap();
        assert!((v.into_scalar() - 1.5).abs() < 1e-12);
        assert!(interpolate_row(&xs, &ys.view(), 11.0).is_none());
    }

    #[test]
    fn interpolates_each_column_of_2d_rows() {
        let xs = [0.0, 4.0];
        let ys: Array2<f64> = array![[0.0, 10.0], [4.0, 30.0]];
        let v = interpolate_row(&xs, &ys.view(), 1.0).unwrap();
        assert_eq!(v, array![1.0, 15.0]);
    }
}
