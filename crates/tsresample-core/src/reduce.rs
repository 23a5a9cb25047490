//! Named reductions over a slice of values.
//!
//! Reductions are a closed enumeration resolved from their names once, at
//! the boundary. Plain variants propagate NaN (any NaN input yields NaN);
//! the `Nan*` variants skip NaN and return NaN only when nothing is left.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// A reduction name did not match any known reduction.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("unknown reduction '{name}' (expected one of: {expected})"))]
pub struct ParseReductionError {
    name: String,
    expected: String,
}

impl ParseReductionError {
    /// The name that failed to resolve.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A reduction applied to the values falling into one target window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Sum of all values.
    Sum,
    /// Arithmetic mean.
    Mean,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Median (mean of the two middle values for even counts).
    Median,
    /// Population standard deviation.
    Std,
    /// Population variance.
    Var,
    /// Product of all values.
    Prod,
    /// Sum ignoring NaN; zero when every value is NaN.
    NanSum,
    /// Mean ignoring NaN.
    NanMean,
    /// Minimum ignoring NaN.
    NanMin,
    /// Maximum ignoring NaN.
    NanMax,
}

impl Reduction {
    /// Every supported reduction, in a stable order.
    pub const ALL: [Reduction; 12] = [
        Reduction::Sum,
        Reduction::Mean,
        Reduction::Min,
        Reduction::Max,
        Reduction::Median,
        Reduction::Std,
        Reduction::Var,
        Reduction::Prod,
        Reduction::NanSum,
        Reduction::NanMean,
        Reduction::NanMin,
        Reduction::NanMax,
    ];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::Median => "median",
            Reduction::Std => "std",
            Reduction::Var => "var",
            Reduction::Prod => "prod",
            Reduction::NanSum => "nansum",
            Reduction::NanMean => "nanmean",
            Reduction::NanMin => "nanmin",
            Reduction::NanMax => "nanmax",
        }
    }

    /// The function implementing this reduction.
    pub fn function(&self) -> fn(&[f64]) -> f64 {
        match self {
            Reduction::Sum => sum,
            Reduction::Mean => mean,
            Reduction::Min => min,
            Reduction::Max => max,
            Reduction::Median => median,
            Reduction::Std => std,
            Reduction::Var => var,
            Reduction::Prod => prod,
            Reduction::NanSum => nansum,
            Reduction::NanMean => nanmean,
            Reduction::NanMin => nanmin,
            Reduction::NanMax => nanmax,
        }
    }

    /// Apply the reduction. An empty slice yields NaN.
    pub fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        (self.function())(values)
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reduction {
    type Err = ParseReductionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Reduction::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .context(ParseReductionSnafu {
                name: s,
                expected: Reduction::ALL.map(|r| r.name()).join(", "),
            })
    }
}

/// Methods supported by the equidistant aggregator.
///
/// Both skip missing values inside a window; whether a window has enough
/// valid values at all is decided by the coverage threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccumulationMethod {
    /// Sum of the non-missing values.
    #[default]
    Sum,
    /// Mean of the non-missing values.
    Mean,
}

impl AccumulationMethod {
    /// The NaN-skipping reduction backing this method.
    pub fn reduction(&self) -> Reduction {
        match self {
            AccumulationMethod::Sum => Reduction::NanSum,
            AccumulationMethod::Mean => Reduction::NanMean,
        }
    }
}

impl fmt::Display for AccumulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccumulationMethod::Sum => f.write_str("sum"),
            AccumulationMethod::Mean => f.write_str("mean"),
        }
    }
}

impl FromStr for AccumulationMethod {
    type Err = ParseReductionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AccumulationMethod::Sum),
            "mean" => Ok(AccumulationMethod::Mean),
            _ => ParseReductionSnafu {
                name: s,
                expected: "sum, mean",
            }
            .fail(),
        }
    }
}

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

fn mean(values: &[f64]) -> f64 {
    sum(values) / values.len() as f64
}

fn min(values: &[f64]) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn median(values: &[f64]) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn var(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

fn std(values: &[f64]) -> f64 {
    var(values).sqrt()
}

fn prod(values: &[f64]) -> f64 {
    values.iter().product()
}

fn non_nan(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| !v.is_nan())
}

fn nansum(values: &[f64]) -> f64 {
    non_nan(values).sum()
}

fn nanmean(values: &[f64]) -> f64 {
    let (total, count) = non_nan(values).fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        total / count as f64
    }
}

fn nanmin(values: &[f64]) -> f64 {
    non_nan(values).reduce(f64::min).unwrap_or(f64::NAN)
}

fn nanmax(values: &[f64]) -> f64 {
    non_nan(values).reduce(f64::max).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for r in Reduction::ALL {
            assert_eq!(r.name().parse::<Reduction>(), Ok(r));
        }
        assert_eq!(" Mean ".parse::<Reduction>(), Ok(Reduction::Mean));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "average".parse::<Reduction>().unwrap_err();
        assert_eq!(err.name(), "average");
        assert!(err.to_string().contains("nanmean"));
    }

    #[test]
    fn plain_reductions_propagate_nan() {
        let values = [1.0, f64::NAN, 3.0];
        for r in [Reduction::Sum, Reduction::Mean, Reduction::Min, Reduction::Max] {
            assert!(r.apply(&values).is_nan(), "{r} should propagate NaN");
        }
    }

    #[test]
    fn nan_reductions_skip_missing_values() {
        let values = [1.0, f64::NAN, 3.0];
        assert_eq!(Reduction::NanSum.apply(&values), 4.0);
        assert_eq!(Reduction::NanMean.apply(&values), 2.0);
        assert_eq!(Reduction::NanMin.apply(&values), 1.0);
        assert_eq!(Reduction::NanMax.apply(&values), 3.0);

        let all_nan = [f64::NAN, f64::NAN];
        assert_eq!(Reduction::NanSum.apply(&all_nan), 0.0);
        assert!(Reduction::NanMean.apply(&all_nan).is_nan());
        assert!(Reduction::NanMax.apply(&all_nan).is_nan());
    }

    #[test]
    fn order_statistics_and_dispersion() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(Reduction::Median.apply(&values), 2.5);
        assert_eq!(Reduction::Median.apply(&values[..3]), 3.0);
        assert_eq!(Reduction::Var.apply(&values), 1.25);
        assert!((Reduction::Std.apply(&values) - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(Reduction::Prod.apply(&values), 24.0);
    }

    #[test]
    fn empty_input_yields_nan() {
        assert!(Reduction::Sum.apply(&[]).is_nan());
    }

    #[test]
    fn accumulation_method_parsing() {
        assert_eq!("SUM".parse::<AccumulationMethod>(), Ok(AccumulationMethod::Sum));
        assert_eq!("mean".parse::<AccumulationMethod>(), Ok(AccumulationMethod::Mean));
        assert!("max".parse::<AccumulationMethod>().is_err());
        assert_eq!(AccumulationMethod::Mean.reduction(), Reduction::NanMean);
    }
}
