//! Detection of valid entries in raw measurement arrays.

/// Sentinel values commonly used by gauges and radar products to flag
/// missing measurements.
pub const DEFAULT_INVALID: [f64; 3] = [-99.0, 99.0, -9999.0];

/// Rules deciding which values count as valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityRules {
    /// Values treated as missing regardless of range.
    pub invalid: Vec<f64>,
    /// Inclusive lower bound, if any.
    pub min: Option<f64>,
    /// Inclusive upper bound, if any.
    pub max: Option<f64>,
}

impl Default for ValidityRules {
    fn default() -> Self {
        Self {
            invalid: DEFAULT_INVALID.to_vec(),
            min: None,
            max: None,
        }
    }
}

impl ValidityRules {
    /// Whether `v` is finite, not a sentinel, and within bounds.
    pub fn is_valid(&self, v: f64) -> bool {
        v.is_finite()
            && !self.invalid.contains(&v)
            && self.min.is_none_or(|lo| v >= lo)
            && self.max.is_none_or(|hi| v <= hi)
    }

    /// Indices of all valid entries in `data`.
    pub fn valid_indices(&self, data: &[f64]) -> Vec<usize> {
        data.iter()
            .enumerate()
            .filter(|(_, v)| self.is_valid(**v))
            .map(|(i, _)| i)
            .collect()
    }

    /// Copy of `data` with every invalid entry replaced by NaN.
    pub fn mask(&self, data: &[f64]) -> Vec<f64> {
        data.iter()
            .map(|&v| if self.is_valid(v) { v } else { f64::NAN })
            .collect()
    }
}

/// Indices of valid entries using the default sentinels and no bounds.
pub fn valid_indices(data: &[f64]) -> Vec<usize> {
    ValidityRules::default().valid_indices(data)
}
