//! Slot coverage inside one target window.
//!
//! An equidistant target window of width `n * source_step` expects exactly
//! `n` source slots, numbered `0..n`. This module tracks which of those
//! slots actually carry a valid value, using a `RoaringBitmap`:
//!
//! ```
//! use roaring::RoaringBitmap;
//! use tsresample_core::coverage::Coverage;
//!
//! let expected: RoaringBitmap = (0u32..6).collect();
//! let present: Coverage = [1u32, 2, 3, 4].into_iter().collect();
//!
//! assert!((present.coverage_ratio(&expected) - 4.0 / 6.0).abs() < 1e-12);
//! assert_eq!(present.max_gap_len(&expected), 1);
//! ```

use roaring::RoaringBitmap;

/// Slot id inside a window.
pub type Slot = u32;

/// Build the expected slot domain `0..n`.
pub fn expected_slots(n: u32) -> RoaringBitmap {
    let mut bitmap = RoaringBitmap::new();
    bitmap.insert_range(0..n);
    bitmap
}

/// Set of slots that are present (carry a valid value).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coverage {
    bitmap: RoaringBitmap,
}

impl Coverage {
    /// Construct an empty coverage set.
    pub fn empty() -> Self {
        Self {
            bitmap: RoaringBitmap::new(),
        }
    }

    /// Borrow the underlying bitmap of present slots.
    pub fn present(&self) -> &RoaringBitmap {
        &self.bitmap
    }

    /// Mark `slot` present. Returns `false` if it already was.
    pub fn insert(&mut self, slot: Slot) -> bool {
        self.bitmap.insert(slot)
    }

    /// Number of present slots.
    pub fn cardinality(&self) -> u64 {
        self.bitmap.len()
    }

    /// Slots that are expected but not present (`expected - present`).
    pub fn missing_points(&self, expected: &RoaringBitmap) -> RoaringBitmap {
        let mut missing = expected.clone();
        missing -= &self.bitmap;
        missing
    }

    /// Coverage ratio in `[0.0, 1.0]` relative to `expected`.
    ///
    /// `|present ∩ expected| / |expected|`, and `1.0` for an empty
    /// `expected` domain.
    pub fn coverage_ratio(&self, expected: &RoaringBitmap) -> f64 {
        let expected_count = expected.len();
        if expected_count == 0 {
            return 1.0;
        }
        let covered = &self.bitmap & expected;
        covered.len() as f64 / expected_count as f64
    }

    /// Length of the longest run of missing slots (0 when nothing is missing).
    pub fn max_gap_len(&self, expected: &RoaringBitmap) -> u64 {
        let missing = self.missing_points(expected);
        let mut iter = missing.iter();
        let Some(mut prev) = iter.next() else {
            return 0;
        };

        let mut run = 1u64;
        let mut longest = 1u64;
        for v in iter {
            if v == prev + 1 {
                run += 1;
            } else {
                run = 1;
            }
            longest = longest.max(run);
            prev = v;
        }
        longest
    }
}

impl FromIterator<Slot> for Coverage {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Slot>,
    {
        Self {
            bitmap: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_against_full_and_empty_domains() {
        let expected = expected_slots(4);
        let full: Coverage = (0u32..4).collect();
        assert_eq!(full.coverage_ratio(&expected), 1.0);
        assert_eq!(Coverage::empty().coverage_ratio(&expected), 0.0);
        assert_eq!(Coverage::empty().coverage_ratio(&RoaringBitmap::new()), 1.0);
    }

    #[test]
    fn slots_outside_expected_do_not_count() {
        let expected = expected_slots(2);
        let cov: Coverage = [0u32, 5, 9].into_iter().collect();
        assert_eq!(cov.coverage_ratio(&expected), 0.5);
        assert_eq!(cov.cardinality(), 3);
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut cov = Coverage::empty();
        assert!(cov.insert(3));
        assert!(!cov.insert(3));
        assert_eq!(cov.cardinality(), 1);
    }

    #[test]
    fn missing_points_and_longest_gap() {
        let expected = expected_slots(10);
        let cov: Coverage = [0u32, 1, 5, 9].into_iter().collect();
        let missing = cov.missing_points(&expected);
        assert_eq!(missing.iter().collect::<Vec<_>>(), vec![2, 3, 4, 6, 7, 8]);
        assert_eq!(cov.max_gap_len(&expected), 3);

        let full: Coverage = (0u32..10).collect();
        assert_eq!(full.max_gap_len(&expected), 0);
    }
}
