//! Nearest-neighbour lookup over a sorted 1-D point set.

/// Index over non-decreasing reference points.
#[derive(Debug, Clone, Copy)]
pub struct NearestIndex<'a> {
    points: &'a [f64],
}

impl<'a> NearestIndex<'a> {
    /// Wrap reference points that are already sorted ascending.
    pub fn new(points: &'a [f64]) -> Self {
        debug_assert!(
            points.windows(2).all(|w| w[0] <= w[1]),
            "NearestIndex expects sorted points"
        );
        Self { points }
    }

    /// Nearest reference index and its absolute distance to `x`.
    ///
    /// Ties resolve to the lower index. Returns `None` for an empty index.
    pub fn query(&self, x: f64) -> Option<(usize, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let right = self.points.partition_point(|&p| p < x);
        let candidates = [right.checked_sub(1), Some(right)];
        candidates
            .into_iter()
            .flatten()
            .filter(|&i| i < self.points.len())
            .map(|i| (i, (self.points[i] - x).abs()))
            .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })
    }

    /// [`NearestIndex::query`] for every point in `xs`.
    pub fn query_many(&self, xs: &[f64]) -> Vec<Option<(usize, f64)>> {
        xs.iter().map(|&x| self.query(x)).collect()
    }
}
