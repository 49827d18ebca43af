/// Inclusive prefix sums over item heights.
///
/// `sums[i]` is the total height of items `0..=i`, so the start offset of item `i` is
/// `sums[i - 1]` (or `0` for the first item) and the content height is the last entry.
///
/// The table is always rebuilt wholesale from the height table; it is never patched in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CumulativeHeights {
    sums: Vec<f64>,
}

impl CumulativeHeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_heights(heights: &[f64]) -> Self {
        let mut out = Self::new();
        out.rebuild(heights);
        out
    }

    /// Recomputes every prefix sum in `O(n)`, reusing the allocation.
    pub fn rebuild(&mut self, heights: &[f64]) {
        self.sums.clear();
        self.sums.reserve_exact(heights.len());
        let mut total = 0.0f64;
        for &h in heights {
            total += h;
            self.sums.push(total);
        }
    }

    pub fn clear(&mut self) {
        self.sums.clear();
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.sums
    }

    pub fn total(&self) -> f64 {
        self.sums.last().copied().unwrap_or(0.0)
    }

    /// Bottom edge of item `index` (inclusive sum), clamped to the table.
    pub fn end_of(&self, index: usize) -> f64 {
        match self.sums.get(index) {
            Some(&s) => s,
            None => self.total(),
        }
    }

    /// Top edge of item `index`: the sum of every height strictly before it.
    pub fn start_of(&self, index: usize) -> f64 {
        if index == 0 {
            return 0.0;
        }
        self.end_of(index - 1)
    }

    /// Returns the first index whose inclusive sum is `>= offset`, or `len()` if the offset lies
    /// past the end.
    ///
    /// Runs in `O(log n)`; requires the sums to be non-decreasing, which `rebuild` guarantees
    /// for non-negative heights.
    pub fn first_reaching(&self, offset: f64) -> usize {
        self.sums.partition_point(|&s| s < offset)
    }
}
