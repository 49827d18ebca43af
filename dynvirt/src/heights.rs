use crate::{CumulativeHeights, Geometry, HEIGHT_EPSILON, MIN_HEIGHT};

/// Weight of a new batch mean when refining the running average.
const BLEND_WEIGHT: f64 = 0.3;

/// Relative deviation from the calibrated average above which unmeasured rows are rewritten.
///
/// Only gates the row rewrites. An initial pass always replaces the average with the batch
/// mean, even when the mean lies within this tolerance of the previous average.
const REWRITE_TOLERANCE: f64 = 0.1;

/// Summary of one applied measurement batch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatchOutcome {
    /// In-range entries that were recorded.
    pub recorded: usize,
    /// Height table writes, including average rewrites of unmeasured rows.
    pub changed: usize,
    /// Smallest index whose height was written. Every offset at or after it is stale.
    pub first_changed: Option<usize>,
    /// Average height after the batch.
    pub average: f64,
}

impl BatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }
}

/// Per-item heights, the running average estimate, and the prefix-sum index over them.
///
/// Every index in `[0, len)` always has a height: the nominal height until a measurement or an
/// average rewrite replaces it.
#[derive(Clone, Debug)]
pub struct HeightModel {
    nominal: f64,
    average: f64,
    heights: Vec<f64>,
    measured: Vec<bool>,
    measured_count: usize,
    cumulative: CumulativeHeights,
    dirty: bool,
}

impl HeightModel {
    pub fn new(len: usize, nominal: f64) -> Self {
        let mut model = Self {
            nominal,
            average: nominal,
            heights: Vec::new(),
            measured: Vec::new(),
            measured_count: 0,
            cumulative: CumulativeHeights::new(),
            dirty: true,
        };
        model.reset(len, nominal);
        model
    }

    /// Resizes the table to `len` items and resets every height to `nominal`.
    pub fn reset(&mut self, len: usize, nominal: f64) {
        self.heights.clear();
        self.heights.resize(len, nominal);
        self.measured.clear();
        self.measured.resize(len, false);
        self.set_nominal_height(nominal);
    }

    /// Resets the average to `nominal` and drops every per-item override.
    pub fn set_nominal_height(&mut self, nominal: f64) {
        let nominal = clamp_height(nominal);
        vdebug!(len = self.heights.len(), nominal, "HeightModel::set_nominal_height");
        self.nominal = nominal;
        self.average = nominal;
        self.heights.iter_mut().for_each(|h| *h = nominal);
        self.measured.iter_mut().for_each(|m| *m = false);
        self.measured_count = 0;
        self.rebuild_cumulative();
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn cumulative(&self) -> &CumulativeHeights {
        &self.cumulative
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.measured.get(index).copied().unwrap_or(false)
    }

    pub fn measured_count(&self) -> usize {
        self.measured_count
    }

    /// Whether heights were written since the last `rebuild_cumulative`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the height of `index`, or the average estimate for indexes past the table.
    pub fn height_of(&self, index: usize) -> f64 {
        self.heights.get(index).copied().unwrap_or(self.average)
    }

    /// Top offset of `index` according to the prefix sums.
    pub fn offset_of(&self, index: usize) -> f64 {
        self.cumulative.start_of(index)
    }

    pub fn total(&self) -> f64 {
        self.cumulative.total()
    }

    pub fn rebuild_cumulative(&mut self) {
        self.cumulative.rebuild(&self.heights);
        self.dirty = false;
    }

    /// Records a single measurement as a batch of one.
    pub fn record_measurement(&mut self, index: usize, height: f64, initial: bool) -> BatchOutcome {
        self.record_batch([Geometry::new(index, height)], initial)
    }

    /// Records a batch of rendered heights, updates the average estimate and rebuilds the
    /// prefix sums.
    ///
    /// - Heights are clamped to [`MIN_HEIGHT`]; writes within [`HEIGHT_EPSILON`] of the current
    ///   value are skipped, but the index still counts as measured.
    /// - `initial`: the average becomes the batch mean, and unmeasured rows that deviate from
    ///   it by more than 10% are rewritten to it.
    /// - otherwise: the average moves 30% of the way toward the batch mean.
    ///
    /// Out-of-range entries are ignored. An empty batch leaves the model untouched.
    pub fn record_batch<I, G>(&mut self, batch: I, initial: bool) -> BatchOutcome
    where
        I: IntoIterator<Item = G>,
        G: Into<Geometry>,
    {
        let len = self.heights.len();
        let mut out = BatchOutcome {
            average: self.average,
            ..BatchOutcome::default()
        };
        let mut sum = 0.0f64;

        for g in batch {
            let g = g.into();
            if g.index >= len {
                vtrace!(index = g.index, len, "record_batch: skipping out-of-range entry");
                continue;
            }
            let h = clamp_height(g.height);
            sum += h;
            out.recorded += 1;
            self.mark_measured(g.index);
            if (h - self.heights[g.index]).abs() > HEIGHT_EPSILON {
                self.heights[g.index] = h;
                out.note_change(g.index);
            }
        }

        if out.recorded == 0 {
            return out;
        }

        let mean = sum / out.recorded as f64;
        if initial {
            self.average = mean;
            let tolerance = mean * REWRITE_TOLERANCE;
            for (i, h) in self.heights.iter_mut().enumerate() {
                if !self.measured[i] && (*h - mean).abs() > tolerance {
                    *h = mean;
                    out.note_change(i);
                }
            }
        } else {
            self.average = self.average * (1.0 - BLEND_WEIGHT) + mean * BLEND_WEIGHT;
        }
        out.average = self.average;

        vdebug!(
            recorded = out.recorded,
            changed = out.changed,
            initial,
            mean,
            average = self.average,
            "HeightModel::record_batch"
        );
        self.rebuild_cumulative();
        out
    }

    /// Overwrites the height of one item without touching the average estimate.
    ///
    /// Returns the previous height when the change exceeds [`HEIGHT_EPSILON`]. The prefix sums
    /// are left dirty; call [`Self::rebuild_cumulative`] afterwards.
    pub fn set_height(&mut self, index: usize, height: f64) -> Option<f64> {
        if index >= self.heights.len() {
            return None;
        }
        self.mark_measured(index);
        let h = clamp_height(height);
        let old = self.heights[index];
        if (h - old).abs() <= HEIGHT_EPSILON {
            return None;
        }
        self.heights[index] = h;
        self.dirty = true;
        Some(old)
    }

    /// Maps a scroll offset to the first item whose bottom edge reaches it.
    ///
    /// Falls back to `offset / average` before any measurement exists. Stale prefix sums give
    /// an approximate answer; the result is always a valid index (or `0` for an empty list).
    pub fn locate_index(&self, scroll_offset: f64) -> usize {
        let len = self.heights.len();
        if len == 0 {
            return 0;
        }
        let offset = if scroll_offset.is_nan() || scroll_offset <= 0.0 {
            0.0
        } else {
            scroll_offset
        };
        let index = if self.measured_count == 0 {
            // Saturating cast; the offset is non-negative so this floors.
            (offset / self.average) as usize
        } else {
            self.cumulative.first_reaching(offset)
        };
        index.min(len - 1)
    }

    fn mark_measured(&mut self, index: usize) {
        if !self.measured[index] {
            self.measured[index] = true;
            self.measured_count += 1;
        }
    }
}

impl BatchOutcome {
    fn note_change(&mut self, index: usize) {
        self.changed += 1;
        self.first_changed = Some(match self.first_changed {
            Some(first) => first.min(index),
            None => index,
        });
    }
}

fn clamp_height(height: f64) -> f64 {
    if height.is_finite() {
        height.max(MIN_HEIGHT)
    } else {
        MIN_HEIGHT
    }
}
