/// The contiguous, half-open range `[start_index, end_index)` of materialized items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleWindow {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl VisibleWindow {
    /// Builds the window around an anchor index: `preload` items before it, and
    /// `window_len + preload` items from it, clamped to `[0, count)`.
    pub fn around(anchor: usize, window_len: usize, preload: usize, count: usize) -> Self {
        let start_index = anchor.saturating_sub(preload).min(count);
        let end_index = anchor
            .saturating_add(window_len)
            .saturating_add(preload)
            .min(count);
        Self {
            start_index,
            end_index: end_index.max(start_index),
        }
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// An item of the current window, ready to be laid out by the host.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterializedItem<P> {
    pub payload: P,
    /// Index in the source list.
    pub index: usize,
    /// Position within the materialized window.
    pub virtual_index: usize,
    /// Vertical offset from the top of the content region.
    pub translate_y: f64,
    /// Current height estimate (measured or average).
    pub item_height: f64,
}

impl<P> MaterializedItem<P> {
    /// Stacking key for absolutely positioned rows: later items draw above earlier ones.
    pub fn z_index(&self) -> usize {
        self.index
    }

    pub fn bottom(&self) -> f64 {
        self.translate_y + self.item_height
    }
}

/// One rendered height reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub index: usize,
    pub height: f64,
}

impl Geometry {
    pub fn new(index: usize, height: f64) -> Self {
        Self { index, height }
    }
}

impl From<(usize, f64)> for Geometry {
    fn from((index, height): (usize, f64)) -> Self {
        Self { index, height }
    }
}

/// What a measurement pass is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MeasureKind {
    /// Calibration pass: replaces the average height and rewrites unmeasured rows. Runs even
    /// while the user is scrolling.
    Initial,
    /// Refinement pass: blends into the average height. Suppressed while scrolling.
    Continuous,
    /// Re-measurement of a single materialized item.
    Targeted { index: usize },
}

impl MeasureKind {
    pub fn is_initial(self) -> bool {
        matches!(self, Self::Initial)
    }
}

/// Emitted when a targeted re-measurement finds a material height change.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeightChanged {
    pub index: usize,
    pub new_height: f64,
    pub old_height: f64,
}
