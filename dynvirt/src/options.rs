use core::fmt;
use core::str::FromStr;

use crate::{Error, Result};

/// How materialized items get their vertical offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PositionMode {
    /// `offset(i)` is the prefix sum of every height before `i`.
    Absolute,
    /// `offset(i)` follows the materialized predecessor when present, falling back to the
    /// prefix sum otherwise.
    #[default]
    Cumulative,
}

impl PositionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Cumulative => "cumulative",
        }
    }
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "cumulative" => Ok(Self::Cumulative),
            other => Err(Error::invalid(
                "position_mode",
                format!("expected `absolute` or `cumulative`, got `{other}`"),
            )),
        }
    }
}

/// Configuration for a windowed list.
///
/// All durations are in milliseconds of the host-supplied clock.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "snake_case"))]
pub struct ListOptions {
    /// Number of items considered "visible" around the window anchor.
    pub virtual_window_length: usize,
    /// Nominal item height, used until measurements arrive.
    pub item_height: f64,
    /// Extra items materialized on each side of the visible range.
    pub preload_count: usize,
    /// Enables rendered-height measurement. When off, every item keeps the nominal height.
    pub dynamic_height: bool,
    /// Enables refinement passes after the initial sample.
    pub continuous_height: bool,
    /// Reserved for sampling strategies; validated but otherwise unused.
    pub sample_count: usize,
    /// Coalescing delay before a scheduled measurement fires.
    pub measure_delay_ms: u64,
    pub position_mode: PositionMode,
    /// Minimum interval between accepted scroll events.
    pub scroll_throttle_ms: u64,
    /// Debounce before the window is recomputed for an accepted scroll offset.
    pub recompute_delay_ms: u64,
    /// Quiet period after the last scroll event before scrolling is considered finished.
    pub scroll_idle_ms: u64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            virtual_window_length: 20,
            item_height: 100.0,
            preload_count: 10,
            dynamic_height: true,
            continuous_height: true,
            sample_count: 5,
            measure_delay_ms: 100,
            position_mode: PositionMode::Cumulative,
            scroll_throttle_ms: 16,
            recompute_delay_ms: 16,
            scroll_idle_ms: 150,
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.virtual_window_length == 0 {
            return Err(Error::invalid("virtual_window_length", "must be at least 1"));
        }
        if !self.item_height.is_finite() || self.item_height < crate::MIN_HEIGHT {
            return Err(Error::invalid(
                "item_height",
                format!("must be a finite value >= {}", crate::MIN_HEIGHT),
            ));
        }
        if self.sample_count == 0 {
            return Err(Error::invalid("sample_count", "must be at least 1"));
        }
        Ok(())
    }

    /// Size of a window recomputed away from the list edges.
    pub fn max_window_len(&self) -> usize {
        self.virtual_window_length
            .saturating_add(self.preload_count.saturating_mul(2))
    }

    /// Whether scheduled refinement passes should run at all.
    pub fn measures_continuously(&self) -> bool {
        self.dynamic_height && self.continuous_height
    }

    pub fn with_virtual_window_length(mut self, len: usize) -> Self {
        self.virtual_window_length = len;
        self
    }

    pub fn with_item_height(mut self, item_height: f64) -> Self {
        self.item_height = item_height;
        self
    }

    pub fn with_preload_count(mut self, preload_count: usize) -> Self {
        self.preload_count = preload_count;
        self
    }

    pub fn with_dynamic_height(mut self, enabled: bool) -> Self {
        self.dynamic_height = enabled;
        self
    }

    pub fn with_continuous_height(mut self, enabled: bool) -> Self {
        self.continuous_height = enabled;
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_measure_delay_ms(mut self, delay_ms: u64) -> Self {
        self.measure_delay_ms = delay_ms;
        self
    }

    pub fn with_position_mode(mut self, mode: PositionMode) -> Self {
        self.position_mode = mode;
        self
    }

    pub fn with_scroll_throttle_ms(mut self, interval_ms: u64) -> Self {
        self.scroll_throttle_ms = interval_ms;
        self
    }

    pub fn with_recompute_delay_ms(mut self, delay_ms: u64) -> Self {
        self.recompute_delay_ms = delay_ms;
        self
    }

    pub fn with_scroll_idle_ms(mut self, idle_ms: u64) -> Self {
        self.scroll_idle_ms = idle_ms;
        self
    }
}
