//! A headless list windowing engine with online item height estimation.
//!
//! For the top-level orchestration (source list ownership, scroll throttling, measurement
//! round-trips), see the `dynvirt-controller` crate.
//!
//! This crate holds the pieces that keep a long list cheap to render when item heights are not
//! known up front: a per-item height table refined by measurements, an inclusive prefix-sum
//! index over it, scroll offset → window mapping with hysteresis and preload margins, two
//! positioning strategies with a memoizing cache, and a coalescing measurement scheduler.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - scroll offsets and edge-reached notifications
//! - rendered item heights, in batches, when asked
//! - a monotonic millisecond clock for throttling/debouncing
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod error;
mod heights;
mod options;
mod position;
mod prefix;
mod scheduler;
mod timing;
mod types;
mod window;


pub use error::{Error, Result};
pub use heights::{BatchOutcome, HeightModel};
pub use options::{ListOptions, PositionMode};
pub use position::{PositionAssigner, PositionCache};
pub use prefix::CumulativeHeights;
pub use scheduler::{MeasurementScheduler, SchedulerState};
pub use timing::{Debounce, Throttle};
pub use types::{Geometry, HeightChanged, MaterializedItem, MeasureKind, VisibleWindow};
pub use window::WindowCalculator;

/// Height changes at or below this many units are treated as jitter and ignored.
pub const HEIGHT_EPSILON: f64 = 1.0;

/// Smallest height a measurement can record.
pub const MIN_HEIGHT: f64 = 1.0;
