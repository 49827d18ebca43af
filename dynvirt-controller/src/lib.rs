//! List orchestration for the `dynvirt` crate.
//!
//! The `dynvirt` crate provides the windowing math and height estimation. This crate wires it
//! into a single owner, [`ListController`], which:
//!
//! - owns the source list and assigns each element an index and a stable id
//! - throttles scroll events and debounces window recomputation
//! - schedules measurement passes and applies the host's geometry answers
//! - exposes the imperative recovery operations (`refresh_height`, `update_element_height`)
//!
//! This crate is intentionally framework-agnostic: hosts drive it with a millisecond clock and
//! answer [`MeasureRequest`]s with rendered heights.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod listeners;
mod source;

#[cfg(test)]
mod tests;

pub use controller::{ListController, MeasureOutcome, MeasureRequest};
pub use listeners::{HeightChangedCallback, HeightChangedListeners, ListenerId};
pub use source::{ItemId, ItemIdFn, SourceItem};

pub use dynvirt::{
    Error, Geometry, HeightChanged, ListOptions, MaterializedItem, MeasureKind, PositionMode,
    Result, SchedulerState, VisibleWindow,
};
