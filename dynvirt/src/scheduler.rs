use crate::{Debounce, MeasureKind};

/// Observable phase of the [`MeasurementScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// A pass is waiting for its coalescing delay.
    Scheduled,
    /// A pass was dispatched and its geometry has not come back yet.
    Measuring,
}

/// Coalesces batch measurement requests and decides when a pass may run.
///
/// `Idle → Scheduled → Measuring → Idle`. Continuous requests made while a continuous pass is
/// scheduled restart the delay instead of queuing a second pass. A pending initial pass absorbs
/// every later request and keeps its deadline, so a stream of window changes cannot postpone
/// it.
#[derive(Clone, Debug)]
pub struct MeasurementScheduler {
    timer: Debounce<MeasureKind>,
    in_flight: Option<MeasureKind>,
}

impl MeasurementScheduler {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            timer: Debounce::new(delay_ms),
            in_flight: None,
        }
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.timer.set_delay_ms(delay_ms);
    }

    pub fn state(&self) -> SchedulerState {
        if self.timer.is_pending() {
            SchedulerState::Scheduled
        } else if self.in_flight.is_some() {
            SchedulerState::Measuring
        } else {
            SchedulerState::Idle
        }
    }

    /// The kind of the pending pass, if one is scheduled.
    pub fn pending(&self) -> Option<MeasureKind> {
        self.timer.peek().copied()
    }

    /// The kind of the dispatched pass awaiting results, if any.
    pub fn in_flight(&self) -> Option<MeasureKind> {
        self.in_flight
    }

    /// Schedules a batch pass `delay_ms` from `now_ms`.
    ///
    /// Replaces a pending continuous pass. Does nothing while an initial pass is pending.
    ///
    /// `kind` must be [`MeasureKind::Initial`] or [`MeasureKind::Continuous`]; targeted
    /// re-measurements bypass the scheduler.
    pub fn request(&mut self, kind: MeasureKind, now_ms: u64) {
        debug_assert!(
            !matches!(kind, MeasureKind::Targeted { .. }),
            "targeted measurements are not scheduled"
        );
        if let Some(MeasureKind::Initial) = self.timer.peek() {
            vtrace!(
                ?kind,
                now_ms,
                due = ?self.timer.due_at(),
                "MeasurementScheduler::request: initial pass already pending"
            );
            return;
        }
        vtrace!(?kind, now_ms, "MeasurementScheduler::request");
        self.timer.queue(kind, now_ms);
    }

    /// Fires the pending pass once its delay has elapsed.
    ///
    /// A continuous pass that comes due while `is_scrolling` is dropped; initial passes always
    /// fire. The returned pass is considered in flight until [`Self::finish`].
    pub fn poll(&mut self, now_ms: u64, is_scrolling: bool) -> Option<MeasureKind> {
        let kind = self.timer.take_ready(now_ms)?;
        if is_scrolling && !kind.is_initial() {
            vtrace!(now_ms, "MeasurementScheduler::poll: suppressed while scrolling");
            return None;
        }
        self.in_flight = Some(kind);
        Some(kind)
    }

    /// Marks the in-flight pass as complete.
    pub fn finish(&mut self) -> Option<MeasureKind> {
        self.in_flight.take()
    }

    /// Cancels the pending pass and forgets the in-flight one.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.in_flight = None;
    }
}
