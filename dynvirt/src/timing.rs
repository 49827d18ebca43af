//! Clock-agnostic rate limiting.
//!
//! Both primitives are driven by a host-supplied millisecond timestamp, so they work the same
//! under a frame loop, a timer wheel or a test.

/// Drops calls that arrive within `interval_ms` of the previously accepted call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Throttle {
    interval_ms: u64,
    last_accepted_ms: Option<u64>,
}

impl Throttle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_accepted_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
    }

    /// Returns `true` (and records `now_ms`) if the call may proceed.
    pub fn accept(&mut self, now_ms: u64) -> bool {
        if let Some(last) = self.last_accepted_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return false;
            }
        }
        self.last_accepted_ms = Some(now_ms);
        true
    }

    pub fn reset(&mut self) {
        self.last_accepted_ms = None;
    }
}

/// Holds a queued value until `delay_ms` has passed.
///
/// [`Self::queue`] replaces the pending value and restarts the delay (trailing debounce).
/// [`Self::supersede`] replaces it but keeps the original deadline, which caps firing at once
/// per `delay_ms` under a steady stream of updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Debounce<T> {
    delay_ms: u64,
    pending: Option<(T, u64)>, // (value, queued_at_ms)
}

impl<T> Debounce<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    pub fn queue(&mut self, value: T, now_ms: u64) {
        self.pending = Some((value, now_ms));
    }

    /// Replaces the pending value without moving its deadline, or queues `value` if nothing
    /// is pending.
    pub fn supersede(&mut self, value: T, now_ms: u64) {
        let queued_at = self.pending.as_ref().map_or(now_ms, |(_, at)| *at);
        self.pending = Some((value, queued_at));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(v, _)| v)
    }

    /// When the pending value becomes ready, if any.
    pub fn due_at(&self) -> Option<u64> {
        self.pending
            .as_ref()
            .map(|(_, at)| at.saturating_add(self.delay_ms))
    }

    /// Takes the pending value once its delay has elapsed.
    pub fn take_ready(&mut self, now_ms: u64) -> Option<T> {
        let due = self.due_at()?;
        if now_ms < due {
            return None;
        }
        self.pending.take().map(|(v, _)| v)
    }

    /// Cancels the pending value, returning it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

impl<T> Default for Debounce<T> {
    fn default() -> Self {
        Self::new(0)
    }
}
