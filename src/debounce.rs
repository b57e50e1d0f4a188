use std::time::{Duration, Instant};

/// Trailing-edge debouncer: only the last value pushed within `delay` is
/// released, once `delay` has passed without another push.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace the pending value and restart the timer.
    pub fn push(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    /// When the pending value becomes ready.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// Take the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|at| at <= now) {
            self.flush()
        } else {
            None
        }
    }

    /// Take the pending value regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }
}
