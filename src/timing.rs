//! Rate limiting for host events.
//!
//! Both primitives take the current [`Instant`] as an argument instead of
//! reading the clock themselves, so the host loop decides what "now" is and
//! tests can step time explicitly.

use std::time::{Duration, Instant};

/// Lets at most one event through per `interval`.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns `true` if the event at `now` should be handled.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Holds the most recent value until `delay` has passed without a newer one.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a value, pushing the deadline back.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Take the pending value once its deadline has passed.
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_drops_events_inside_interval() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(16));
        assert!(throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_millis(5)));
        assert!(!throttle.ready(start + Duration::from_millis(15)));
        assert!(throttle.ready(start + Duration::from_millis(16)));
    }

    #[test]
    fn test_debounce_keeps_latest_value() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(100));
        debounce.push(1, start);
        debounce.push(2, start + Duration::from_millis(50));
        assert_eq!(debounce.take_ready(start + Duration::from_millis(120)), None);
        assert_eq!(debounce.take_ready(start + Duration::from_millis(150)), Some(2));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_debounce_cancel() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(10));
        debounce.push("resize", start);
        debounce.cancel();
        assert_eq!(debounce.take_ready(start + Duration::from_secs(1)), None);
    }
}
