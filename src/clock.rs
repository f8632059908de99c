//! Virtual clock and run flag.

use crate::time::VirtualTime;

/// Current virtual time plus the running flag checked by the driver loop.
///
/// `now` only moves forward, and only when the driver begins dispatching
/// an event (or when the whole simulation is reset).
#[derive(Debug, Clone, Default)]
pub struct Clock {
    now: VirtualTime,
    running: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Move the clock to `time`, the due time of the event being dispatched.
    pub(crate) fn advance_to(&mut self, time: VirtualTime) {
        debug_assert!(
            time >= self.now,
            "virtual time went backward: now={}, event={}",
            self.now,
            time
        );
        self.now = time;
    }

    pub(crate) fn start(&mut self) {
        self.running = true;
    }

    /// Clear the running flag. The driver loop observes this before its
    /// next extraction.
    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    pub(crate) fn reset(&mut self) {
        self.now = VirtualTime::ZERO;
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle_at_zero() {
        let clock = Clock::new();
        assert_eq!(clock.now(), VirtualTime::ZERO);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_advance_and_flags() {
        let mut clock = Clock::new();
        clock.start();
        clock.advance_to(VirtualTime::new(5));
        clock.advance_to(VirtualTime::new(5));
        assert_eq!(clock.now(), VirtualTime::new(5));
        assert!(clock.is_running());
        clock.stop();
        assert!(!clock.is_running());
    }

    #[test]
    fn test_reset_rewinds() {
        let mut clock = Clock::new();
        clock.start();
        clock.advance_to(VirtualTime::new(99));
        clock.reset();
        assert_eq!(clock.now(), VirtualTime::ZERO);
        assert!(!clock.is_running());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "virtual time went backward")]
    fn test_backward_advance_is_caught() {
        let mut clock = Clock::new();
        clock.advance_to(VirtualTime::new(10));
        clock.advance_to(VirtualTime::new(3));
    }
}
