//! Monotonic time source. Everything in the edge-decision engine and the
//! pulser works in milliseconds off `Instant`, never wall-clock time, so
//! NTP jumps and suspend/resume can't corrupt hold timers or pulse cadence.

use std::time::{Duration, Instant};

/// A monotonic instant, wrapped so the rest of the crate never has to
/// import `std::time` directly and tests can reason in plain milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(Instant);

impl Tick {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed_ms(&self, since: Tick) -> u64 {
        self.0.saturating_duration_since(since.0).as_millis() as u64
    }

    pub fn elapsed_since_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }

    pub fn plus_ms(&self, ms: u64) -> Self {
        Self(self.0 + Duration::from_millis(ms))
    }

    /// Milliseconds from `self` until `target`, saturating at 0 if `target`
    /// is already in the past.
    pub fn until_ms(&self, target: Tick) -> u64 {
        target.0.saturating_duration_since(self.0).as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn elapsed_ms_is_nonnegative_and_monotonic() {
        let start = Tick::now();
        thread::sleep(Duration::from_millis(5));
        let later = Tick::now();
        assert!(later.elapsed_ms(start) >= 5);
    }

    #[test]
    fn plus_ms_moves_forward() {
        let now = Tick::now();
        let future = now.plus_ms(100);
        assert!(future > now);
    }
}
