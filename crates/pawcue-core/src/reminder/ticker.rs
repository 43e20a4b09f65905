use std::time::{Duration, Instant};

/// Default tick period. Short enough that whole-second countdowns never lag
/// visibly behind the true remaining time.
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// A repeating timer handle.
///
/// The engine owns at most one of these; replacing or dropping it is how
/// ticking is restarted or cancelled. Missed ticks are skipped rather than
/// replayed in a burst.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Instant,
}

impl Ticker {
    /// Arm a ticker whose first tick is one period after `now`.
    pub fn start(now: Instant, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_due: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Consume the current tick and schedule the next one.
    pub fn fire(&mut self, now: Instant) {
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
    }
}
