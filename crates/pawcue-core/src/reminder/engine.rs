//! Reminder engine implementation.
//!
//! The reminder engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller either calls `poll()` often enough or hands
//! the engine to [`super::driver::spawn_reminder`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Idle
//! ```
//!
//! Countdowns are recomputed from absolute deadlines on every tick, so a late
//! tick shows the true remaining time instead of "one less than last time".
//! Pausing turns the deadlines into plain remaining durations; resuming turns
//! them back into deadlines, which keeps paused time out of both countdowns.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = ReminderEngine::new(MonotonicClock, notifier);
//! engine.start(&config);
//! // In a loop:
//! engine.poll(); // Returns Some(Event) when a phase changes
//! ```

use std::time::{Duration, Instant};

use chrono::Utc;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, MonotonicClock};
use super::schedule::{
    generate_schedule_with, PhaseKind, Schedule, ScheduleConfiguration, MAX_SESSION_SECS,
};
use super::ticker::{Ticker, TICK_INTERVAL};
use crate::events::Event;
use crate::notify::{Notifier, NotifyKind, NullNotifier};

/// Observable state of the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSnapshot {
    /// `None` while idle.
    pub phase: Option<PhaseKind>,
    /// 1-based ordinal of the active (or last finished) behavior; 0 before any run.
    pub current_behavior_index: u32,
    pub total_behavior_count: u32,
    pub phase_countdown_secs: u64,
    pub total_remaining_secs: u64,
    pub running: bool,
    pub paused: bool,
}

/// Remaining durations captured at pause time.
#[derive(Debug, Clone, Copy)]
struct PausedRemaining {
    phase: Duration,
    total: Duration,
}

/// Core reminder engine.
///
/// Owns at most one [`Ticker`]; every start, pause and stop replaces or
/// drops it, so two tick sources never drive the same run.
pub struct ReminderEngine<C = MonotonicClock, N = NullNotifier> {
    clock: C,
    notifier: N,
    rng: Mcg128Xsl64,
    tick_interval: Duration,
    audio_unlocked: bool,

    phase: Option<PhaseKind>,
    current_behavior_index: u32,
    total_behavior_count: u32,
    phase_countdown_secs: u64,
    total_remaining_secs: u64,
    running: bool,
    paused: bool,

    schedule: Schedule,
    schedule_index: usize,
    phase_deadline: Option<Instant>,
    total_deadline: Option<Instant>,
    paused_remaining: Option<PausedRemaining>,
    ticker: Option<Ticker>,
}

impl<C: Clock, N: Notifier> ReminderEngine<C, N> {
    /// Create an idle engine.
    pub fn new(clock: C, notifier: N) -> Self {
        Self {
            clock,
            notifier,
            rng: Mcg128Xsl64::from_entropy(),
            tick_interval: TICK_INTERVAL,
            audio_unlocked: false,
            phase: None,
            current_behavior_index: 0,
            total_behavior_count: 0,
            phase_countdown_secs: 0,
            total_remaining_secs: 0,
            running: false,
            paused: false,
            schedule: Schedule::empty(),
            schedule_index: 0,
            phase_deadline: None,
            total_deadline: None,
            paused_remaining: None,
            ticker: None,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Make generated schedules reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mcg128Xsl64::seed_from_u64(seed);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Option<PhaseKind> {
        self.phase
    }

    pub fn current_behavior_index(&self) -> u32 {
        self.current_behavior_index
    }

    pub fn total_behavior_count(&self) -> u32 {
        self.total_behavior_count
    }

    pub fn phase_countdown_secs(&self) -> u64 {
        self.phase_countdown_secs
    }

    pub fn total_remaining_secs(&self) -> u64 {
        self.total_remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The schedule of the active run (empty while idle).
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// When the owned ticker next wants `poll()` to tick. `None` while idle or paused.
    pub fn next_tick_at(&self) -> Option<Instant> {
        self.ticker.as_ref().map(Ticker::next_due)
    }

    pub fn snapshot(&self) -> ReminderSnapshot {
        ReminderSnapshot {
            phase: self.phase,
            current_behavior_index: self.current_behavior_index,
            total_behavior_count: self.total_behavior_count,
            phase_countdown_secs: self.phase_countdown_secs,
            total_remaining_secs: self.total_remaining_secs,
            running: self.running,
            paused: self.paused,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Generate a schedule for `config` and run it, replacing any active run.
    ///
    /// An infeasible configuration is a silent no-op.
    pub fn start(&mut self, config: &ScheduleConfiguration) -> Option<Event> {
        let schedule = generate_schedule_with(config, &mut self.rng);
        if schedule.is_empty() {
            debug!(?config, "configuration yields no schedule, not starting");
            return None;
        }
        self.begin(schedule, config.count)
    }

    /// Run a schedule generated elsewhere, e.g. a plan the user previewed.
    ///
    /// Schedules longer than [`MAX_SESSION_SECS`] are refused like an
    /// infeasible configuration.
    pub fn start_schedule(&mut self, schedule: Schedule) -> Option<Event> {
        let behavior_count = schedule.behavior_count() as u32;
        self.begin(schedule, behavior_count)
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running || self.paused {
            return None;
        }
        let now = self.clock.now();
        self.ticker = None;

        let remaining = PausedRemaining {
            phase: remaining(self.phase_deadline, now),
            total: remaining(self.total_deadline, now),
        };
        self.paused_remaining = Some(remaining);
        self.paused = true;
        debug!(?remaining, "reminder paused");

        Some(Event::RunPaused {
            phase_remaining_ms: remaining.phase.as_millis() as u64,
            total_remaining_ms: remaining.total.as_millis() as u64,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if !self.running || !self.paused {
            return None;
        }
        let remaining = self.paused_remaining.take()?;
        let now = self.clock.now();

        self.phase_deadline = now.checked_add(remaining.phase);
        self.total_deadline = now.checked_add(remaining.total);
        self.paused = false;
        self.ticker = Some(Ticker::start(now, self.tick_interval));
        debug!(?remaining, "reminder resumed");

        Some(Event::RunResumed {
            phase_remaining_ms: remaining.phase.as_millis() as u64,
            total_remaining_ms: remaining.total.as_millis() as u64,
            at: Utc::now(),
        })
    }

    /// Always safe; returns an event only if a run was actually stopped.
    pub fn stop(&mut self) -> Option<Event> {
        let was_running = self.running;
        self.reset_to_idle();
        if !was_running {
            return None;
        }
        info!("reminder stopped");
        Some(Event::RunStopped { at: Utc::now() })
    }

    /// Tick if the owned ticker is due.
    pub fn poll(&mut self) -> Option<Event> {
        let now = self.clock.now();
        match self.ticker.as_mut() {
            Some(ticker) if ticker.is_due(now) => ticker.fire(now),
            _ => return None,
        }
        self.tick()
    }

    /// Refresh both countdowns from their deadlines and advance when the
    /// current phase is over.
    ///
    /// Returns `Some(Event)` when a phase starts or the run completes.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running || self.paused {
            return None;
        }
        let now = self.clock.now();
        self.phase_countdown_secs = ceil_secs(remaining(self.phase_deadline, now));
        self.total_remaining_secs = ceil_secs(remaining(self.total_deadline, now));

        if self.phase_countdown_secs == 0 {
            return self.advance_phase(now);
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, schedule: Schedule, behavior_count: u32) -> Option<Event> {
        let first = *schedule.get(0)?;
        let now = self.clock.now();
        let total_secs = schedule.total_duration_secs();
        let total_deadline = (total_secs <= MAX_SESSION_SECS)
            .then(|| now.checked_add(Duration::from_secs(total_secs)))
            .flatten();
        let Some(total_deadline) = total_deadline else {
            warn!(total_secs, "schedule too long to run, not starting");
            return None;
        };

        if !self.audio_unlocked {
            self.notifier.unlock();
            self.audio_unlocked = true;
        }

        // Cancel the previous run's ticker before anything else.
        self.ticker = None;
        let phase_count = schedule.len();

        self.schedule = schedule;
        self.schedule_index = 0;
        self.paused = false;
        self.paused_remaining = None;
        self.total_deadline = Some(total_deadline);
        self.total_behavior_count = behavior_count;
        self.total_remaining_secs = total_secs;
        self.current_behavior_index = 0;
        self.running = true;
        info!(phase_count, behavior_count, total_secs, "reminder started");

        self.advance_phase(now);
        self.ticker = Some(Ticker::start(now, self.tick_interval));

        Some(Event::RunStarted {
            behavior_count,
            phase_count,
            total_secs,
            first_phase: first.kind,
            first_phase_secs: first.duration_secs,
            at: Utc::now(),
        })
    }

    fn advance_phase(&mut self, now: Instant) -> Option<Event> {
        let index = self.schedule_index;
        let Some(phase) = self.schedule.get(index).copied() else {
            self.notifier.notify(NotifyKind::Stop);
            self.reset_to_idle();
            info!(behavior_count = self.total_behavior_count, "reminder run complete");
            return Some(Event::RunCompleted {
                behavior_count: self.total_behavior_count,
                at: Utc::now(),
            });
        };

        self.phase = Some(phase.kind);
        self.phase_countdown_secs = phase.duration_secs;
        self.phase_deadline = now.checked_add(phase.duration()).or(self.total_deadline);
        match phase.kind {
            PhaseKind::Behavior => {
                self.current_behavior_index = self.schedule.behavior_ordinal_at(index);
                self.notifier.notify(NotifyKind::Start);
            }
            PhaseKind::Interval => self.notifier.notify(NotifyKind::Stop),
        }
        self.schedule_index = index + 1;
        debug!(index, kind = ?phase.kind, secs = phase.duration_secs, "phase started");

        Some(Event::PhaseStarted {
            schedule_index: index,
            kind: phase.kind,
            behavior_index: self.current_behavior_index,
            duration_secs: phase.duration_secs,
            at: Utc::now(),
        })
    }

    /// Back to idle. The behavior ordinal and count of the last run stay readable.
    fn reset_to_idle(&mut self) {
        self.ticker = None;
        self.schedule = Schedule::empty();
        self.schedule_index = 0;
        self.phase_deadline = None;
        self.total_deadline = None;
        self.paused_remaining = None;
        self.phase = None;
        self.phase_countdown_secs = 0;
        self.total_remaining_secs = 0;
        self.running = false;
        self.paused = false;
    }
}

fn remaining(deadline: Option<Instant>, now: Instant) -> Duration {
    deadline.map_or(Duration::ZERO, |d| d.saturating_duration_since(now))
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_nanos().div_ceil(1_000_000_000) as u64
}
