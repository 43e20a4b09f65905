//! Interval reminder: schedule generation and the live countdown that runs it.

mod clock;
mod driver;
mod engine;
mod planner;
mod schedule;
mod ticker;

pub use clock::{Clock, ManualClock, MonotonicClock, TokioClock};
pub use driver::{spawn_reminder, ReminderHandle};
pub use engine::{ReminderEngine, ReminderSnapshot};
pub use planner::{derive_field, format_countdown, DerivedField, PlanField, PlanInputs};
pub use schedule::{
    generate_schedule, generate_schedule_with, Phase, PhaseKind, Schedule, ScheduleConfiguration,
    MAX_COUNT, MAX_SESSION_SECS,
};
pub use ticker::{Ticker, TICK_INTERVAL};
