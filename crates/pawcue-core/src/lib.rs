//! # pawcue Core Library
//!
//! This library provides the interval reminder used during dog-training
//! sessions: a trainer asks for N repetitions of a behavior spread over a
//! session, and gets randomized behavior/rest phases with a cue at every
//! phase change. The `pawcue-cli` binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Schedule generator**: constrained random partition of the session
//!   budget into alternating behavior and interval phases
//! - **Reminder engine**: a wall-clock-based state machine driven by `poll()`
//!   or `tick()`, with deadline-based countdowns and pause/resume
//! - **Driver**: tokio task owning the engine, with watch/broadcast outputs
//! - **Notifications**: tones and vibration behind the `Notifier` trait
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ReminderEngine`]: Core reminder state machine
//! - [`generate_schedule`]: Session timeline generation
//! - [`SignalNotifier`]: Tone + vibration notifications
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod reminder;
pub mod storage;

pub use error::{ConfigError, CoreError, NotifyError, ValidationError};
pub use events::Event;
pub use notify::{Notifier, NotifyKind, NullNotifier, SignalNotifier};
pub use reminder::{
    generate_schedule, spawn_reminder, Phase, PhaseKind, ReminderEngine, ReminderHandle,
    ReminderSnapshot, Schedule, ScheduleConfiguration,
};
pub use storage::Config;
