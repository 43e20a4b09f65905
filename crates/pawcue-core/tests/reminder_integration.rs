//! Integration tests for a full reminder session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pawcue_core::notify::{NoVibration, ToneBackend, ToneBackendKind};
use pawcue_core::reminder::{ManualClock, TICK_INTERVAL};
use pawcue_core::{
    Event, Notifier, NotifyKind, PhaseKind, ReminderEngine, ScheduleConfiguration, SignalNotifier,
};

#[derive(Clone, Default)]
struct Recorder {
    kinds: Arc<Mutex<Vec<NotifyKind>>>,
}

impl Notifier for Recorder {
    fn notify(&self, kind: NotifyKind) {
        self.kinds.lock().unwrap().push(kind);
    }
}

#[test]
fn test_generated_session_runs_to_completion() {
    let clock = ManualClock::new();
    let recorder = Recorder::default();
    let mut engine = ReminderEngine::new(clock.clone(), recorder.clone()).with_seed(2024);

    // 2 minutes, 8 repetitions of about 5 seconds, rests capped at 6 seconds.
    let config = ScheduleConfiguration::new(120.0, 5.0, 8).with_max_interval(6.0);
    let started = engine.start(&config);
    assert!(matches!(started, Some(Event::RunStarted { behavior_count: 8, .. })));

    let schedule = engine.schedule().clone();
    assert_eq!(schedule.behavior_count(), 8);
    assert_eq!(schedule.behavior_secs(), 40);
    assert!(schedule.interval_secs() <= 48);
    let total = schedule.total_duration_secs();
    assert_eq!(engine.total_remaining_secs(), total);

    let mut events = Vec::new();
    let mut highest_behavior = 0;
    // A little past the end of the schedule.
    let ticks = (total * 1000 / TICK_INTERVAL.as_millis() as u64) + 10;
    for _ in 0..ticks {
        clock.advance(TICK_INTERVAL);
        if let Some(event) = engine.poll() {
            events.push(event);
        }
        highest_behavior = highest_behavior.max(engine.current_behavior_index());
        assert!(engine.total_remaining_secs() <= total);
    }

    assert!(!engine.is_running());
    assert_eq!(highest_behavior, 8);
    assert_eq!(
        events.iter().filter(|e| matches!(e, Event::RunCompleted { .. })).count(),
        1
    );

    let kinds = recorder.kinds.lock().unwrap();
    let starts = kinds.iter().filter(|k| **k == NotifyKind::Start).count();
    let intervals = schedule
        .phases()
        .iter()
        .filter(|p| p.kind == PhaseKind::Interval)
        .count();
    assert_eq!(starts, 8);
    // One stop per rest plus the completion signal.
    assert_eq!(kinds.len() - starts, intervals + 1);
}

#[test]
fn test_suspended_process_catches_up_on_next_tick() {
    let clock = ManualClock::new();
    let mut engine = ReminderEngine::new(clock.clone(), Recorder::default()).with_seed(7);
    engine.start(&ScheduleConfiguration::new(60.0, 30.0, 1));

    // Ticks stop for 12.3 seconds.
    clock.advance(Duration::from_millis(12_300));
    engine.poll();
    assert_eq!(engine.phase(), Some(PhaseKind::Behavior));
    assert_eq!(engine.phase_countdown_secs(), 18);
    assert_eq!(engine.total_remaining_secs(), 48);
}

#[test]
fn test_signal_notifier_with_silent_backend() {
    let notifier = SignalNotifier::new(ToneBackend::from_kind(ToneBackendKind::Silent), NoVibration);
    let clock = ManualClock::new();
    let mut engine = ReminderEngine::new(clock.clone(), notifier);

    engine.start(&ScheduleConfiguration::new(4.0, 2.0, 1));
    for _ in 0..25 {
        clock.advance(TICK_INTERVAL);
        engine.poll();
    }
    assert!(!engine.is_running());
    assert_eq!(engine.current_behavior_index(), 1);
}
