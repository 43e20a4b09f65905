//! Async driver that owns a [`ReminderEngine`] and ticks it on time.
//!
//! All control calls and ticks go through one task, so they can never race.
//! The task sleeps until either a command arrives or the engine's ticker is
//! due; while idle or paused it only waits for commands.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::clock::Clock;
use super::engine::{ReminderEngine, ReminderSnapshot};
use super::schedule::{Schedule, ScheduleConfiguration};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::Notifier;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
enum Command {
    Start(ScheduleConfiguration),
    StartSchedule(Schedule),
    Pause,
    Resume,
    Stop,
    Shutdown,
}

/// Cloneable control surface for a running driver.
#[derive(Debug, Clone)]
pub struct ReminderHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ReminderSnapshot>,
    events: broadcast::Sender<Event>,
}

impl ReminderHandle {
    pub fn start(&self, config: ScheduleConfiguration) -> Result<()> {
        self.send(Command::Start(config))
    }

    pub fn start_schedule(&self, schedule: Schedule) -> Result<()> {
        self.send(Command::StartSchedule(schedule))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Stop any run and end the driver task.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Latest published state.
    pub fn state(&self) -> ReminderSnapshot {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ReminderSnapshot> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::DriverClosed)
    }
}

/// Spawn the driver task on the current tokio runtime.
pub fn spawn_reminder<C, N>(engine: ReminderEngine<C, N>) -> (ReminderHandle, JoinHandle<()>)
where
    C: Clock + Send + 'static,
    N: Notifier + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(engine.snapshot());
    let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

    let handle = ReminderHandle {
        commands: command_tx,
        state: state_rx,
        events: event_tx.clone(),
    };
    let task = tokio::spawn(drive(engine, command_rx, state_tx, event_tx));
    (handle, task)
}

async fn drive<C: Clock, N: Notifier>(
    mut engine: ReminderEngine<C, N>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ReminderSnapshot>,
    events: broadcast::Sender<Event>,
) {
    loop {
        let next_tick = engine.next_tick_at();
        let event = tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                if matches!(command, Command::Shutdown) {
                    publish(&events, engine.stop());
                    state.send_replace(engine.snapshot());
                    break;
                }
                apply(&mut engine, command)
            }
            _ = sleep_until(next_tick), if next_tick.is_some() => engine.poll(),
        };

        publish(&events, event);
        state.send_if_modified(|current| {
            let latest = engine.snapshot();
            if *current == latest {
                return false;
            }
            *current = latest;
            true
        });
    }
    debug!("reminder driver stopped");
}

fn apply<C: Clock, N: Notifier>(engine: &mut ReminderEngine<C, N>, command: Command) -> Option<Event> {
    match command {
        Command::Start(config) => engine.start(&config),
        Command::StartSchedule(schedule) => engine.start_schedule(schedule),
        Command::Pause => engine.pause(),
        Command::Resume => engine.resume(),
        Command::Stop | Command::Shutdown => engine.stop(),
    }
}

fn publish(events: &broadcast::Sender<Event>, event: Option<Event>) {
    if let Some(event) = event {
        // No subscribers is fine.
        let _ = events.send(event);
    }
}

async fn sleep_until(at: Option<std::time::Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::reminder::clock::TokioClock;
    use crate::reminder::schedule::{Phase, PhaseKind};
    use std::time::Duration;

    fn spawn() -> (ReminderHandle, JoinHandle<()>) {
        spawn_reminder(ReminderEngine::new(TokioClock, NullNotifier).with_seed(9))
    }

    async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Event {
        rx.recv().await.expect("driver closed")
    }

    #[tokio::test(start_paused = true)]
    async fn runs_schedule_to_completion() {
        let (handle, task) = spawn();
        let mut events = handle.subscribe();

        handle
            .start_schedule(Schedule::from_phases([Phase::behavior(2), Phase::interval(1)]))
            .unwrap();

        assert!(matches!(next_event(&mut events).await, Event::RunStarted { .. }));
        assert!(matches!(
            next_event(&mut events).await,
            Event::PhaseStarted {
                kind: PhaseKind::Interval,
                ..
            }
        ));
        assert!(matches!(
            next_event(&mut events).await,
            Event::RunCompleted { behavior_count: 1, .. }
        ));

        let state = handle.state();
        assert!(!state.running);
        assert_eq!(state.total_remaining_secs, 0);

        handle.shutdown().unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_the_countdown() {
        let (handle, _task) = spawn();
        let mut events = handle.subscribe();
        let mut state = handle.watch_state();

        handle.start(ScheduleConfiguration::new(20.0, 10.0, 1)).unwrap();
        next_event(&mut events).await;

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        handle.pause().unwrap();
        assert!(matches!(next_event(&mut events).await, Event::RunPaused { .. }));
        state.changed().await.unwrap();
        let paused = state.borrow_and_update().clone();
        assert!(paused.paused);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.state().total_remaining_secs, paused.total_remaining_secs);

        handle.resume().unwrap();
        assert!(matches!(next_event(&mut events).await, Event::RunResumed { .. }));
        tokio::time::sleep(Duration::from_millis(250)).await;
        let resumed = handle.state();
        assert!(resumed.running && !resumed.paused);
        assert_eq!(resumed.total_remaining_secs, paused.total_remaining_secs);
    }

    #[tokio::test(start_paused = true)]
    async fn infeasible_start_stays_idle() {
        let (handle, _task) = spawn();
        handle.start(ScheduleConfiguration::new(5.0, 10.0, 2)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.state().running);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_fail_after_shutdown() {
        let (handle, task) = spawn();
        handle.shutdown().unwrap();
        task.await.unwrap();
        assert!(matches!(handle.stop(), Err(CoreError::DriverClosed)));
    }
}
