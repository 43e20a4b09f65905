use std::io::Write;

use clap::Args;
use pawcue_core::error::Result;
use pawcue_core::notify::NoVibration;
use pawcue_core::reminder::{format_countdown, TokioClock};
use pawcue_core::{
    spawn_reminder, Config, CoreError, Event, PhaseKind, ReminderEngine, ReminderSnapshot,
    ScheduleConfiguration, SignalNotifier,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::SessionArgs;

/// Controls while running: `p` pause, `r` resume, `s` stop, `q` quit.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Seed for a reproducible schedule
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = Config::load()?;
    let session = args.session.resolve(&config.reminder);
    session.validate()?;
    if !session.is_feasible() {
        return Err(CoreError::Infeasible(session));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_session(&config, session, args.seed));
    // Stdin reads block a worker thread that never returns on its own.
    runtime.shutdown_background();
    result
}

async fn run_session(
    config: &Config,
    session: ScheduleConfiguration,
    seed: Option<u64>,
) -> Result<()> {
    let notifier = SignalNotifier::from_config(&config.notifications, NoVibration);
    let mut engine = ReminderEngine::new(TokioClock, notifier)
        .with_tick_interval(config.reminder.tick_interval());
    if let Some(seed) = seed {
        engine = engine.with_seed(seed);
    }

    let (handle, task) = spawn_reminder(engine);
    let mut events = handle.subscribe();
    let mut state = handle.watch_state();
    handle.start(session)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => match line.trim() {
                        "p" => handle.pause()?,
                        "r" => handle.resume()?,
                        "s" | "q" => handle.stop()?,
                        "" => {}
                        other => eprintln!("\nunknown command '{other}' (p, r, s, q)"),
                    },
                    None => stdin_open = false,
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&state.borrow_and_update());
            }
            event = events.recv() => match event {
                Ok(event) => {
                    info!(?event, "reminder event");
                    if let Event::RunCompleted { behavior_count, .. } = event {
                        println!("\ndone: {behavior_count} repetitions");
                    }
                    if event.ends_run() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    handle.shutdown()?;
    task.await.map_err(|_| CoreError::DriverClosed)?;
    println!();
    Ok(())
}

fn render(snapshot: &ReminderSnapshot) {
    let phase = match snapshot.phase {
        Some(PhaseKind::Behavior) => "behavior",
        Some(PhaseKind::Interval) => "rest",
        None => "idle",
    };
    print!(
        "\r{phase:<8} {}/{}  {}  total {}{}",
        snapshot.current_behavior_index,
        snapshot.total_behavior_count,
        format_countdown(snapshot.phase_countdown_secs),
        format_countdown(snapshot.total_remaining_secs),
        if snapshot.paused { " [paused]" } else { "         " },
    );
    let _ = std::io::stdout().flush();
}
