use clap::Args;
use pawcue_core::error::Result;
use pawcue_core::reminder::{format_countdown, generate_schedule_with};
use pawcue_core::{Config, CoreError, PhaseKind, Schedule};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

use super::SessionArgs;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Seed for a reproducible plan
    #[arg(long)]
    pub seed: Option<u64>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<()> {
    // Preview only: read the config without creating it.
    let config = Config::load_from(&Config::path()?)?;
    let session = args.session.resolve(&config.reminder);
    session.validate()?;

    let mut rng = match args.seed {
        Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
        None => Mcg128Xsl64::from_entropy(),
    };
    let schedule = generate_schedule_with(&session, &mut rng);
    if schedule.is_empty() {
        return Err(CoreError::Infeasible(session));
    }

    if args.json {
        let out = serde_json::json!({
            "config": session,
            "schedule": schedule,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_table(&schedule);
    }
    Ok(())
}

fn print_table(schedule: &Schedule) {
    println!("{:>3}  {:<9} {:>6}", "#", "phase", "time");
    for (i, phase) in schedule.phases().iter().enumerate() {
        let label = match phase.kind {
            PhaseKind::Behavior => "behavior",
            PhaseKind::Interval => "interval",
        };
        println!(
            "{:>3}  {:<9} {:>6}",
            i + 1,
            label,
            format_countdown(phase.duration_secs)
        );
    }
    println!(
        "behaviors: {} ({}s)  intervals: {}s  total: {}",
        schedule.behavior_count(),
        schedule.behavior_secs(),
        schedule.interval_secs(),
        format_countdown(schedule.total_duration_secs())
    );
}
