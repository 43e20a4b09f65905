use clap::Args;
use pawcue_core::error::Result;
use pawcue_core::reminder::{derive_field, DerivedField, PlanField, PlanInputs};
use pawcue_core::ValidationError;

use super::parse_seconds;

/// Leave out exactly one of `--total`, `--avg` and `--count`.
#[derive(Args, Debug)]
pub struct SuggestArgs {
    #[arg(long, value_parser = parse_seconds)]
    pub total: Option<f64>,
    #[arg(long, value_parser = parse_seconds)]
    pub avg: Option<f64>,
    #[arg(long)]
    pub count: Option<u32>,
    #[arg(long, value_parser = parse_seconds, default_value = "0")]
    pub max_interval: f64,
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SuggestArgs) -> Result<()> {
    let missing = missing_field(&args)?;
    let inputs = PlanInputs {
        total_time_secs: args.total.unwrap_or(0.0),
        avg_duration_secs: args.avg.unwrap_or(0.0),
        count: args.count.unwrap_or(0),
        max_interval_secs: args.max_interval,
    };

    // Mark every other field as edited so only the missing one is derived.
    let edited = match missing {
        PlanField::Count => PlanField::TotalTime,
        PlanField::AvgDuration | PlanField::TotalTime => PlanField::Count,
    };
    let derived = derive_field(&inputs, Some(edited))
        .filter(|d| d.field() == missing)
        .ok_or_else(|| invalid("cannot estimate from the given values"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&derived)?);
    } else {
        match derived {
            DerivedField::TotalTime(secs) => println!("total: {secs}s"),
            DerivedField::AvgDuration(secs) => println!("avg: {secs}s"),
            DerivedField::Count(count) => println!("count: {count}"),
        }
    }
    Ok(())
}

fn missing_field(args: &SuggestArgs) -> Result<PlanField, ValidationError> {
    match (args.total, args.avg, args.count) {
        (None, Some(_), Some(_)) => Ok(PlanField::TotalTime),
        (Some(_), None, Some(_)) => Ok(PlanField::AvgDuration),
        (Some(_), Some(_), None) => Ok(PlanField::Count),
        _ => Err(invalid("give exactly two of --total, --avg and --count")),
    }
}

fn invalid(message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: "total/avg/count".into(),
        message: message.into(),
    }
}
