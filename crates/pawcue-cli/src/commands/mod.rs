pub mod config;
pub mod plan;
pub mod run;
pub mod suggest;

use clap::Args;
use pawcue_core::reminder::{derive_field, PlanField, PlanInputs};
use pawcue_core::storage::ReminderConfig;
use pawcue_core::ScheduleConfiguration;

/// Session shape options shared by `plan` and `run`.
///
/// Anything left out comes from the `[reminder]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Total session time (e.g. 300, 90s, 5m)
    #[arg(long, value_parser = parse_seconds)]
    pub total: Option<f64>,
    /// Average length of one repetition (e.g. 5, 5s, 0.5m)
    #[arg(long, value_parser = parse_seconds)]
    pub avg: Option<f64>,
    /// Number of repetitions; estimated from total and avg when omitted
    #[arg(long)]
    pub count: Option<u32>,
    /// Longest allowed rest between repetitions; 0 = no cap
    #[arg(long, value_parser = parse_seconds)]
    pub max_interval: Option<f64>,
}

impl SessionArgs {
    pub fn resolve(&self, defaults: &ReminderConfig) -> ScheduleConfiguration {
        let mut inputs = PlanInputs {
            total_time_secs: self.total.unwrap_or(defaults.total_time_secs),
            avg_duration_secs: self.avg.unwrap_or(defaults.avg_duration_secs),
            count: self.count.unwrap_or(defaults.count),
            max_interval_secs: self.max_interval.unwrap_or(defaults.max_interval_secs),
        };
        if inputs.count == 0 {
            if let Some(derived) = derive_field(&inputs, Some(PlanField::TotalTime)) {
                inputs = derived.apply(inputs);
            }
        }
        inputs.to_configuration()
    }
}

/// Parse `90`, `90s`, `5m` or `1.5m` into seconds.
pub fn parse_seconds(raw: &str) -> Result<f64, String> {
    let s = raw.trim();
    let (number, multiplier) = if let Some(n) = s.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1.0)
    } else {
        (s, 1.0)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{raw}' (use e.g. 90, 90s, 5m)"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("duration must be a non-negative number, got '{raw}'"));
    }
    Ok(value * multiplier)
}
