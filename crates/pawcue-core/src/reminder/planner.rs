//! Session-shape helpers for the reminder form.
//!
//! Total time, average repetition length and repetition count are linked:
//! given two, the third can be estimated. The estimate assumes each
//! repetition is followed by a rest about as long as the repetition itself,
//! shortened to the per-interval cap when one is set.

use serde::{Deserialize, Serialize};

use super::schedule::ScheduleConfiguration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanField {
    TotalTime,
    AvgDuration,
    Count,
}

/// Raw form values in seconds. Zero means "not filled in".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanInputs {
    pub total_time_secs: f64,
    pub avg_duration_secs: f64,
    pub count: u32,
    pub max_interval_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DerivedField {
    TotalTime(u64),
    AvgDuration(u64),
    Count(u32),
}

impl DerivedField {
    pub fn field(&self) -> PlanField {
        match self {
            DerivedField::TotalTime(_) => PlanField::TotalTime,
            DerivedField::AvgDuration(_) => PlanField::AvgDuration,
            DerivedField::Count(_) => PlanField::Count,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match *self {
            DerivedField::Count(c) => Some(c),
            _ => None,
        }
    }

    /// Write the derived value back into `inputs`.
    pub fn apply(&self, mut inputs: PlanInputs) -> PlanInputs {
        match *self {
            DerivedField::TotalTime(secs) => inputs.total_time_secs = secs as f64,
            DerivedField::AvgDuration(secs) => inputs.avg_duration_secs = secs as f64,
            DerivedField::Count(c) => inputs.count = c,
        }
        inputs
    }
}

impl PlanInputs {
    pub fn to_configuration(&self) -> ScheduleConfiguration {
        ScheduleConfiguration::new(self.total_time_secs, self.avg_duration_secs, self.count)
            .with_max_interval(self.max_interval_secs)
    }

    /// Expected rest after one repetition.
    fn avg_interval(&self) -> f64 {
        if self.max_interval_secs > 0.0 {
            self.avg_duration_secs.min(self.max_interval_secs)
        } else {
            self.avg_duration_secs
        }
    }
}

/// Estimate one field from the others.
///
/// `edited` is the field the user just changed; it is never the one
/// recomputed. Candidates are tried in order count, average, total. Returns
/// `None` when nothing can be derived or the estimate rounds to zero.
pub fn derive_field(inputs: &PlanInputs, edited: Option<PlanField>) -> Option<DerivedField> {
    let t = inputs.total_time_secs;
    let a = inputs.avg_duration_secs;
    let c = inputs.count;
    let not_edited = |field: PlanField| edited != Some(field);

    if not_edited(PlanField::Count) && t > 0.0 && a > 0.0 {
        let count = (t / (a + inputs.avg_interval())).round();
        return (count >= 1.0).then(|| DerivedField::Count(count as u32));
    }
    if not_edited(PlanField::AvgDuration) && t > 0.0 && c > 0 {
        let avg = (t / (f64::from(c) * 2.0)).round();
        return (avg >= 1.0).then(|| DerivedField::AvgDuration(avg as u64));
    }
    if not_edited(PlanField::TotalTime) && a > 0.0 && c > 0 {
        let total = (a * f64::from(c) + inputs.avg_interval() * f64::from(c)).round();
        return (total >= 1.0).then(|| DerivedField::TotalTime(total as u64));
    }
    None
}

/// `MM:SS`; minutes keep growing past 99.
pub fn format_countdown(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
