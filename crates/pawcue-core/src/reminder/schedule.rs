//! Randomized session timeline generation.
//!
//! A session shape (total time, repetition count, average repetition length,
//! optional per-interval cap) is turned into an alternating sequence of
//! behavior and interval phases. Individual phase lengths are random; the
//! aggregate sums are exact.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest session the generator accepts, in seconds.
pub const MAX_SESSION_SECS: u64 = u32::MAX as u64;

/// Most repetitions one session may ask for.
pub const MAX_COUNT: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Behavior,
    Interval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    /// Always at least 1.
    pub duration_secs: u64,
}

impl Phase {
    pub fn behavior(duration_secs: u64) -> Self {
        Self {
            kind: PhaseKind::Behavior,
            duration_secs,
        }
    }

    pub fn interval(duration_secs: u64) -> Self {
        Self {
            kind: PhaseKind::Interval,
            duration_secs,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// Desired shape of one training session. All times are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfiguration {
    /// Upper bound for the whole run.
    pub total_time_secs: f64,
    /// Target mean length of one behavior phase.
    pub avg_duration_secs: f64,
    /// Number of behavior repetitions.
    pub count: u32,
    /// Cap for any single interval phase; `0` means no cap.
    #[serde(default)]
    pub max_interval_secs: f64,
}

/// Integer budgets derived from a feasible configuration.
#[derive(Debug, Clone, Copy)]
struct Budget {
    behavior_secs: u64,
    interval_secs: u64,
    /// Interval budget before flooring, used to size the random draws.
    interval_raw: f64,
    interval_cap: Option<u64>,
}

impl ScheduleConfiguration {
    pub fn new(total_time_secs: f64, avg_duration_secs: f64, count: u32) -> Self {
        Self {
            total_time_secs,
            avg_duration_secs,
            count,
            max_interval_secs: 0.0,
        }
    }

    pub fn with_max_interval(mut self, max_interval_secs: f64) -> Self {
        self.max_interval_secs = max_interval_secs;
        self
    }

    /// Form-level validation of the raw numbers.
    ///
    /// A valid configuration can still be infeasible (see [`Self::is_feasible`]).
    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("total_time_secs", self.total_time_secs)?;
        positive("avg_duration_secs", self.avg_duration_secs)?;
        if self.count == 0 {
            return Err(ValidationError::InvalidValue {
                field: "count".into(),
                message: "at least one repetition is required".into(),
            });
        }
        if self.count > MAX_COUNT {
            return Err(ValidationError::InvalidValue {
                field: "count".into(),
                message: format!("at most {MAX_COUNT} repetitions are supported"),
            });
        }
        within_session_limit("total_time_secs", self.total_time_secs)?;
        within_session_limit("avg_duration_secs", self.avg_duration_secs)?;
        if !self.max_interval_secs.is_finite() || self.max_interval_secs < 0.0 {
            return Err(ValidationError::Negative {
                field: "max_interval_secs",
                value: self.max_interval_secs,
            });
        }
        Ok(())
    }

    /// Whether [`generate_schedule`] would produce a non-empty schedule.
    pub fn is_feasible(&self) -> bool {
        self.budget().is_some()
    }

    fn has_interval_cap(&self) -> bool {
        self.max_interval_secs.is_finite() && self.max_interval_secs > 0.0
    }

    fn budget(&self) -> Option<Budget> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if self.count == 0 || !usable(self.total_time_secs) || !usable(self.avg_duration_secs) {
            return None;
        }
        let limit = MAX_SESSION_SECS as f64;
        if self.count > MAX_COUNT || self.total_time_secs > limit {
            return None;
        }

        let count = f64::from(self.count);
        let total_behavior = self.avg_duration_secs * count;
        let mut total_interval = self.total_time_secs - total_behavior;
        if total_interval < 0.0 {
            return None;
        }

        let behavior_secs = total_behavior.round() as u64;
        // Every behavior phase needs at least one second.
        if behavior_secs < u64::from(self.count) {
            return None;
        }

        let mut interval_cap = None;
        if self.has_interval_cap() {
            total_interval = total_interval.min(self.max_interval_secs * count);
            interval_cap = Some((self.max_interval_secs.floor() as u64).max(1));
        }

        let mut interval_secs = total_interval.floor() as u64;
        if let Some(cap) = interval_cap {
            interval_secs = interval_secs.min(cap.saturating_mul(u64::from(self.count)));
        }

        Some(Budget {
            behavior_secs,
            interval_secs,
            interval_raw: total_interval,
            interval_cap,
        })
    }
}

fn within_session_limit(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value <= MAX_SESSION_SECS as f64 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.into(),
            message: format!("longer than {MAX_SESSION_SECS} seconds"),
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

/// Ordered timeline of phases for one reminder run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    phases: Vec<Phase>,
}

impl Schedule {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a schedule from explicit phases. Zero-length phases are dropped.
    pub fn from_phases(phases: impl IntoIterator<Item = Phase>) -> Self {
        Self {
            phases: phases.into_iter().filter(|p| p.duration_secs > 0).collect(),
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Saturates at `u64::MAX` for hand-built schedules.
    pub fn total_duration_secs(&self) -> u64 {
        saturating_sum(self.phases.iter())
    }

    pub fn behavior_count(&self) -> usize {
        self.of_kind(PhaseKind::Behavior).count()
    }

    pub fn behavior_secs(&self) -> u64 {
        saturating_sum(self.of_kind(PhaseKind::Behavior))
    }

    pub fn interval_secs(&self) -> u64 {
        saturating_sum(self.of_kind(PhaseKind::Interval))
    }

    /// 1-based ordinal of the behavior phase at or before `index`.
    pub fn behavior_ordinal_at(&self, index: usize) -> u32 {
        self.phases
            .iter()
            .take(index.saturating_add(1))
            .filter(|p| p.kind == PhaseKind::Behavior)
            .count() as u32
    }

    fn of_kind(&self, kind: PhaseKind) -> impl Iterator<Item = &Phase> {
        self.phases.iter().filter(move |p| p.kind == kind)
    }
}

fn saturating_sum<'a>(phases: impl Iterator<Item = &'a Phase>) -> u64 {
    phases.fold(0, |acc, p| acc.saturating_add(p.duration_secs))
}

/// Generate a schedule using the thread-local RNG.
pub fn generate_schedule(config: &ScheduleConfiguration) -> Schedule {
    generate_schedule_with(config, &mut rand::thread_rng())
}

/// Generate a schedule from an explicit random source.
///
/// Returns an empty schedule when the configuration is infeasible: no
/// repetitions, non-positive times, or behavior time alone exceeding the
/// total.
pub fn generate_schedule_with<R: Rng + ?Sized>(
    config: &ScheduleConfiguration,
    rng: &mut R,
) -> Schedule {
    let Some(budget) = config.budget() else {
        return Schedule::empty();
    };
    let count = config.count as usize;
    let avg = config.avg_duration_secs;

    let behavior_range = DrawRange {
        min: (avg * 0.2).round().max(1.0),
        max: avg * 2.0,
    };
    let behaviors = distribute(rng, count, budget.behavior_secs, behavior_range, None);

    let intervals = if budget.interval_secs == 0 {
        vec![0; count]
    } else {
        let per_item_max = if config.has_interval_cap() {
            config.max_interval_secs
        } else {
            ((budget.interval_raw / count as f64).round() * 2.0).max(2.0)
        };
        let interval_range = DrawRange {
            min: 1.0,
            max: per_item_max,
        };
        distribute(
            rng,
            count,
            budget.interval_secs,
            interval_range,
            budget.interval_cap,
        )
    };

    let phases = behaviors
        .into_iter()
        .zip(intervals)
        .flat_map(|(behavior, interval)| [Phase::behavior(behavior), Phase::interval(interval)]);
    Schedule::from_phases(phases)
}

#[derive(Debug, Clone, Copy)]
struct DrawRange {
    min: f64,
    max: f64,
}

impl DrawRange {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Split `target` seconds over `count` items, each at least 1 and at most
/// `cap` when given.
///
/// When `target < count` not every item can get a second: `target` randomly
/// chosen items get 1 and the rest 0.
fn distribute<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    target: u64,
    range: DrawRange,
    cap: Option<u64>,
) -> Vec<u64> {
    if count == 0 {
        return Vec::new();
    }
    if target < count as u64 {
        let mut items = vec![0; count];
        for i in rand::seq::index::sample(rng, count, target as usize).iter() {
            items[i] = 1;
        }
        return items;
    }
    if count == 1 {
        return vec![target];
    }

    let raw: Vec<f64> = (0..count).map(|_| range.sample(rng)).collect();
    let raw_sum: f64 = raw.iter().sum();
    let scale = target as f64 / raw_sum;

    let mut items: Vec<u64> = raw
        .iter()
        .map(|v| {
            let rounded = (v * scale).round().max(1.0) as u64;
            cap.map_or(rounded, |c| rounded.min(c))
        })
        .collect();
    settle_residual(&mut items, target, cap);
    items
}

/// Walk the items round-robin, one unit at a time, until they sum to `target`.
fn settle_residual(items: &mut [u64], target: u64, cap: Option<u64>) {
    let sum: u64 = items.iter().sum();
    let mut diff = target as i64 - sum as i64;

    while diff != 0 {
        let before = diff;
        for item in items.iter_mut() {
            if diff > 0 && cap.map_or(true, |c| *item < c) {
                *item += 1;
                diff -= 1;
            } else if diff < 0 && *item > 1 {
                *item -= 1;
                diff += 1;
            }
            if diff == 0 {
                break;
            }
        }
        // Budgets are sized so this cannot happen; bail rather than spin.
        if diff == before {
            tracing::warn!(diff, "could not settle partition residual");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn seeded(seed: u64) -> Mcg128Xsl64 {
        Mcg128Xsl64::seed_from_u64(seed)
    }

    fn is_alternating(schedule: &Schedule) -> bool {
        let phases = schedule.phases();
        phases.first().map_or(true, |p| p.kind == PhaseKind::Behavior)
            && phases
                .windows(2)
                .all(|w| !(w[0].kind == PhaseKind::Interval && w[1].kind == PhaseKind::Interval))
    }

    #[test]
    fn behavior_time_exceeding_total_is_infeasible() {
        let cfg = ScheduleConfiguration::new(5.0, 10.0, 2);
        assert!(!cfg.is_feasible());
        assert!(generate_schedule(&cfg).is_empty());
    }

    #[test]
    fn zero_count_is_infeasible() {
        let cfg = ScheduleConfiguration::new(60.0, 5.0, 0);
        assert!(generate_schedule(&cfg).is_empty());
    }

    #[test]
    fn single_repetition_skips_randomization() {
        let cfg = ScheduleConfiguration::new(20.0, 10.0, 1);
        for seed in 0..20 {
            let schedule = generate_schedule_with(&cfg, &mut seeded(seed));
            assert_eq!(schedule.behavior_count(), 1);
            assert_eq!(schedule.phases()[0], Phase::behavior(10));
            assert_eq!(schedule.interval_secs(), 10);
        }
    }

    #[test]
    fn exact_fit_has_no_interval_phases() {
        let cfg = ScheduleConfiguration::new(50.0, 10.0, 5);
        let schedule = generate_schedule_with(&cfg, &mut seeded(7));
        assert_eq!(schedule.len(), 5);
        assert!(schedule.phases().iter().all(|p| p.kind == PhaseKind::Behavior));
        assert_eq!(schedule.behavior_secs(), 50);
    }

    #[test]
    fn max_interval_caps_budget_and_each_interval() {
        // 300s total, 50s of behavior, but intervals may only use 10 * 3s.
        let cfg = ScheduleConfiguration::new(300.0, 5.0, 10).with_max_interval(3.0);
        for seed in 0..50 {
            let schedule = generate_schedule_with(&cfg, &mut seeded(seed));
            assert_eq!(schedule.interval_secs(), 30);
            assert!(schedule
                .phases()
                .iter()
                .filter(|p| p.kind == PhaseKind::Interval)
                .all(|p| p.duration_secs <= 3));
        }
    }

    #[test]
    fn tiny_interval_budget_omits_some_intervals() {
        // 2 seconds of rest spread across 5 repetitions.
        let cfg = ScheduleConfiguration::new(27.0, 5.0, 5);
        let schedule = generate_schedule_with(&cfg, &mut seeded(3));
        assert_eq!(schedule.behavior_count(), 5);
        assert_eq!(schedule.interval_secs(), 2);
        assert_eq!(schedule.len(), 7);
        assert!(is_alternating(&schedule));
    }

    #[test]
    fn sub_second_cap_is_clamped_to_one() {
        let cfg = ScheduleConfiguration::new(100.0, 5.0, 4).with_max_interval(0.5);
        let schedule = generate_schedule_with(&cfg, &mut seeded(11));
        // 4 * 0.5 = 2 seconds of rest at most, one second each.
        assert_eq!(schedule.interval_secs(), 2);
        assert!(schedule
            .phases()
            .iter()
            .filter(|p| p.kind == PhaseKind::Interval)
            .all(|p| p.duration_secs == 1));
    }

    #[test]
    fn same_seed_same_schedule() {
        let cfg = ScheduleConfiguration::new(600.0, 8.0, 12);
        let a = generate_schedule_with(&cfg, &mut seeded(42));
        let b = generate_schedule_with(&cfg, &mut seeded(42));
        assert_eq!(a, b);
    }

    #[test]
    fn fractional_average_rounds_behavior_total() {
        let cfg = ScheduleConfiguration::new(100.0, 2.5, 3);
        let schedule = generate_schedule_with(&cfg, &mut seeded(5));
        assert_eq!(schedule.behavior_secs(), 8);
        assert_eq!(schedule.behavior_count(), 3);
    }

    #[test]
    fn behavior_ordinal_counts_behaviors_up_to_index() {
        let schedule = Schedule::from_phases([
            Phase::behavior(3),
            Phase::interval(2),
            Phase::behavior(4),
            Phase::behavior(1),
        ]);
        assert_eq!(schedule.behavior_ordinal_at(0), 1);
        assert_eq!(schedule.behavior_ordinal_at(1), 1);
        assert_eq!(schedule.behavior_ordinal_at(2), 2);
        assert_eq!(schedule.behavior_ordinal_at(3), 3);
    }

    #[test]
    fn from_phases_drops_zero_length() {
        let schedule = Schedule::from_phases([Phase::behavior(3), Phase::interval(0)]);
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        assert!(ScheduleConfiguration::new(0.0, 5.0, 1).validate().is_err());
        assert!(ScheduleConfiguration::new(60.0, f64::NAN, 1).validate().is_err());
        assert!(ScheduleConfiguration::new(60.0, 5.0, 0).validate().is_err());
        assert!(ScheduleConfiguration::new(60.0, 5.0, 2)
            .with_max_interval(-1.0)
            .validate()
            .is_err());
        assert!(ScheduleConfiguration::new(60.0, 5.0, 2).validate().is_ok());
    }

    #[test]
    fn oversized_sessions_are_rejected() {
        let huge = ScheduleConfiguration::new(4e19, 2e19, 1);
        assert!(huge.validate().is_err());
        assert!(!huge.is_feasible());
        assert!(generate_schedule_with(&huge, &mut seeded(1)).is_empty());

        let limit = MAX_SESSION_SECS as f64;
        assert!(ScheduleConfiguration::new(limit + 1.0, 1.0, 1).validate().is_err());
        assert!(!ScheduleConfiguration::new(limit + 1.0, 1.0, 1).is_feasible());

        let at_limit = ScheduleConfiguration::new(limit, limit, 1);
        assert!(at_limit.validate().is_ok());
        let schedule = generate_schedule_with(&at_limit, &mut seeded(1));
        assert_eq!(schedule.total_duration_secs(), MAX_SESSION_SECS);
    }

    #[test]
    fn too_many_repetitions_are_rejected() {
        let config = ScheduleConfiguration::new(1e9, 1.0, u32::MAX);
        assert!(config.validate().is_err());
        assert!(!config.is_feasible());
        assert!(generate_schedule_with(&config, &mut seeded(1)).is_empty());

        let at_limit = ScheduleConfiguration::new(f64::from(MAX_COUNT) * 2.0, 1.0, MAX_COUNT);
        assert!(at_limit.validate().is_ok());
        assert!(at_limit.is_feasible());
    }

    #[test]
    fn hand_built_totals_saturate() {
        let schedule = Schedule::from_phases([Phase::behavior(u64::MAX), Phase::interval(u64::MAX)]);
        assert_eq!(schedule.total_duration_secs(), u64::MAX);
        assert_eq!(schedule.behavior_secs(), u64::MAX);
    }

    fn max_interval_strategy() -> impl Strategy<Value = f64> {
        prop_oneof![Just(0.0), 0.5f64..30.0]
    }

    proptest! {
        #[test]
        fn generated_schedules_respect_budgets(
            total in 1.0f64..2000.0,
            avg in 0.5f64..60.0,
            count in 1u32..40,
            max_interval in max_interval_strategy(),
            seed in any::<u64>(),
        ) {
            let cfg = ScheduleConfiguration::new(total, avg, count).with_max_interval(max_interval);
            let schedule = generate_schedule_with(&cfg, &mut seeded(seed));

            if !cfg.is_feasible() {
                prop_assert!(schedule.is_empty());
                return Ok(());
            }

            prop_assert_eq!(schedule.behavior_count(), count as usize);
            prop_assert_eq!(schedule.behavior_secs(), (avg * f64::from(count)).round() as u64);
            prop_assert!(schedule.phases().iter().all(|p| p.duration_secs >= 1));
            prop_assert!(is_alternating(&schedule));

            let mut interval_budget = total - avg * f64::from(count);
            if max_interval > 0.0 {
                interval_budget = interval_budget.min(max_interval * f64::from(count));
                let cap = (max_interval.floor() as u64).max(1);
                prop_assert!(schedule
                    .phases()
                    .iter()
                    .filter(|p| p.kind == PhaseKind::Interval)
                    .all(|p| p.duration_secs <= cap));
            }
            prop_assert!(schedule.interval_secs() as f64 <= interval_budget);
        }
    }
}
