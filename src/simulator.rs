//! Periodization simulator
//!
//! Walks a date window day by day and decides each day's phase, intensity level
//! and workout, while a two-variable fitness/fatigue model tracks the athlete's
//! forecast performance.
//!
//! Per-day stages:
//! 1. Phase selection (taper window is always the final `TAPER_DAYS` days)
//! 2. Level selection (fixed taper overrides, or streak-aware block rules)
//! 3. Fitness/fatigue decay followed by the day's load
//! 4. Workout naming and guide lookup
//!
//! Structural choices (threshold and level draws) use one RNG, cosmetic
//! choices (workout name and guide tip) use another, so callers can pin the
//! shape of a plan independently of its wording.

use crate::bucketizer::LevelBuckets;
use crate::guide::GuideBook;
use crate::load::level_load;
use crate::types::{DayPlanEntry, IntensityLevel, Phase};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Hard-day candidates in preparation, weighted by repetition
const PREPARATION_LEVELS: [u8; 4] = [4, 4, 5, 3];
/// Hard-day candidates in competition
const COMPETITION_LEVELS: [u8; 3] = [6, 5, 4];
/// Lighter-day candidates once the streak hits its threshold
const LIGHT_LEVELS: [u8; 3] = [2, 2, 3];
/// Taper days without a fixed override
const TAPER_FILL_LEVELS: [u8; 2] = [2, 3];
/// Streak thresholds, drawn fresh every non-taper day
const STREAK_THRESHOLDS: [u32; 2] = [2, 3];

/// Optional bounds applied to the stored performance value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceClamp {
    pub min: f64,
    pub max: f64,
}

impl PerformanceClamp {
    /// Bounds used by the earlier clamped model variant
    pub const LEGACY: Self = Self {
        min: 50.0,
        max: 150.0,
    };
}

/// Length of the final taper window in days
///
/// The taper overrides key off remaining days 1 through 5, so the window is
/// not configurable.
pub const TAPER_DAYS: usize = 10;

/// Tunable constants of the fitness/fatigue model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    pub initial_fitness: f64,
    pub initial_fatigue: f64,
    /// Multiplier applied to fitness every day before the load
    pub fitness_decay: f64,
    /// Multiplier applied to fatigue every day before the load
    pub fatigue_decay: f64,
    /// Fraction of stress × adaptation factor that becomes fitness
    pub adaptation_scale: f64,
    /// Share of the plan (by day index) spent in preparation
    pub preparation_fraction: f64,
    /// Stress multiplier for taper days above light recovery
    pub taper_volume_factor: f64,
    /// None keeps performance unclamped
    pub performance_clamp: Option<PerformanceClamp>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_fitness: 50.0,
            initial_fatigue: 50.0,
            fitness_decay: 0.98,
            fatigue_decay: 0.4,
            adaptation_scale: 0.1,
            preparation_fraction: 0.6,
            taper_volume_factor: 0.6,
            performance_clamp: None,
        }
    }
}

/// Phase for day `index` of a `total_days` plan
///
/// An index past the end counts as the last day.
pub fn phase_for(index: usize, total_days: usize, config: &SimulatorConfig) -> Phase {
    let remaining_days = total_days.saturating_sub(index);
    if remaining_days <= TAPER_DAYS {
        Phase::Taper
    } else if (index as f64 / total_days as f64) < config.preparation_fraction {
        Phase::Preparation
    } else {
        Phase::Competition
    }
}

/// Result of applying one day's load to the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayLoad {
    pub training_stress: f64,
    pub fitness: f64,
    pub fatigue: f64,
    pub performance: f64,
}

/// Mutable model state for one simulation run
#[derive(Debug, Clone)]
pub struct SimulatorState {
    fitness: f64,
    fatigue: f64,
    consecutive_training_days: u32,
}

impl SimulatorState {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            fitness: config.initial_fitness,
            fatigue: config.initial_fatigue,
            consecutive_training_days: 0,
        }
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn fatigue(&self) -> f64 {
        self.fatigue
    }

    pub fn consecutive_training_days(&self) -> u32 {
        self.consecutive_training_days
    }

    /// Decide the day's level and advance the training streak
    pub fn choose_level<R: Rng + ?Sized>(
        &mut self,
        phase: Phase,
        remaining_days: usize,
        rng: &mut R,
    ) -> IntensityLevel {
        let level = match phase {
            Phase::Taper => {
                self.consecutive_training_days = 0;
                match remaining_days {
                    1 => 1,
                    2 | 4 => 2,
                    3 => 3,
                    5 => 6,
                    _ => pick(rng, &TAPER_FILL_LEVELS),
                }
            }
            Phase::Preparation | Phase::Competition => {
                let threshold = STREAK_THRESHOLDS[rng.gen_range(0..STREAK_THRESHOLDS.len())];
                if self.consecutive_training_days < threshold {
                    self.consecutive_training_days += 1;
                    if phase == Phase::Preparation {
                        pick(rng, &PREPARATION_LEVELS)
                    } else {
                        pick(rng, &COMPETITION_LEVELS)
                    }
                } else {
                    self.consecutive_training_days = 0;
                    pick(rng, &LIGHT_LEVELS)
                }
            }
        };

        IntensityLevel::new(level as i64).unwrap_or(IntensityLevel::LIGHT_RECOVERY)
    }

    /// Decay fitness and fatigue, then add the day's load
    pub fn apply_load(
        &mut self,
        phase: Phase,
        level: IntensityLevel,
        config: &SimulatorConfig,
    ) -> DayLoad {
        self.fitness *= config.fitness_decay;
        self.fatigue *= config.fatigue_decay;

        let load = level_load(level);
        let mut training_stress = load.training_stress;
        if phase == Phase::Taper && level > IntensityLevel::LIGHT_RECOVERY {
            training_stress *= config.taper_volume_factor;
        }

        self.fatigue += training_stress;
        self.fitness += training_stress * load.adaptation_factor * config.adaptation_scale;

        let mut performance = self.fitness - self.fatigue;
        if let Some(clamp) = config.performance_clamp {
            performance = performance.clamp(clamp.min, clamp.max);
        }

        DayLoad {
            training_stress,
            fitness: self.fitness,
            fatigue: self.fatigue,
            performance,
        }
    }
}

/// Day-by-day plan generator
#[derive(Debug, Clone, Default)]
pub struct PeriodizationSimulator {
    config: SimulatorConfig,
    guides: GuideBook,
}

impl PeriodizationSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            guides: GuideBook::default(),
        }
    }

    /// Replace the guide table used for tips
    pub fn with_guides(mut self, guides: GuideBook) -> Self {
        self.guides = guides;
        self
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Generate one entry per date.
    ///
    /// `dates` must be consecutive and ascending; its length is the plan
    /// length. Never fails.
    pub fn simulate<S, C>(
        &self,
        dates: &[NaiveDate],
        buckets: &LevelBuckets,
        structural_rng: &mut S,
        cosmetic_rng: &mut C,
    ) -> Vec<DayPlanEntry>
    where
        S: Rng + ?Sized,
        C: Rng + ?Sized,
    {
        let total_days = dates.len();
        let mut state = SimulatorState::new(&self.config);
        let mut days = Vec::with_capacity(total_days);

        for (i, date) in dates.iter().enumerate() {
            let remaining_days = total_days - i;
            let phase = phase_for(i, total_days, &self.config);
            let level = state.choose_level(phase, remaining_days, structural_rng);
            let load = state.apply_load(phase, level, &self.config);

            let workout_name = buckets
                .names(level)
                .choose(cosmetic_rng)
                .cloned()
                .unwrap_or_else(|| level.display_name().to_string());
            let guide = self.guides.tip_for(&workout_name, cosmetic_rng);

            days.push(DayPlanEntry {
                date: *date,
                weekday: date.format("%a").to_string(),
                phase,
                workout_name,
                intensity_level: level,
                training_stress: load.training_stress,
                performance: round1(load.performance),
                fitness: round1(load.fitness),
                fatigue: round1(load.fatigue),
                guide,
            });
        }

        days
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[u8]) -> u8 {
    options[rng.gen_range(0..options.len())]
}

/// Round half away from zero to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Activity;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dates(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
        start.iter_days().take(n).collect()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn labelled_buckets() -> LevelBuckets {
        let activities: Vec<Activity> = (1..=7)
            .map(|n| Activity::new(format!("L{}", n), n))
            .collect();
        LevelBuckets::from_activities(&activities)
    }

    fn run(n: usize, seed: u64) -> Vec<DayPlanEntry> {
        let simulator = PeriodizationSimulator::default();
        let mut structural = ChaCha8Rng::seed_from_u64(seed);
        let mut cosmetic = ChaCha8Rng::seed_from_u64(seed);
        cosmetic.set_stream(1);
        simulator.simulate(&dates(start(), n), &labelled_buckets(), &mut structural, &mut cosmetic)
    }

    #[test]
    fn test_coverage_one_entry_per_date() {
        for n in [1, 2, 5, 10, 11, 15, 21, 40] {
            let plan = run(n, 42);
            assert_eq!(plan.len(), n);
            assert_eq!(plan[0].date, start());
            for pair in plan.windows(2) {
                assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
            }
        }
    }

    #[test]
    fn test_taper_determinism_across_seeds() {
        for seed in 0..50 {
            let plan = run(21, seed);
            let n = plan.len();
            // remaining_days == 1, 2, 3, 4, 5
            assert_eq!(plan[n - 1].intensity_level, IntensityLevel::COMPLETE_REST);
            assert_eq!(plan[n - 2].intensity_level, IntensityLevel::LIGHT_RECOVERY);
            assert_eq!(plan[n - 3].intensity_level, IntensityLevel::TECHNIQUE);
            assert_eq!(plan[n - 4].intensity_level, IntensityLevel::LIGHT_RECOVERY);
            assert_eq!(plan[n - 5].intensity_level, IntensityLevel::HIGH_INTENSITY);

            for day in &plan[n - 10..n - 5] {
                assert_eq!(day.phase, Phase::Taper);
                let level = day.intensity_level.value();
                assert!(level == 2 || level == 3);
            }
        }
    }

    #[test]
    fn test_taper_boundary_is_inclusive() {
        let config = SimulatorConfig::default();
        // remaining_days = 11 on day 0, 10 on day 1
        assert_eq!(phase_for(0, 11, &config), Phase::Preparation);
        assert_eq!(phase_for(1, 11, &config), Phase::Taper);

        let plan = run(11, 9);
        assert_ne!(plan[0].phase, Phase::Taper);
        assert!(plan[1..].iter().all(|d| d.phase == Phase::Taper));
        // Day 0 follows block rules: streak starts at 0, so it is a hard day
        assert!(PREPARATION_LEVELS.contains(&plan[0].intensity_level.value()));
    }

    #[test]
    fn test_short_plans_are_all_taper() {
        let plan = run(7, 3);
        assert!(plan.iter().all(|d| d.phase == Phase::Taper));
        // remaining 7 and 6 are free taper picks, 5 is the primer
        assert_eq!(plan[2].intensity_level, IntensityLevel::HIGH_INTENSITY);
    }

    #[test]
    fn test_phase_split() {
        let config = SimulatorConfig::default();
        // 30 days: taper from index 20, preparation while i/30 < 0.6 (i < 18)
        assert_eq!(phase_for(17, 30, &config), Phase::Preparation);
        assert_eq!(phase_for(18, 30, &config), Phase::Competition);
        assert_eq!(phase_for(19, 30, &config), Phase::Competition);
        assert_eq!(phase_for(20, 30, &config), Phase::Taper);
    }

    #[test]
    fn test_phase_for_index_past_end() {
        let config = SimulatorConfig::default();
        assert_eq!(phase_for(30, 30, &config), Phase::Taper);
        assert_eq!(phase_for(45, 30, &config), Phase::Taper);
    }

    #[test]
    fn test_streak_never_exceeds_three() {
        let config = SimulatorConfig::default();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut state = SimulatorState::new(&config);
            for day in 0..200 {
                let phase = if day % 2 == 0 {
                    Phase::Preparation
                } else {
                    Phase::Competition
                };
                let before = state.consecutive_training_days();
                let level = state.choose_level(phase, 100, &mut rng);
                let after = state.consecutive_training_days();

                assert!(after <= 3);
                if after == 0 {
                    assert!(before >= 2);
                    assert!(LIGHT_LEVELS.contains(&level.value()));
                } else {
                    assert_eq!(after, before + 1);
                }
            }
        }
    }

    #[test]
    fn test_taper_resets_streak() {
        let config = SimulatorConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut state = SimulatorState::new(&config);
        state.choose_level(Phase::Competition, 20, &mut rng);
        assert_eq!(state.consecutive_training_days(), 1);

        state.choose_level(Phase::Taper, 8, &mut rng);
        assert_eq!(state.consecutive_training_days(), 0);
    }

    #[test]
    fn test_model_update_formula() {
        let config = SimulatorConfig::default();
        let mut state = SimulatorState::new(&config);

        // Level 4 outside taper: fatigue 50*0.4 + 18, fitness 50*0.98 + 18*1.0*0.1
        let load = state.apply_load(Phase::Preparation, IntensityLevel::ENDURANCE, &config);
        assert!((load.fatigue - 38.0).abs() < 1e-9);
        assert!((load.fitness - 50.8).abs() < 1e-9);
        assert!((load.performance - 12.8).abs() < 1e-9);
        assert_eq!(load.training_stress, 18.0);
    }

    #[test]
    fn test_taper_primer_volume_cut() {
        let config = SimulatorConfig::default();
        let mut state = SimulatorState::new(&config);
        let load = state.apply_load(Phase::Taper, IntensityLevel::HIGH_INTENSITY, &config);
        assert!((load.training_stress - 21.0).abs() < 1e-9);

        // Light recovery is not cut
        let load = state.apply_load(Phase::Taper, IntensityLevel::LIGHT_RECOVERY, &config);
        assert_eq!(load.training_stress, 5.0);
    }

    #[test]
    fn test_performance_is_fitness_minus_fatigue() {
        let plan = run(21, 5);
        for day in &plan {
            assert!((day.performance - (day.fitness - day.fatigue)).abs() <= 0.11);
            assert_eq!(day.performance, round1(day.performance));
        }
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let first = run(15, 2024);
        let second = run(15, 2024);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        for day in &first {
            assert_eq!(day.workout_name, format!("L{}", day.intensity_level));
        }
    }

    #[test]
    fn test_cosmetic_rng_does_not_change_structure() {
        let simulator = PeriodizationSimulator::default();
        let buckets = LevelBuckets::from_activities(&[
            Activity::new("hill repeats", 6),
            Activity::new("track intervals", 6),
            Activity::new("fartlek", 6),
        ]);
        let window = dates(start(), 21);

        let mut a = ChaCha8Rng::seed_from_u64(1);
        let plan_a = simulator.simulate(&window, &buckets, &mut a, &mut ChaCha8Rng::seed_from_u64(100));
        let mut b = ChaCha8Rng::seed_from_u64(1);
        let plan_b = simulator.simulate(&window, &buckets, &mut b, &mut ChaCha8Rng::seed_from_u64(200));

        let levels_a: Vec<_> = plan_a.iter().map(|d| d.intensity_level).collect();
        let levels_b: Vec<_> = plan_b.iter().map(|d| d.intensity_level).collect();
        assert_eq!(levels_a, levels_b);
        let perf_a: Vec<_> = plan_a.iter().map(|d| d.performance).collect();
        let perf_b: Vec<_> = plan_b.iter().map(|d| d.performance).collect();
        assert_eq!(perf_a, perf_b);
    }

    #[test]
    fn test_placeholder_buckets_still_produce_full_plan() {
        let simulator = PeriodizationSimulator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut cosmetic = ChaCha8Rng::seed_from_u64(9);
        let plan = simulator.simulate(&dates(start(), 14), &LevelBuckets::defaults(), &mut rng, &mut cosmetic);

        assert_eq!(plan.len(), 14);
        for day in &plan {
            assert_eq!(day.workout_name, day.intensity_level.display_name());
            assert!(!day.guide.is_empty());
        }
        assert_eq!(plan[13].workout_name, "complete rest");
    }

    #[test]
    fn test_legacy_clamp_bounds_performance() {
        let config = SimulatorConfig {
            performance_clamp: Some(PerformanceClamp::LEGACY),
            ..Default::default()
        };
        let simulator = PeriodizationSimulator::new(config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut cosmetic = ChaCha8Rng::seed_from_u64(4);
        let plan = simulator.simulate(&dates(start(), 21), &labelled_buckets(), &mut rng, &mut cosmetic);

        assert!(plan.iter().all(|d| (50.0..=150.0).contains(&d.performance)));
    }

    #[test]
    fn test_weekday_abbreviation() {
        let plan = run(2, 1);
        // 2025-04-01 is a Tuesday
        assert_eq!(plan[0].weekday, "Tue");
        assert_eq!(plan[1].weekday, "Wed");
    }
}
