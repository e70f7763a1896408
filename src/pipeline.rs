//! Pipeline orchestration
//!
//! This module provides the public API for Peak Planner.
//! It validates a planning request and runs it through every stage, from
//! classifier output to the normalized plan.

use crate::bucketizer::LevelBuckets;
use crate::classifier::{ActivityClassifier, ClassifierError};
use crate::config::{PlannerConfig, DEFAULT_MAX_PLAN_DAYS};
use crate::error::PlanError;
use crate::guide::GuideBook;
use crate::normalizer::PerformanceNormalizer;
use crate::simulator::PeriodizationSimulator;
use crate::types::{Activity, PerformanceLevel, Plan};
use chrono::{DateTime, NaiveDate, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Goal title used when the request leaves it blank
pub const DEFAULT_GOAL: &str = "training goal";

/// Validated inclusive date window
///
/// Deserialization goes through the same checks as `PlanWindow::new`, using
/// the default maximum span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct PlanWindow {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawWindow> for PlanWindow {
    type Error = PlanError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        PlanWindow::new(raw.start, raw.end, DEFAULT_MAX_PLAN_DAYS)
    }
}

impl PlanWindow {
    /// Validate a window: start must precede end and the inclusive span must
    /// not exceed `max_days`.
    pub fn new(start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<Self, PlanError> {
        if start >= end {
            return Err(PlanError::InvalidWindow { start, end });
        }
        let days = (end - start).num_days() + 1;
        if days > max_days {
            return Err(PlanError::WindowTooLong {
                days,
                max_days,
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive number of days
    pub fn total_days(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    /// Every date from start to end, inclusive
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take(self.total_days()).collect()
    }
}

/// Caller input for one plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Goal title, forwarded to the classifier only
    #[serde(default)]
    pub goal: String,
    pub description: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PlanRequest {
    pub fn new(
        goal: impl Into<String>,
        description: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            goal: goal.into(),
            description: description.into(),
            start,
            end,
        }
    }

    /// Goal with blank values replaced by the default title
    pub fn goal_or_default(&self) -> &str {
        let goal = self.goal.trim();
        if goal.is_empty() {
            DEFAULT_GOAL
        } else {
            goal
        }
    }

    /// Check the description and date window
    pub fn validate(&self, max_days: i64) -> Result<PlanWindow, PlanError> {
        if self.description.trim().is_empty() {
            return Err(PlanError::MissingDescription);
        }
        PlanWindow::new(self.start, self.end, max_days)
    }
}

/// How the activity pool was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassificationStatus {
    /// The classifier supplied usable activities
    Classified { activities: usize },
    /// Placeholder buckets were used instead
    Degraded { reason: String },
}

impl ClassificationStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ClassificationStatus::Degraded { .. })
    }
}

/// Everything produced by one planning call
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub plan: Plan,
    /// Wall-clock time of the call; kept outside `Plan` so plans replay exactly
    pub generated_at: DateTime<Utc>,
    pub performance: Vec<PerformanceLevel>,
    pub classification: ClassificationStatus,
    pub buckets: LevelBuckets,
}

/// Stateless planner: every call owns its own model state and RNGs
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
    simulator: PeriodizationSimulator,
    seed: Option<u64>,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        let simulator = PeriodizationSimulator::new(config.simulator.clone());
        Self {
            config,
            simulator,
            seed: None,
        }
    }

    /// Fix the seed so repeated calls produce identical days
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the guide table
    pub fn with_guides(mut self, guides: GuideBook) -> Self {
        self.simulator = self.simulator.with_guides(guides);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Build a plan from an already-obtained classification result.
    ///
    /// Classification failures never fail the plan; they are reported through
    /// `PlanOutcome::classification`.
    pub fn plan(
        &self,
        request: &PlanRequest,
        classification: Result<Vec<Activity>, ClassifierError>,
    ) -> Result<PlanOutcome, PlanError> {
        let window = request.validate(self.config.max_plan_days)?;
        Ok(self.plan_validated(request, &window, classification))
    }

    /// Validate, classify, then plan
    pub async fn plan_with<C: ActivityClassifier>(
        &self,
        request: &PlanRequest,
        classifier: &C,
    ) -> Result<PlanOutcome, PlanError> {
        let window = request.validate(self.config.max_plan_days)?;
        let classification = classifier
            .classify(request.description.trim(), request.goal_or_default())
            .await;
        Ok(self.plan_validated(request, &window, classification))
    }

    fn plan_validated(
        &self,
        request: &PlanRequest,
        window: &PlanWindow,
        classification: Result<Vec<Activity>, ClassifierError>,
    ) -> PlanOutcome {
        let (buckets, status) = bucket_classification(classification);
        let seed = self.seed.unwrap_or_else(rand::random);

        let plan = simulate_plan(
            &self.simulator,
            window,
            &buckets,
            request.goal_or_default(),
            seed,
        );
        let performance = PerformanceNormalizer::normalize(&plan.days);

        info!(
            plan_id = %plan.plan_id,
            days = plan.len(),
            seed,
            degraded = status.is_degraded(),
            "generated training plan"
        );

        PlanOutcome {
            plan,
            generated_at: Utc::now(),
            performance,
            classification: status,
            buckets,
        }
    }
}

/// Generate a plan with the default simulator for callers that already hold
/// their buckets
pub fn generate_plan(window: &PlanWindow, buckets: &LevelBuckets, seed: u64) -> Plan {
    simulate_plan(
        &PeriodizationSimulator::default(),
        window,
        buckets,
        DEFAULT_GOAL,
        seed,
    )
}

fn bucket_classification(
    classification: Result<Vec<Activity>, ClassifierError>,
) -> (LevelBuckets, ClassificationStatus) {
    match classification {
        Ok(activities) if activities.is_empty() => {
            warn!("classifier returned no activities, using placeholder workouts");
            (
                LevelBuckets::defaults(),
                ClassificationStatus::Degraded {
                    reason: "classifier returned no activities".to_string(),
                },
            )
        }
        Ok(activities) => {
            let buckets = LevelBuckets::from_activities(&activities);
            if buckets.is_all_synthetic() {
                warn!("no activity had a valid intensity level, using placeholder workouts");
                let status = ClassificationStatus::Degraded {
                    reason: "no activity had a valid intensity level".to_string(),
                };
                (buckets, status)
            } else {
                let status = ClassificationStatus::Classified {
                    activities: activities.len(),
                };
                (buckets, status)
            }
        }
        Err(e) => {
            warn!(error = %e, "classification failed, using placeholder workouts");
            (
                LevelBuckets::defaults(),
                ClassificationStatus::Degraded {
                    reason: e.to_string(),
                },
            )
        }
    }
}

fn simulate_plan(
    simulator: &PeriodizationSimulator,
    window: &PlanWindow,
    buckets: &LevelBuckets,
    goal: &str,
    seed: u64,
) -> Plan {
    let mut structural = ChaCha8Rng::seed_from_u64(seed);
    let mut cosmetic = ChaCha8Rng::seed_from_u64(seed);
    cosmetic.set_stream(1);

    let days = simulator.simulate(&window.dates(), buckets, &mut structural, &mut cosmetic);

    Plan {
        plan_id: plan_id_for(seed),
        seed,
        goal: goal.to_string(),
        days,
    }
}

fn plan_id_for(seed: u64) -> Uuid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(2);
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::StaticClassifier;
    use crate::types::{IntensityLevel, Phase};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn request(start: NaiveDate, end: NaiveDate) -> PlanRequest {
        PlanRequest::new(
            "Spring half marathon",
            "Four runs a week: intervals, tempo runs, recovery jogs",
            start,
            end,
        )
    }

    fn activities() -> Vec<Activity> {
        vec![
            Activity::new("interval run", 6),
            Activity::new("tempo run", 5),
            Activity::new("long run", 4),
            Activity::new("recovery jog", 2),
            Activity::new("sleep", 1),
        ]
    }

    #[test]
    fn test_window_validation() {
        assert!(matches!(
            PlanWindow::new(date(5, 1), date(5, 1), 21),
            Err(PlanError::InvalidWindow { .. })
        ));
        assert!(matches!(
            PlanWindow::new(date(5, 10), date(5, 1), 21),
            Err(PlanError::InvalidWindow { .. })
        ));
        assert!(matches!(
            PlanWindow::new(date(5, 1), date(5, 22), 21),
            Err(PlanError::WindowTooLong { days: 22, max_days: 21 })
        ));

        let window = PlanWindow::new(date(5, 1), date(5, 21), 21).unwrap();
        assert_eq!(window.total_days(), 21);
        let dates = window.dates();
        assert_eq!(dates.len(), 21);
        assert_eq!(dates[0], date(5, 1));
        assert_eq!(dates[20], date(5, 21));
    }

    #[test]
    fn test_window_deserialize_validates() {
        let window: PlanWindow =
            serde_json::from_str(r#"{"start":"2025-05-01","end":"2025-05-10"}"#).unwrap();
        assert_eq!(window.total_days(), 10);

        assert!(serde_json::from_str::<PlanWindow>(
            r#"{"start":"2025-05-10","end":"2025-05-01"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<PlanWindow>(
            r#"{"start":"2025-01-01","end":"2025-12-31"}"#
        )
        .is_err());
    }

    #[test]
    fn test_window_across_month_end() {
        let window = PlanWindow::new(date(1, 25), date(2, 7), 21).unwrap();
        assert_eq!(window.total_days(), 14);
        assert_eq!(window.dates().last(), Some(&date(2, 7)));
    }

    #[test]
    fn test_missing_description_rejected() {
        let planner = Planner::default();
        let mut req = request(date(6, 1), date(6, 14));
        req.description = "   ".to_string();
        assert!(matches!(
            planner.plan(&req, Ok(activities())),
            Err(PlanError::MissingDescription)
        ));
    }

    #[test]
    fn test_plan_from_activities() {
        let planner = Planner::default().with_seed(17);
        let outcome = planner
            .plan(&request(date(6, 1), date(6, 21)), Ok(activities()))
            .unwrap();

        assert_eq!(
            outcome.classification,
            ClassificationStatus::Classified { activities: 5 }
        );
        assert_eq!(outcome.plan.len(), 21);
        assert_eq!(outcome.performance.len(), 21);
        assert_eq!(outcome.plan.seed, 17);
        assert_eq!(outcome.plan.goal, "Spring half marathon");

        let last = outcome.plan.days.last().unwrap();
        assert_eq!(last.intensity_level, IntensityLevel::COMPLETE_REST);
        assert_eq!(last.workout_name, "sleep");
        assert_eq!(last.phase, Phase::Taper);
    }

    #[test]
    fn test_classifier_failure_degrades() {
        let planner = Planner::default().with_seed(3);
        let outcome = planner
            .plan(
                &request(date(6, 1), date(6, 14)),
                Err(ClassifierError::Request("connection reset".to_string())),
            )
            .unwrap();

        assert!(outcome.classification.is_degraded());
        assert!(outcome.buckets.is_all_synthetic());
        assert_eq!(outcome.plan.len(), 14);
        for day in &outcome.plan.days {
            assert_eq!(day.workout_name, day.intensity_level.display_name());
        }
    }

    #[test]
    fn test_empty_classification_degrades() {
        let planner = Planner::default().with_seed(3);
        let outcome = planner
            .plan(&request(date(6, 1), date(6, 14)), Ok(Vec::new()))
            .unwrap();
        assert_eq!(
            outcome.classification,
            ClassificationStatus::Degraded {
                reason: "classifier returned no activities".to_string()
            }
        );
    }

    #[test]
    fn test_all_invalid_levels_degrade() {
        let planner = Planner::default().with_seed(3);
        let outcome = planner
            .plan(
                &request(date(6, 1), date(6, 14)),
                Ok(vec![Activity::new("bogus", 11)]),
            )
            .unwrap();
        assert!(outcome.classification.is_degraded());
        assert_eq!(outcome.plan.len(), 14);
    }

    #[test]
    fn test_fixed_seed_reproduces_plan() {
        let planner = Planner::default().with_seed(99);
        let req = request(date(7, 1), date(7, 15));

        let a = planner.plan(&req, Ok(activities())).unwrap();
        let b = planner.plan(&req, Ok(activities())).unwrap();

        assert_eq!(a.plan, b.plan);
        assert_eq!(a.performance, b.performance);
        assert_eq!(
            serde_json::to_string(&a.plan).unwrap(),
            serde_json::to_string(&b.plan).unwrap()
        );

        let other = Planner::default()
            .with_seed(100)
            .plan(&req, Ok(activities()))
            .unwrap();
        assert_ne!(a.plan.plan_id, other.plan.plan_id);
    }

    #[test]
    fn test_generate_plan_matches_planner() {
        let window = PlanWindow::new(date(7, 1), date(7, 15), 21).unwrap();
        let buckets = LevelBuckets::from_activities(&activities());

        let direct = generate_plan(&window, &buckets, 5);
        let outcome = Planner::default()
            .with_seed(5)
            .plan(&request(date(7, 1), date(7, 15)), Ok(activities()))
            .unwrap();

        assert_eq!(direct.days, outcome.plan.days);
        assert_eq!(direct.goal, DEFAULT_GOAL);
    }

    #[test]
    fn test_blank_goal_uses_default() {
        let mut req = request(date(6, 1), date(6, 14));
        req.goal = "  ".to_string();
        assert_eq!(req.goal_or_default(), DEFAULT_GOAL);
    }

    #[test]
    fn test_configured_max_span() {
        let config = PlannerConfig {
            max_plan_days: 30,
            ..Default::default()
        };
        let planner = Planner::new(config).with_seed(1);
        let outcome = planner
            .plan(&request(date(8, 1), date(8, 30)), Ok(activities()))
            .unwrap();
        assert_eq!(outcome.plan.len(), 30);

        let counts = outcome.plan.phase_counts();
        assert_eq!(counts.get(&Phase::Taper), Some(&10));
        assert_eq!(counts.get(&Phase::Preparation), Some(&18));
        assert_eq!(counts.get(&Phase::Competition), Some(&2));
    }

    #[tokio::test]
    async fn test_plan_with_static_classifier() {
        let classifier = StaticClassifier::new(activities());
        let outcome = Planner::default()
            .with_seed(8)
            .plan_with(&request(date(6, 1), date(6, 12)), &classifier)
            .await
            .unwrap();

        assert_eq!(outcome.plan.len(), 12);
        assert!(!outcome.classification.is_degraded());
    }

    struct CountingClassifier {
        calls: Cell<usize>,
    }

    impl ActivityClassifier for CountingClassifier {
        async fn classify(
            &self,
            _description: &str,
            _goal: &str,
        ) -> Result<Vec<Activity>, ClassifierError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_invalid_window_skips_classifier() {
        let classifier = CountingClassifier { calls: Cell::new(0) };
        let result = Planner::default()
            .plan_with(&request(date(6, 14), date(6, 1)), &classifier)
            .await;

        assert!(matches!(result, Err(PlanError::InvalidWindow { .. })));
        assert_eq!(classifier.calls.get(), 0);
    }
}
