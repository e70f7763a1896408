//! Peak Planner - Periodized training calendar generator
//!
//! Peak Planner turns an intensity-tagged activity pool into a day-by-day
//! training plan through a forward pipeline: classifier output → intensity
//! bucketing → periodization simulation → performance normalization.
//!
//! ## Modules
//!
//! - **Classifier**: Extract intensity-tagged activities from free text (Gemini)
//! - **Simulator**: Fitness/fatigue model driving phase- and streak-aware day selection
//! - **Normalizer**: Display-scale performance over a finished plan

pub mod bucketizer;
pub mod classifier;
pub mod config;
pub mod error;
pub mod guide;
pub mod load;
pub mod normalizer;
pub mod pipeline;
pub mod simulator;
pub mod types;

pub use bucketizer::LevelBuckets;
pub use classifier::{ActivityClassifier, ClassifierError, GeminiClient, StaticClassifier};
pub use config::PlannerConfig;
pub use error::PlanError;
pub use guide::GuideBook;
pub use normalizer::PerformanceNormalizer;
pub use pipeline::{
    generate_plan, ClassificationStatus, PlanOutcome, PlanRequest, PlanWindow, Planner,
};
pub use simulator::{PeriodizationSimulator, SimulatorConfig, TAPER_DAYS};
pub use types::{Activity, DayPlanEntry, IntensityLevel, PerformanceLevel, Phase, Plan};

/// Planner version embedded in CLI output
pub const PLANNER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "peak-planner";
