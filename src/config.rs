//! Planner configuration
//!
//! All fields have defaults, so an empty JSON object is a valid config file.
//! Secrets (the classifier API key) come from the environment only.

use crate::classifier::DEFAULT_MODEL;
use crate::error::PlanError;
use crate::simulator::SimulatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest window a plan may cover, in days
pub const DEFAULT_MAX_PLAN_DAYS: i64 = 21;

/// Top-level planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub simulator: SimulatorConfig,
    /// Maximum inclusive plan length in days
    pub max_plan_days: i64,
    /// Classifier model name
    pub model: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            max_plan_days: DEFAULT_MAX_PLAN_DAYS,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl PlannerConfig {
    /// Load config from JSON
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| PlanError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Serialize config to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values the simulator cannot work with
    pub fn validate(&self) -> Result<(), PlanError> {
        let sim = &self.simulator;
        if self.max_plan_days < 2 {
            return Err(PlanError::Config("max_plan_days must be at least 2".to_string()));
        }
        if !(0.0..=1.0).contains(&sim.preparation_fraction) {
            return Err(PlanError::Config(
                "preparation_fraction must be within 0..=1".to_string(),
            ));
        }
        for (name, value) in [
            ("fitness_decay", sim.fitness_decay),
            ("fatigue_decay", sim.fatigue_decay),
            ("taper_volume_factor", sim.taper_volume_factor),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PlanError::Config(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }
        if let Some(clamp) = sim.performance_clamp {
            if clamp.min > clamp.max {
                return Err(PlanError::Config(
                    "performance_clamp.min must not exceed max".to_string(),
                ));
            }
        }
        Ok(())
    }
}
