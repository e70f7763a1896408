//! Training classifiers
//!
//! This module turns a free-text training description and goal into a list of
//! intensity-tagged activities. The simulator never calls a classifier
//! directly; it only consumes the resulting activity list.

mod extract;
mod gemini;

pub use extract::{extract_json, level_from_tag, parse_activities};
pub use gemini::{GeminiClient, API_KEY_ENV, DEFAULT_MODEL};

use crate::types::Activity;
use serde::Serialize;
use thiserror::Error;

/// Errors from the upstream classification step
///
/// None of these abort plan generation; the planner degrades to placeholder
/// buckets and reports the reason.
#[derive(Error, Debug, Clone, Serialize)]
pub enum ClassifierError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Trait for services that extract activities from a training description
#[allow(async_fn_in_trait)]
pub trait ActivityClassifier {
    /// Extract intensity-tagged activities for the description and goal
    async fn classify(
        &self,
        description: &str,
        goal: &str,
    ) -> Result<Vec<Activity>, ClassifierError>;
}

/// Classifier that returns a fixed activity list
///
/// Used for offline runs (activities loaded from a file) and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticClassifier {
    activities: Vec<Activity>,
}

impl StaticClassifier {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    /// Parse a classifier-style response (object, array, or fenced JSON)
    pub fn from_response(text: &str) -> Result<Self, ClassifierError> {
        let json = extract_json(text)?;
        Ok(Self::new(parse_activities(&json)?))
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }
}

impl ActivityClassifier for StaticClassifier {
    async fn classify(
        &self,
        _description: &str,
        _goal: &str,
    ) -> Result<Vec<Activity>, ClassifierError> {
        Ok(self.activities.clone())
    }
}
