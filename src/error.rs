//! Error types for Peak Planner

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating a planning request
///
/// Simulation itself is total; every variant here is rejected before the
/// simulator runs.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Start date {start} must be before end date {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Plan window of {days} days exceeds the maximum of {max_days} days")]
    WindowTooLong { days: i64, max_days: i64 },

    #[error("Training description is empty")]
    MissingDescription,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
