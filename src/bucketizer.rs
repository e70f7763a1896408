//! Intensity bucketing
//!
//! Groups extracted activities by intensity level. Every level always ends up
//! with at least one candidate workout: empty levels receive the level's
//! display name as a placeholder.

use crate::types::{Activity, IntensityLevel};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Candidate workout names per intensity level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelBuckets {
    buckets: BTreeMap<IntensityLevel, Vec<String>>,
    /// Levels whose only entry is the placeholder name
    #[serde(skip)]
    synthetic: Vec<IntensityLevel>,
}

impl Default for LevelBuckets {
    fn default() -> Self {
        Self::defaults()
    }
}

impl LevelBuckets {
    /// Bucket activities by level, filling empty levels with placeholders.
    ///
    /// Activities with a level outside 1..=7 are skipped; one malformed tag
    /// never fails the request.
    pub fn from_activities(activities: &[Activity]) -> Self {
        let mut buckets: BTreeMap<IntensityLevel, Vec<String>> =
            IntensityLevel::all().map(|level| (level, Vec::new())).collect();

        for activity in activities {
            match IntensityLevel::new(activity.intensity_level) {
                Some(level) => {
                    if let Some(names) = buckets.get_mut(&level) {
                        names.push(activity.name.clone());
                    }
                }
                None => debug!(
                    name = %activity.name,
                    level = activity.intensity_level,
                    "dropping activity with out-of-range intensity"
                ),
            }
        }

        let mut synthetic = Vec::new();
        for (level, names) in buckets.iter_mut() {
            if names.is_empty() {
                names.push(level.display_name().to_string());
                synthetic.push(*level);
            }
        }

        Self { buckets, synthetic }
    }

    /// All-placeholder buckets, used when classification produced nothing
    pub fn defaults() -> Self {
        Self::from_activities(&[])
    }

    /// Candidate names for a level (never empty)
    pub fn names(&self, level: IntensityLevel) -> &[String] {
        self.buckets
            .get(&level)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the level only holds its placeholder name
    pub fn is_synthetic(&self, level: IntensityLevel) -> bool {
        self.synthetic.contains(&level)
    }

    /// Whether every level holds only a placeholder
    pub fn is_all_synthetic(&self) -> bool {
        self.synthetic.len() == self.buckets.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IntensityLevel, &[String])> {
        self.buckets.iter().map(|(level, names)| (*level, names.as_slice()))
    }
}
