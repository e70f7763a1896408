//! Core types for the Peak Planner pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: extracted activities, intensity levels, phases, and the day-by-day
//! plan handed to presentation layers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A named training activity extracted by the upstream classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity name as the classifier phrased it
    pub name: String,
    /// Intensity on the 7-level scale (values outside 1..=7 are dropped later)
    pub intensity_level: i64,
}

impl Activity {
    pub fn new(name: impl Into<String>, intensity_level: i64) -> Self {
        Self {
            name: name.into(),
            intensity_level,
        }
    }
}

/// Intensity level on the 7-level scale (1 = complete rest, 7 = maximum effort)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct IntensityLevel(u8);

impl IntensityLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    pub const COMPLETE_REST: Self = Self(1);
    pub const LIGHT_RECOVERY: Self = Self(2);
    pub const TECHNIQUE: Self = Self(3);
    pub const ENDURANCE: Self = Self(4);
    pub const TEMPO: Self = Self(5);
    pub const HIGH_INTENSITY: Self = Self(6);
    pub const MAXIMUM: Self = Self(7);

    /// Build a level, rejecting values outside 1..=7
    pub fn new(value: i64) -> Option<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    /// All levels in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Fixed display name, also used as the placeholder workout for empty buckets
    pub fn display_name(&self) -> &'static str {
        match self.0 {
            1 => "complete rest",
            2 => "light recovery",
            3 => "technique training",
            4 => "endurance training",
            5 => "tempo training",
            6 => "high-intensity intervals",
            _ => "maximum effort",
        }
    }

    /// Short description of what a session at this level feels like
    pub fn description(&self) -> &'static str {
        match self.0 {
            1 => "Full rest such as sleep or meditation",
            2 => "Easy walking or recovery stretching",
            3 => "Skill work with low cardiac load, foam rolling",
            4 => "Conversational aerobic work, long easy runs",
            5 => "Sustained, slightly breathless threshold work",
            6 => "Intervals near max heart rate, heavy strength work",
            _ => "Race or personal-record effort",
        }
    }

    /// Label used by calendars and tables, e.g. "Lvl 4: endurance training"
    pub fn label(&self) -> String {
        format!("Lvl {}: {}", self.0, self.display_name())
    }
}

impl TryFrom<u8> for IntensityLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as i64).ok_or_else(|| format!("Intensity level out of range: {}", value))
    }
}

impl From<IntensityLevel> for u8 {
    fn from(level: IntensityLevel) -> Self {
        level.0
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse periodization stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Preparation,
    Competition,
    Taper,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preparation => "Preparation",
            Phase::Competition => "Competition",
            Phase::Taper => "Taper",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One calendar day of the generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlanEntry {
    pub date: NaiveDate,
    /// Weekday abbreviation ("Mon", "Tue", ...)
    pub weekday: String,
    pub phase: Phase,
    pub workout_name: String,
    pub intensity_level: IntensityLevel,
    /// Load applied that day, after any taper volume cut
    pub training_stress: f64,
    /// fitness - fatigue, rounded to 1 decimal
    pub performance: f64,
    /// Fitness after the day's update, rounded to 1 decimal
    pub fitness: f64,
    /// Fatigue after the day's update, rounded to 1 decimal
    pub fatigue: f64,
    /// Coaching tip for the chosen workout
    pub guide: String,
}

/// A complete generated plan, owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Derived from the seed, so a replayed plan keeps its id
    pub plan_id: Uuid,
    /// Seed that reproduces the plan exactly
    pub seed: u64,
    pub goal: String,
    pub days: Vec<DayPlanEntry>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Day with the highest forecast performance (earliest wins on ties)
    pub fn peak_day(&self) -> Option<&DayPlanEntry> {
        self.days.iter().fold(None, |best: Option<&DayPlanEntry>, day| match best {
            Some(b) if b.performance >= day.performance => Some(b),
            _ => Some(day),
        })
    }

    /// Number of days spent in each phase
    pub fn phase_counts(&self) -> BTreeMap<Phase, usize> {
        let mut counts = BTreeMap::new();
        for day in &self.days {
            *counts.entry(day.phase).or_insert(0) += 1;
        }
        counts
    }
}

/// Display-scale performance for one day, computed after the plan is complete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLevel {
    pub date: NaiveDate,
    pub performance: f64,
    /// 0-100 relative to the plan's own min/max
    pub normalized_pct: f64,
    /// Filled segments out of 10
    pub filled_segments: u8,
    /// e.g. "■■■■■□□□□□"
    pub glyph: String,
}
