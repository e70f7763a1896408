//! Level load table
//!
//! Static mapping from intensity level to the training stress a session adds to
//! fatigue and the adaptation factor that converts part of it into fitness.

use crate::types::IntensityLevel;
use serde::Serialize;

/// Load contributed by one day at a given level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelLoad {
    pub training_stress: f64,
    pub adaptation_factor: f64,
}

/// Indexed by level - 1. Both columns are non-decreasing.
const LEVEL_LOADS: [LevelLoad; 7] = [
    LevelLoad { training_stress: 0.0, adaptation_factor: 0.0 },
    LevelLoad { training_stress: 5.0, adaptation_factor: 0.5 },
    LevelLoad { training_stress: 10.0, adaptation_factor: 0.7 },
    LevelLoad { training_stress: 18.0, adaptation_factor: 1.0 },
    LevelLoad { training_stress: 25.0, adaptation_factor: 1.2 },
    LevelLoad { training_stress: 35.0, adaptation_factor: 1.5 },
    LevelLoad { training_stress: 45.0, adaptation_factor: 1.8 },
];

/// Look up the load for a level
pub fn level_load(level: IntensityLevel) -> LevelLoad {
    LEVEL_LOADS[(level.value() - 1) as usize]
}

/// The full table in ascending level order
pub fn load_table() -> impl Iterator<Item = (IntensityLevel, LevelLoad)> {
    IntensityLevel::all().map(|level| (level, level_load(level)))
}
