//! Performance normalization
//!
//! This module rescales a completed plan's performance series for display.
//! - Values mapped to 0-100 against the plan's own min/max
//! - 10-segment glyph bar per day
//! - Flat series collapse to the midpoint
//!
//! It depends on the global min/max, so it only runs on a finished plan.

use crate::types::{DayPlanEntry, PerformanceLevel};

/// Number of segments in the glyph bar
pub const SEGMENTS: u8 = 10;

/// Normalized value used when every day has the same performance
pub const MIDPOINT_PCT: f64 = 50.0;

const FILLED: char = '■';
const UNFILLED: char = '□';

/// Normalizer for turning raw performance into display levels
pub struct PerformanceNormalizer;

impl PerformanceNormalizer {
    /// Normalize every day of a plan
    pub fn normalize(days: &[DayPlanEntry]) -> Vec<PerformanceLevel> {
        let Some((min_perf, max_perf)) = performance_range(days) else {
            return Vec::new();
        };

        days.iter()
            .map(|day| {
                let normalized_pct = normalize_value(day.performance, min_perf, max_perf);
                let filled_segments = segments_for(normalized_pct);
                PerformanceLevel {
                    date: day.date,
                    performance: day.performance,
                    normalized_pct,
                    filled_segments,
                    glyph: glyph(filled_segments),
                }
            })
            .collect()
    }
}

/// Min and max performance over the series
fn performance_range(days: &[DayPlanEntry]) -> Option<(f64, f64)> {
    days.iter().map(|d| d.performance).fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
    })
}

/// Map a value onto 0-100 given the series range
fn normalize_value(performance: f64, min_perf: f64, max_perf: f64) -> f64 {
    let range = max_perf - min_perf;
    if range > 0.0 {
        (performance - min_perf) / range * 100.0
    } else {
        MIDPOINT_PCT
    }
}

/// Filled segments for a 0-100 value (integer division by 10)
fn segments_for(normalized_pct: f64) -> u8 {
    let per_segment = 100.0 / SEGMENTS as f64;
    ((normalized_pct / per_segment).floor() as i64).clamp(0, SEGMENTS as i64) as u8
}

/// Render a segment count as a bar, e.g. "■■■□□□□□□□"
pub fn glyph(filled_segments: u8) -> String {
    let filled = filled_segments.min(SEGMENTS) as usize;
    let mut bar = String::with_capacity(SEGMENTS as usize * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(UNFILLED).take(SEGMENTS as usize - filled));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntensityLevel, Phase};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn make_days(performances: &[f64]) -> Vec<DayPlanEntry> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        start
            .iter_days()
            .zip(performances)
            .map(|(date, &performance)| DayPlanEntry {
                date,
                weekday: date.format("%a").to_string(),
                phase: Phase::Preparation,
                workout_name: "endurance training".to_string(),
                intensity_level: IntensityLevel::ENDURANCE,
                training_stress: 18.0,
                performance,
                fitness: 0.0,
                fatigue: 0.0,
                guide: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_normalize_spans_full_range() {
        let levels = PerformanceNormalizer::normalize(&make_days(&[-10.0, 5.0, 20.0]));

        assert_eq!(levels.len(), 3);
        assert!((levels[0].normalized_pct - 0.0).abs() < 1e-9);
        assert!((levels[1].normalized_pct - 50.0).abs() < 1e-9);
        assert!((levels[2].normalized_pct - 100.0).abs() < 1e-9);

        assert_eq!(levels[0].filled_segments, 0);
        assert_eq!(levels[1].filled_segments, 5);
        assert_eq!(levels[2].filled_segments, 10);
        assert_eq!(levels[2].glyph, "■■■■■■■■■■");
        assert_eq!(levels[0].glyph, "□□□□□□□□□□");
    }

    #[test]
    fn test_segments_truncate() {
        // 0, 39, 100 → 0%, 39%, 100%
        let levels = PerformanceNormalizer::normalize(&make_days(&[0.0, 39.0, 100.0]));
        assert_eq!(levels[1].filled_segments, 3);
        assert_eq!(levels[1].glyph, "■■■□□□□□□□");
    }

    #[test]
    fn test_flat_series_uses_midpoint() {
        let levels = PerformanceNormalizer::normalize(&make_days(&[12.3, 12.3, 12.3, 12.3]));

        for level in &levels {
            assert_eq!(level.normalized_pct, MIDPOINT_PCT);
            assert_eq!(level.filled_segments, 5);
            assert_eq!(level.glyph, "■■■■■□□□□□");
        }
    }

    #[test]
    fn test_single_day_uses_midpoint() {
        let levels = PerformanceNormalizer::normalize(&make_days(&[-3.0]));
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].filled_segments, 5);
    }

    #[test]
    fn test_empty_plan() {
        assert!(PerformanceNormalizer::normalize(&[]).is_empty());
    }

    #[test]
    fn test_glyph_length_is_constant() {
        for n in 0..=12u8 {
            assert_eq!(glyph(n).chars().count(), SEGMENTS as usize);
        }
    }
}
