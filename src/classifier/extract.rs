//! Classifier response parsing
//!
//! Pulls the JSON document out of free-form model text and maps its records to
//! activities. Records are taken on a best-effort basis: anything without a
//! usable name or intensity is skipped instead of failing the whole response.

use super::ClassifierError;
use crate::types::Activity;
use serde_json::Value;
use tracing::debug;

/// Map a 4-tier intensity tag onto the 7-level scale
pub fn level_from_tag(tag: &str) -> Option<i64> {
    match tag.trim().to_lowercase().as_str() {
        "rest" => Some(1),
        "low" => Some(2),
        "medium" | "moderate" => Some(4),
        "high" => Some(6),
        _ => None,
    }
}

/// Extract JSON from model output (handles markdown code blocks)
pub fn extract_json(text: &str) -> Result<String, ClassifierError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed.to_string());
    }

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return Ok(text[start..start + end].trim().to_string());
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let content_start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[content_start..].find("```") {
            return Ok(text[content_start..content_start + end].trim().to_string());
        }
    }

    // Bare array in prose, unless an object opens first
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        let array_first = text.find('{').map_or(true, |brace| start < brace);
        if array_first && start < end {
            return Ok(text[start..=end].to_string());
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return Ok(text[start..=end].to_string());
        }
    }

    Err(ClassifierError::Parse(
        "Could not extract JSON from response".to_string(),
    ))
}

/// Parse `{"trainings": [...]}` or a bare array of training records
pub fn parse_activities(json: &str) -> Result<Vec<Activity>, ClassifierError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ClassifierError::Parse(format!("{}: {}", e, json)))?;

    let records = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("trainings") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(_) => {
                return Err(ClassifierError::Parse(
                    "\"trainings\" is not an array".to_string(),
                ))
            }
        },
        _ => {
            return Err(ClassifierError::Parse(
                "Expected a JSON object or array".to_string(),
            ))
        }
    };

    let activities: Vec<Activity> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let activity = parse_record(record);
            if activity.is_none() {
                debug!(index, "skipping unusable training record");
            }
            activity
        })
        .collect();

    Ok(activities)
}

fn parse_record(record: &Value) -> Option<Activity> {
    let name = record.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let intensity = record
        .get("intensity_level")
        .or_else(|| record.get("intensity"))?;

    let level = match intensity {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok().or_else(|| level_from_tag(s))?,
        _ => return None,
    };

    Some(Activity::new(name, level))
}
