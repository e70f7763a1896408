//! Gemini integration for training extraction
//!
//! Sends the athlete's goal and description to the Gemini `generateContent`
//! endpoint and parses the returned training list.

use super::extract::{extract_json, parse_activities};
use super::{ActivityClassifier, ClassifierError};
use crate::types::Activity;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client with an explicit API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a new client, loading the API key from the environment
    pub fn from_env() -> Result<Self, ClassifierError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ClassifierError::MissingApiKey)?;
        if api_key.trim().is_empty() {
            return Err(ClassifierError::MissingApiKey);
        }
        Ok(Self::new(api_key))
    }

    /// Point the client at a different host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single-turn prompt and return the first text part
    pub async fn complete(&self, prompt: &str) -> Result<String, ClassifierError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                return Err(ClassifierError::Api(error_resp.error.message));
            }
            return Err(ClassifierError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ClassifierError::Parse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or_else(|| ClassifierError::Parse("No text content in response".to_string()))
    }

    /// Ask the model for the training list behind a goal and description
    pub async fn extract_trainings(
        &self,
        description: &str,
        goal: &str,
    ) -> Result<Vec<Activity>, ClassifierError> {
        let prompt = build_prompt(description, goal);
        let response_text = self.complete(&prompt).await?;
        let json_str = extract_json(&response_text)?;
        let activities = parse_activities(&json_str)?;
        debug!(count = activities.len(), model = %self.model, "extracted trainings");
        Ok(activities)
    }
}

impl ActivityClassifier for GeminiClient {
    async fn classify(
        &self,
        description: &str,
        goal: &str,
    ) -> Result<Vec<Activity>, ClassifierError> {
        self.extract_trainings(description, goal).await
    }
}

/// Fill the extraction prompt template
fn build_prompt(description: &str, goal: &str) -> String {
    include_str!("prompts/extract_trainings.txt")
        .replace("{goal}", goal)
        .replace("{description}", description)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
