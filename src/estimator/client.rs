//! Gemini `generateContent` client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CostEstimator, Estimate, EstimatorError};
use crate::pricing::ServiceCategory;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Connection settings for [`GeminiEstimator`]
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Cost estimator backed by Google's Gemini API
pub struct GeminiEstimator {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiEstimator {
    pub fn new(settings: GeminiSettings) -> Result<Self, EstimatorError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn prompt(category: &ServiceCategory, description: &str, district: &str) -> String {
        format!(
            "You are an expert cost estimator for home services in Bihar, India.\n\
             Based on the following details, provide a realistic estimated cost range in Indian Rupees (₹).\n\n\
             Service Type: {category}\n\
             Location: {district}, Bihar\n\
             Problem Description: {description}\n\n\
             Consider current market rates in Tier-2/Tier-3 cities of Bihar like Patna, Purnia, etc.\n\
             Respond in JSON with exactly these fields:\n\
             {{\"estimatedRange\": \"₹XXX - ₹YYY\", \"explanation\": \"why this cost (parts, labour time)\", \
             \"tips\": \"one or two tips to save money or prepare for the technician\"}}"
        )
    }
}

/// Strip a Markdown code fence if the model wrapped its JSON in one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl CostEstimator for GeminiEstimator {
    async fn estimate(
        &self,
        category: &ServiceCategory,
        description: &str,
        district: &str,
    ) -> Result<Estimate, EstimatorError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(EstimatorError::NotConfigured)?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(Self::prompt(category, description, district)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );

        tracing::debug!(category = %category, district = %district, "Requesting cost estimate");

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EstimatorError::Api(format!("{}: {}", status, body)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EstimatorError::Parse(e.to_string()))?;

        let text = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or_else(|| EstimatorError::Parse("response has no text part".to_string()))?;

        serde_json::from_str::<Estimate>(strip_code_fence(&text))
            .map_err(|e| EstimatorError::Parse(e.to_string()))
    }
}
