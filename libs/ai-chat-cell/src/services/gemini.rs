use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use shared_config::AppConfig;

pub const SYSTEM_PROMPT: &str = "Your name is Thozhi.\n\
    You are a caring, feminine pregnancy companion and supportive friend.\n\
    Be warm, gentle, and medically responsible.\n\
    Do not diagnose or replace a clinician.\n\
    Avoid repeating the exact same reply; tailor to the user's message.";

/// Tried in order after the configured model.
pub const CANDIDATE_MODELS: [&str; 4] = [
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash-8b",
    "gemini-1.0-pro",
];

const GENERATION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    configured_model: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
            .build()
            .context("building Gemini HTTP client")?;

        Ok(Self {
            http_client,
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            configured_model: config.gemini_model.clone(),
        })
    }

    /// Names of the models that support `generateContent`, without the
    /// `models/` prefix.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/models?key={}", self.base_url, urlencoding::encode(&self.api_key));
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or_default();
            let message = body["error"]["message"].as_str().unwrap_or("ListModels failed");
            return Err(anyhow!("{} ({})", message, status));
        }

        let list: ModelList = response.json().await?;
        Ok(list.models
            .into_iter()
            .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }

    pub fn pick_model(&self, available: &[String]) -> Option<String> {
        pick_model(self.configured_model.as_deref(), available)
    }

    /// Text of the first candidate, `None` when the model answered with
    /// nothing usable.
    pub async fn generate(&self, model: &str, message: &str) -> Result<Option<String>> {
        debug!("Calling Gemini model {}", model);

        let url = format!(
            "{}/v1/models/{}:generateContent?key={}",
            self.base_url,
            model,
            urlencoding::encode(&self.api_key),
        );
        let prompt = format!("{}\n\nUser message:\n{}", SYSTEM_PROMPT, message);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.9,
                "maxOutputTokens": 512
            }
        });

        let response = self.http_client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let data: Value = response.json().await?;
        Ok(data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string))
    }
}

/// Configured model if the account has it, else the first listed
/// candidate, else whatever is available first.
pub fn pick_model(configured: Option<&str>, available: &[String]) -> Option<String> {
    configured
        .into_iter()
        .chain(CANDIDATE_MODELS)
        .find(|name| available.iter().any(|a| a == name))
        .map(str::to_string)
        .or_else(|| available.first().cloned())
}

/// Model name chosen on first use and kept for the life of the process.
#[derive(Clone, Default)]
pub struct ModelCache {
    inner: Arc<RwLock<Option<String>>>,
}

impl ModelCache {
    pub async fn get_or_pick(&self, client: &GeminiClient) -> Result<String> {
        if let Some(model) = self.inner.read().await.clone() {
            return Ok(model);
        }

        let mut slot = self.inner.write().await;
        if let Some(model) = slot.clone() {
            return Ok(model);
        }

        let available = client.list_models().await?;
        let model = client
            .pick_model(&available)
            .ok_or_else(|| anyhow!("No Gemini model supports generateContent"))?;
        info!("Using Gemini model {}", model);

        *slot = Some(model.clone());
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_configured_model_wins_when_available() {
        let available = names(&["gemini-1.5-pro", "gemini-2.0-flash"]);
        assert_eq!(pick_model(Some("gemini-2.0-flash"), &available).as_deref(), Some("gemini-2.0-flash"));
    }

    #[test]
    fn test_candidates_in_order() {
        let available = names(&["gemini-1.0-pro", "gemini-1.5-pro"]);
        assert_eq!(pick_model(Some("missing-model"), &available).as_deref(), Some("gemini-1.5-pro"));
    }

    #[test]
    fn test_falls_back_to_first_available() {
        let available = names(&["gemini-exp", "gemini-other"]);
        assert_eq!(pick_model(None, &available).as_deref(), Some("gemini-exp"));
        assert_eq!(pick_model(None, &[]), None);
    }
}
