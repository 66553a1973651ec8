//! Gemini `generateContent` client with bounded retry and model fallback.
//!
//! Models are tried in configured order. Rate limits, 5xx responses and
//! transport failures are retried on the same model with exponential
//! backoff; a model the key cannot reach (403/404) is skipped. Any other
//! client error ends the call immediately.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model {model} is rate limited")]
    RateLimited { model: String },
    #[error("model {model} returned {status}: {body}")]
    Server {
        model: String,
        status: u16,
        body: String,
    },
    #[error("model {model} is not available to this key ({status})")]
    ModelUnavailable { model: String, status: u16 },
    #[error("model {model} returned no text")]
    EmptyResponse { model: String },
    #[error("no model configured")]
    NoModels,
    #[error("every configured model failed; last error: {last}")]
    Exhausted { last: String },
}

impl ModelError {
    /// Worth retrying on the same model after a pause.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Something that turns a prompt into reply text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per model, first try included.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            multiplier: 2.0,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// Pause after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let ms = (self.initial_backoff_ms as f64 * factor).min(self.max_backoff_ms as f64);
        Duration::from_millis(ms as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    /// Tried in order.
    pub models: Vec<String>,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    pub temperature: f32,
    pub retry: RetryPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
                "gemini-pro".to_string(),
            ],
            timeout_secs: 60,
            temperature: 0.0,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    models: Vec<String>,
    timeout: Duration,
    temperature: f32,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: String, config: &ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            models: config.models.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            temperature: config.temperature,
            retry: config.retry.clone(),
        }
    }

    async fn call(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, model);
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "responseMimeType": "application/json",
            },
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(ModelError::RateLimited {
                model: model.to_string(),
            });
        }
        if matches!(status.as_u16(), 403 | 404) {
            return Err(ModelError::ModelUnavailable {
                model: model.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Server {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse {
                model: model.to_string(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let mut last: Option<ModelError> = None;
        let max_attempts = self.retry.max_attempts.max(1);

        for model in &self.models {
            for attempt in 1..=max_attempts {
                match self.call(model, prompt).await {
                    Ok(text) => {
                        info!(model = %model, attempt, chars = text.len(), "model replied");
                        return Ok(text);
                    }
                    Err(e) if e.is_transient() && attempt < max_attempts => {
                        let pause = self.retry.backoff(attempt);
                        warn!(model = %model, attempt, error = %e, pause_ms = pause.as_millis() as u64, "retrying model call");
                        tokio::time::sleep(pause).await;
                    }
                    Err(e) if e.is_transient() || matches!(e, ModelError::ModelUnavailable { .. }) => {
                        warn!(model = %model, attempt, error = %e, "giving up on model");
                        last = Some(e);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        match last {
            Some(e) => Err(ModelError::Exhausted {
                last: e.to_string(),
            }),
            None => Err(ModelError::NoModels),
        }
    }
}
