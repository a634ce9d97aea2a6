//! Remote vision analysis over an OpenAI-style chat-completions endpoint.
//!
//! Every failure path inside `analyze` resolves to an `AnalysisError`
//! value — nothing escapes this boundary as a panic or a foreign error
//! type, so the orchestrator has exactly one result shape to render.

use async_trait::async_trait;

use super::prompts::{ANALYSIS_PROMPT, MAX_TOKENS, MODEL};
use super::{AnalysisError, Analyzer};
use crate::capture::ImagePayload;
use crate::config::Settings;

/// HTTP client for the analysis endpoint.
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AnalysisClient {
    /// Build a client from resolved settings.
    ///
    /// The request timeout is enforced at the `reqwest` client level, so a
    /// hung transport still resolves to an error within the bound.
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            // Builder only fails on TLS backend misconfiguration; fall back
            // to a default client rather than refusing to start.
            .unwrap_or_else(|e| {
                log::warn!("[LLM] HTTP client builder failed ({}), using defaults", e);
                reqwest::Client::new()
            });

        Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    async fn analyze_inner(&self, image: ImagePayload) -> Result<String, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::NotConfigured)?;

        let body = serde_json::json!({
            "model": MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": ANALYSIS_PROMPT},
                    {"type": "image_url", "image_url": {"url": image.to_data_uri()}}
                ]
            }],
            "max_tokens": MAX_TOKENS,
        });

        let start = std::time::Instant::now();
        log::info!("[LLM] POST {} ({} image bytes)", self.endpoint, image.as_bytes().len());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[LLM] API returned {}: {}", status, body);
            return Err(AnalysisError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Transport(e.to_string())
            } else {
                AnalysisError::ParseFailed
            }
        })?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(AnalysisError::ParseFailed)?;

        log::info!(
            "[LLM] Analysis complete in {}ms ({} chars)",
            start.elapsed().as_millis(),
            text.len()
        );

        Ok(text.to_string())
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(&self, image: ImagePayload) -> Result<String, AnalysisError> {
        self.analyze_inner(image).await
    }
}
