use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::pipeline::GenerationStrategy;
use super::types::{GenerationSource, OllamaGenerateRequest, OllamaGenerateResponse, PromptRequest};
use crate::config::LocalLlmConfig;
use crate::error::{LlmError, LlmResult};

/// Strategy backed by a local Ollama-compatible server.
///
/// Every attempt first probes `GET /api/tags` under the probe timeout; an
/// unreachable server is reported without sending the generation request.
#[derive(Clone)]
pub struct LocalModelStrategy {
    client: Client,
    base_url: String,
    model: String,
    probe_timeout_ms: u64,
    timeout_ms: u64,
}

impl LocalModelStrategy {
    /// Create a new local strategy
    pub fn new(config: &LocalLlmConfig) -> LlmResult<Self> {
        let client = Client::builder().build().map_err(LlmError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            probe_timeout_ms: config.probe_timeout_ms,
            timeout_ms: config.timeout_ms,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the server answers the tag listing in time.
    pub async fn is_available(&self) -> bool {
        self.probe().await.is_ok()
    }

    async fn probe(&self) -> LlmResult<()> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_millis(self.probe_timeout_ms))
            .send()
            .await
            .map_err(|_| LlmError::Unreachable {
                endpoint: self.base_url.clone(),
            })?;

        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "Local model probe rejected");
            return Err(LlmError::Unreachable {
                endpoint: self.base_url.clone(),
            });
        }

        Ok(())
    }

    async fn generate(&self, request: &PromptRequest) -> LlmResult<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest::from_prompt(&self.model, request);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_millis(self.timeout_ms))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let parsed: OllamaGenerateResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: format!("Failed to parse generate response: {}", e),
                })?;

        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse {
                message: "Local model returned an empty response".to_string(),
            });
        }

        Ok(text.to_string())
    }
}

#[async_trait]
impl GenerationStrategy for LocalModelStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    fn source(&self) -> GenerationSource {
        GenerationSource::Local
    }

    async fn attempt(&self, request: &PromptRequest) -> LlmResult<String> {
        self.probe().await?;

        let start = Instant::now();
        let text = self.generate(request).await?;
        info!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis(),
            "Local model generation succeeded"
        );
        Ok(text)
    }
}
