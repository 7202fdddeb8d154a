use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::info;

use super::pipeline::GenerationStrategy;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, GenerationSource, PromptRequest};
use crate::config::CloudLlmConfig;
use crate::error::{LlmError, LlmResult};

/// Strategy backed by an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct CloudModelStrategy {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_ms: u64,
}

impl CloudModelStrategy {
    /// Create a new cloud strategy. Fails with `NotConfigured` without an API key.
    pub fn new(config: &CloudLlmConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::NotConfigured {
                backend: "cloud".to_string(),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute_request(&self, request: &PromptRequest) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest::from_prompt(&self.model, request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
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

        let completion: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: format!("Failed to parse chat completion: {}", e),
                })?;

        completion
            .first_content()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse {
                message: "Chat completion had no content".to_string(),
            })
    }
}

#[async_trait]
impl GenerationStrategy for CloudModelStrategy {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn source(&self) -> GenerationSource {
        GenerationSource::Cloud
    }

    async fn attempt(&self, request: &PromptRequest) -> LlmResult<String> {
        let start = Instant::now();
        let text = self.execute_request(request).await?;
        info!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis(),
            "Cloud model generation succeeded"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let err = CloudModelStrategy::new(&CloudLlmConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::NotConfigured { .. }));
    }

    #[test]
    fn test_client_creation() {
        let config = CloudLlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "https://api.openai.com/v1/".to_string(),
            ..Default::default()
        };
        let strategy = CloudModelStrategy::new(&config).unwrap();
        assert_eq!(strategy.base_url(), "https://api.openai.com/v1");
    }
}
