use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cloud::CloudModelStrategy;
use super::fallback::CannedReplies;
use super::local::LocalModelStrategy;
use super::types::{Generation, GenerationSource, PromptRequest};
use crate::config::{Config, GenerationConfig};
use crate::error::{LlmError, LlmResult};

/// One backend in the fallback chain.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    /// Short name used in logs and in `LlmError::Exhausted`.
    fn name(&self) -> &'static str;

    /// Source tag attached to text this strategy produces.
    fn source(&self) -> GenerationSource;

    /// Try to produce text. Any error advances the chain.
    async fn attempt(&self, request: &PromptRequest) -> LlmResult<String>;
}

/// Ordered model strategies followed by canned replies.
#[derive(Clone)]
pub struct MessagePipeline {
    strategies: Vec<Arc<dyn GenerationStrategy>>,
    canned: CannedReplies,
    generation: GenerationConfig,
}

impl MessagePipeline {
    /// Create a pipeline from explicit strategies.
    pub fn new(strategies: Vec<Arc<dyn GenerationStrategy>>) -> Self {
        Self {
            strategies,
            canned: CannedReplies::new(),
            generation: GenerationConfig::default(),
        }
    }

    /// Local model first, then the cloud model when an API key is configured.
    pub fn from_config(config: &Config) -> LlmResult<Self> {
        let local: Arc<dyn GenerationStrategy> =
            Arc::new(LocalModelStrategy::new(&config.local_llm)?);
        let mut strategies = vec![local];

        if config.cloud_enabled() {
            strategies.push(Arc::new(CloudModelStrategy::new(&config.cloud_llm)?));
        } else {
            debug!("No cloud API key configured; cloud strategy disabled");
        }

        Ok(Self::new(strategies).with_generation(config.generation.clone()))
    }

    /// Set default sampling parameters for requests built by [`Self::request`].
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Names of the model strategies, in attempt order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Build a request with the pipeline's default sampling parameters.
    pub fn request(&self, system: impl Into<String>, user: impl Into<String>) -> PromptRequest {
        PromptRequest::new(system, user).with_generation(&self.generation)
    }

    /// Try each model strategy in order; `Exhausted` when all of them fail.
    pub async fn attempt_chain(&self, request: &PromptRequest) -> LlmResult<Generation> {
        let mut attempted = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            attempted.push(strategy.name().to_string());

            match strategy.attempt(request).await {
                Ok(text) => {
                    debug!(strategy = strategy.name(), chars = text.chars().count(), "Generation produced");
                    return Ok(Generation::new(text, strategy.source()));
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Generation strategy failed, advancing chain"
                    );
                }
            }
        }

        Err(LlmError::Exhausted { attempted })
    }

    /// Like [`Self::attempt_chain`] but never fails: falls back to a canned reply.
    pub async fn generate(&self, request: &PromptRequest) -> Generation {
        match self.attempt_chain(request).await {
            Ok(generation) => generation,
            Err(e) => {
                info!(reason = %e, "Using canned reply");
                Generation::new(self.canned.reply_for(&request.user), GenerationSource::Canned)
            }
        }
    }

    /// Convenience wrapper returning only the text.
    pub async fn generate_text(&self, system: &str, user: &str) -> String {
        self.generate(&self.request(system, user)).await.text
    }
}
