use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;

/// A single generation request: system instructions plus the user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl PromptRequest {
    /// Create a request with the default sampling parameters.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        let defaults = GenerationConfig::default();
        Self {
            system: system.into(),
            user: user.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    /// Apply configured sampling parameters.
    pub fn with_generation(mut self, generation: &GenerationConfig) -> Self {
        self.temperature = generation.temperature;
        self.max_tokens = generation.max_tokens;
        self
    }

    /// Override the token budget (drafts need more room).
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Single-string prompt for completion-style endpoints.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Which strategy produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Local,
    Cloud,
    Canned,
}

impl GenerationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationSource::Local => "local",
            GenerationSource::Cloud => "cloud",
            GenerationSource::Canned => "canned",
        }
    }
}

impl std::fmt::Display for GenerationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generated text tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub source: GenerationSource,
}

impl Generation {
    pub fn new(text: impl Into<String>, source: GenerationSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// True when no model was involved.
    pub fn is_canned(&self) -> bool {
        self.source == GenerationSource::Canned
    }
}

// ============================================================================
// Local (Ollama-compatible) wire types
// ============================================================================

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaGenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: OllamaOptions,
}

/// Sampling options for the local endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaOptions {
    pub temperature: f64,
    pub num_predict: u32,
}

impl OllamaGenerateRequest {
    /// Build a non-streaming request from a prompt.
    pub fn from_prompt(model: impl Into<String>, request: &PromptRequest) -> Self {
        Self {
            model: model.into(),
            prompt: request.combined(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

/// Non-streaming response of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaGenerateResponse {
    pub response: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
}

// ============================================================================
// Cloud (chat-completions) wire types
// ============================================================================

/// Chat message role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Message in a chat-completions conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    /// Build a `[system, user]` conversation from a prompt.
    pub fn from_prompt(model: impl Into<String>, request: &PromptRequest) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                ChatMessage::system(&request.system),
                ChatMessage::user(&request.user),
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Response of `POST /chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

/// Assistant message inside a choice; content may be null.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}
