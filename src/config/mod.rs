use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub local_llm: LocalLlmConfig,
    pub cloud_llm: CloudLlmConfig,
    pub generation: GenerationConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Local (Ollama-compatible) model endpoint
#[derive(Debug, Clone)]
pub struct LocalLlmConfig {
    pub base_url: String,
    pub model: String,
    /// Bound for the reachability probe.
    pub probe_timeout_ms: u64,
    /// Bound for a generation request.
    pub timeout_ms: u64,
}

/// Cloud chat-completion endpoint. `api_key == None` disables it.
#[derive(Debug, Clone)]
pub struct CloudLlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

/// Default sampling parameters
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let local_llm = LocalLlmConfig {
            base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| LocalLlmConfig::default().base_url),
            model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| LocalLlmConfig::default().model),
            probe_timeout_ms: parse_var("OLLAMA_PROBE_TIMEOUT_MS")?.unwrap_or(3000),
            timeout_ms: parse_var("OLLAMA_TIMEOUT_MS")?.unwrap_or(60000),
        };

        let cloud_llm = CloudLlmConfig {
            api_key: env::var("OPENAI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| CloudLlmConfig::default().base_url),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| CloudLlmConfig::default().model),
            timeout_ms: parse_var("OPENAI_TIMEOUT_MS")?.unwrap_or(30000),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/arc.db".to_string()),
            ),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS")?.unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config {
            local_llm,
            cloud_llm,
            generation: GenerationConfig::default(),
            database,
            logging,
        })
    }

    /// Whether the cloud strategy takes part in the fallback chain.
    pub fn cloud_enabled(&self) -> bool {
        self.cloud_llm.api_key.is_some()
    }
}

/// Parse an optional integer setting; malformed values are a config error.
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config {
                message: format!("{} must be a non-negative integer, got '{}'", name, raw),
            }),
        Err(_) => Ok(None),
    }
}

impl Default for LocalLlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            probe_timeout_ms: 3000,
            timeout_ms: 60000,
        }
    }
}

impl Default for CloudLlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            timeout_ms: 30000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/arc.db"),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 300,
        }
    }
}
