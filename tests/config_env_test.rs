//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Note that Config::from_env() also loads
//! from .env file via dotenvy, so these tests focus on override behavior.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use arc_companion::config::{Config, LogFormat};
use arc_companion::error::AppError;
use serial_test::serial;
use std::env;

#[test]
#[serial]
fn test_config_from_env_loads_without_any_key() {
    env::remove_var("OPENAI_API_KEY");

    let config = Config::from_env().unwrap();
    assert!(!config.cloud_enabled());
    assert!(config.local_llm.probe_timeout_ms <= config.local_llm.timeout_ms);
}

#[test]
#[serial]
fn test_config_from_env_custom_local_endpoint() {
    env::set_var("OLLAMA_BASE_URL", "http://gpu-box:11434");
    env::set_var("OLLAMA_MODEL", "qwen2.5:7b");

    let config = Config::from_env().unwrap();
    assert_eq!(config.local_llm.base_url, "http://gpu-box:11434");
    assert_eq!(config.local_llm.model, "qwen2.5:7b");

    env::remove_var("OLLAMA_BASE_URL");
    env::remove_var("OLLAMA_MODEL");
}

#[test]
#[serial]
fn test_config_from_env_cloud_key_enables_cloud() {
    env::set_var("OPENAI_API_KEY", "  sk-test  ");

    let config = Config::from_env().unwrap();
    assert!(config.cloud_enabled());
    assert_eq!(config.cloud_llm.api_key.as_deref(), Some("sk-test"));

    env::set_var("OPENAI_API_KEY", "   ");
    let config = Config::from_env().unwrap();
    assert!(!config.cloud_enabled());

    env::remove_var("OPENAI_API_KEY");
}

#[test]
#[serial]
fn test_config_from_env_custom_database() {
    env::set_var("DATABASE_PATH", "/custom/arc.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/arc.db");
    assert_eq!(config.database.max_connections, 10);

    env::remove_var("DATABASE_PATH");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::set_var("LOG_FORMAT", "pretty");
}

#[test]
#[serial]
fn test_config_from_env_custom_timeouts() {
    env::set_var("OLLAMA_PROBE_TIMEOUT_MS", "500");
    env::set_var("OPENAI_TIMEOUT_MS", "45000");

    let config = Config::from_env().unwrap();
    assert_eq!(config.local_llm.probe_timeout_ms, 500);
    assert_eq!(config.cloud_llm.timeout_ms, 45000);

    env::remove_var("OLLAMA_PROBE_TIMEOUT_MS");
    env::remove_var("OPENAI_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_from_env_rejects_bad_timeout() {
    env::set_var("OLLAMA_TIMEOUT_MS", "soon");

    let result = Config::from_env();
    assert!(matches!(result, Err(AppError::Config { .. })));

    env::remove_var("OLLAMA_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_from_env_rejects_bad_pool_size() {
    env::set_var("DATABASE_MAX_CONNECTIONS", "many");

    let result = Config::from_env();
    assert!(matches!(result, Err(AppError::Config { .. })));

    env::remove_var("DATABASE_MAX_CONNECTIONS");
}
