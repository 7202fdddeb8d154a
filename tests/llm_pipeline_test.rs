//! Integration tests for the message generation chain
//!
//! Local and cloud endpoints are mocked with wiremock; every test walks the
//! real HTTP strategies through `MessagePipeline`.

use std::sync::Arc;

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use arc_companion::config::{CloudLlmConfig, LocalLlmConfig};
use arc_companion::error::LlmError;
use arc_companion::llm::{
    CannedReplies, CloudModelStrategy, GenerationSource, GenerationStrategy, LocalModelStrategy,
    MessagePipeline, PromptRequest,
};

fn local_strategy(base_url: &str) -> Arc<dyn GenerationStrategy> {
    let config = LocalLlmConfig {
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
        probe_timeout_ms: 500,
        timeout_ms: 1000,
    };
    Arc::new(LocalModelStrategy::new(&config).expect("Failed to create local strategy"))
}

fn cloud_strategy(base_url: &str) -> Arc<dyn GenerationStrategy> {
    let config = CloudLlmConfig {
        api_key: Some("test-key".to_string()),
        base_url: base_url.to_string(),
        model: "test-chat".to_string(),
        timeout_ms: 1000,
    };
    Arc::new(CloudModelStrategy::new(&config).expect("Failed to create cloud strategy"))
}

async fn mount_tags(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"models": []})))
        .mount(server)
        .await;
}

fn request() -> PromptRequest {
    PromptRequest::new("あなたは穏やかな伴走者です。", "今日は疲れた").with_max_tokens(120)
}

#[cfg(test)]
mod local_tests {
    use super::*;

    #[tokio::test]
    async fn test_local_generation_sends_combined_prompt() {
        let server = MockServer::start().await;
        mount_tags(&server, 200).await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "prompt": "あなたは穏やかな伴走者です。\n\n今日は疲れた",
                "stream": false,
                "options": {"num_predict": 120}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "test-model",
                "response": "  ゆっくり休んでくださいね。\n",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = MessagePipeline::new(vec![local_strategy(&server.uri())]);
        let generation = pipeline.attempt_chain(&request()).await.unwrap();

        assert_eq!(generation.text, "ゆっくり休んでくださいね。");
        assert_eq!(generation.source, GenerationSource::Local);
    }

    #[tokio::test]
    async fn test_failed_probe_skips_generate() {
        let server = MockServer::start().await;
        mount_tags(&server, 503).await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "x"})))
            .expect(0)
            .mount(&server)
            .await;

        let pipeline = MessagePipeline::new(vec![local_strategy(&server.uri())]);
        let err = pipeline.attempt_chain(&request()).await.unwrap_err();

        assert!(matches!(err, LlmError::Exhausted { ref attempted } if attempted == &["local"]));
    }

    #[tokio::test]
    async fn test_empty_local_response_is_a_failure() {
        let server = MockServer::start().await;
        mount_tags(&server, 200).await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "   "})))
            .mount(&server)
            .await;

        let pipeline = MessagePipeline::new(vec![local_strategy(&server.uri())]);
        assert!(pipeline.attempt_chain(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_slow_local_generation_times_out() {
        let server = MockServer::start().await;
        mount_tags(&server, 200).await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "遅すぎる返事"}))
                    .set_delay(std::time::Duration::from_millis(3000)),
            )
            .mount(&server)
            .await;

        let pipeline = MessagePipeline::new(vec![local_strategy(&server.uri())]);
        let generation = pipeline.generate(&request()).await;

        assert_eq!(generation.source, GenerationSource::Canned);
    }
}

#[cfg(test)]
mod chain_tests {
    use super::*;

    async fn mount_cloud(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test-chat",
                "messages": [
                    {"role": "system", "content": "あなたは穏やかな伴走者です。"},
                    {"role": "user", "content": "今日は疲れた"}
                ],
                "max_tokens": 120
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_unreachable_local_falls_through_to_cloud() {
        let local = MockServer::start().await;
        mount_tags(&local, 500).await;

        let cloud = MockServer::start().await;
        mount_cloud(&cloud, "クラウドからの返事です").await;

        let pipeline = MessagePipeline::new(vec![
            local_strategy(&local.uri()),
            cloud_strategy(&cloud.uri()),
        ]);
        let generation = pipeline.attempt_chain(&request()).await.unwrap();

        assert_eq!(generation.text, "クラウドからの返事です");
        assert_eq!(generation.source, GenerationSource::Cloud);
    }

    #[tokio::test]
    async fn test_cloud_api_error_then_canned() {
        let local = MockServer::start().await;
        mount_tags(&local, 500).await;

        let cloud = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&cloud)
            .await;

        let pipeline = MessagePipeline::new(vec![
            local_strategy(&local.uri()),
            cloud_strategy(&cloud.uri()),
        ]);

        match pipeline.attempt_chain(&request()).await {
            Err(LlmError::Exhausted { attempted }) => {
                assert_eq!(attempted, vec!["local".to_string(), "cloud".to_string()]);
            }
            other => panic!("expected exhausted chain, got {:?}", other),
        }

        let generation = pipeline.generate(&request()).await;
        assert!(generation.is_canned());
        assert_eq!(
            generation.text,
            CannedReplies::new().reply_for("今日は疲れた")
        );
    }

    #[tokio::test]
    async fn test_cloud_without_key_is_not_configured() {
        let config = CloudLlmConfig::default();
        assert!(matches!(
            CloudModelStrategy::new(&config),
            Err(LlmError::NotConfigured { .. })
        ));
    }
}
