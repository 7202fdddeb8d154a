//! Integration tests for life support
//!
//! Services run against an in-memory database. Most tests use an empty
//! model chain so every generated text comes from the fallbacks; one test
//! points the local strategy at a wiremock server.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use arc_companion::config::{Config, LocalLlmConfig};
use arc_companion::error::AppError;
use arc_companion::life::{fallback_message, CrisisLevel, LifeLogInput};
use arc_companion::llm::{GenerationStrategy, LocalModelStrategy, MessagePipeline};
use arc_companion::storage::{SqliteStorage, Storage, ThresholdParam};
use arc_companion::AppState;

async fn create_app(pipeline: MessagePipeline) -> AppState {
    let storage = SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage");
    AppState::new(Config::default(), storage, pipeline)
}

async fn offline_app() -> AppState {
    create_app(MessagePipeline::new(Vec::new())).await
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn input(sleep: Option<f64>, meals: Option<i64>, stress: Option<i64>) -> LifeLogInput {
    LifeLogInput {
        sleep_hours: sleep,
        meal_count: meals,
        stress_score: stress,
        free_text: None,
    }
}

#[cfg(test)]
mod check_in_tests {
    use super::*;

    #[tokio::test]
    async fn test_calm_day_has_no_intervention() {
        let app = offline_app().await;

        let check_in = app
            .life
            .check_in(input(Some(7.0), Some(3), Some(3)), today())
            .await
            .unwrap();

        assert!(!check_in.verdict.is_crisis);
        assert!(check_in.intervention.is_none());

        let stored = app.storage.get_latest_life_log(today()).await.unwrap().unwrap();
        assert!(!stored.crisis_flag);
    }

    #[tokio::test]
    async fn test_medium_crisis_uses_fallback_and_flags_entry() {
        let app = offline_app().await;

        let check_in = app
            .life
            .check_in(input(Some(2.0), Some(2), Some(5)), today())
            .await
            .unwrap();

        assert_eq!(check_in.verdict.level, CrisisLevel::Medium);
        let intervention = check_in.intervention.expect("intervention expected");
        assert_eq!(intervention.message, fallback_message(CrisisLevel::Medium));
        assert_eq!(intervention.source, "canned");

        let id = check_in.entry.id.clone().unwrap();
        let stored = app.storage.get_life_log(&id).await.unwrap().unwrap();
        assert!(stored.crisis_flag);
        assert!(stored.intervention_given);

        let history = app.life.interventions_for(&id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].crisis_level, 2);
    }

    #[tokio::test]
    async fn test_keyword_note_is_high() {
        let app = offline_app().await;
        assert_ok!(
            app.life
                .check_in(input(Some(6.0), Some(2), Some(4)), today())
                .await
        );

        let check_in = app
            .life
            .check_in_note("もう限界かもしれない", today())
            .await
            .unwrap();

        assert_eq!(check_in.verdict.level, CrisisLevel::High);
        assert_eq!(check_in.verdict.keyword(), Some("限界"));
        assert_eq!(check_in.entry.sleep_hours, Some(6.0));
        assert!(check_in
            .intervention
            .unwrap()
            .message
            .contains("0570-783-556"));
    }

    #[tokio::test]
    async fn test_invalid_input_persists_nothing() {
        let app = offline_app().await;

        let err = app
            .life
            .check_in(input(Some(30.0), Some(-1), Some(11)), today())
            .await
            .unwrap_err();

        match err {
            AppError::Validation(e) => assert_eq!(e.messages().len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(app.storage.get_latest_life_log(today()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_interventions_for_unknown_log() {
        let app = offline_app().await;
        assert!(matches!(
            app.life.interventions_for("nope").await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_local_model_writes_intervention() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "今日はもう休みましょう。"})),
            )
            .mount(&server)
            .await;

        let config = LocalLlmConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        let local: Arc<dyn GenerationStrategy> =
            Arc::new(LocalModelStrategy::new(&config).unwrap());
        let app = create_app(MessagePipeline::new(vec![local])).await;

        let check_in = app
            .life
            .check_in(input(None, None, Some(8)), today())
            .await
            .unwrap();

        let intervention = check_in.intervention.unwrap();
        assert_eq!(intervention.message, "今日はもう休みましょう。");
        assert_eq!(intervention.source, "local");
    }
}

#[cfg(test)]
mod threshold_tests {
    use super::*;

    #[tokio::test]
    async fn test_raised_sleep_threshold_changes_verdict() {
        let app = offline_app().await;

        let calm = app
            .life
            .check_in(input(Some(5.0), None, None), today())
            .await
            .unwrap();
        assert!(!calm.verdict.is_crisis);

        let thresholds = app
            .life
            .set_threshold(ThresholdParam::SleepHours, 5.0)
            .await
            .unwrap();
        assert_eq!(thresholds.sleep_hours, 5.0);

        let flagged = app
            .life
            .check_in(input(Some(5.0), None, None), today())
            .await
            .unwrap();
        assert!(flagged.verdict.is_crisis);
    }

    #[tokio::test]
    async fn test_negative_threshold_rejected() {
        let app = offline_app().await;
        assert!(matches!(
            app.life.set_threshold(ThresholdParam::StressScore, -1.0).await,
            Err(AppError::Validation(_))
        ));
        assert!(app
            .life
            .set_threshold(ThresholdParam::MealCount, f64::NAN)
            .await
            .is_err());
    }
}

#[cfg(test)]
mod summary_tests {
    use super::*;

    #[tokio::test]
    async fn test_daily_and_weekly_summaries() {
        let app = offline_app().await;

        let empty = app.life.daily_summary(today()).await.unwrap();
        assert!(!empty.contains("判定"));

        app.life
            .check_in(input(Some(6.5), Some(3), Some(4)), today())
            .await
            .unwrap();

        let daily = app.life.daily_summary(today()).await.unwrap();
        assert!(daily.starts_with("🌟 今日の振り返り"));
        assert!(daily.contains("😴 睡眠: 6.5時間"));

        let weekly = app.life.weekly_summary(today()).await.unwrap();
        assert!(weekly.contains("記録日数: 1日"));
        assert!(weekly.contains("危機介入: 0回"));
    }

    #[tokio::test]
    async fn test_offline_chat_is_canned() {
        let app = offline_app().await;
        let reply = app.life.chat("眠れない").await;
        assert!(reply.is_canned());
        assert!(!reply.text.is_empty());
    }
}
