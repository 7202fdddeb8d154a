//! Integration tests for deadlines, drafts and contacts
//!
//! An empty model chain is used throughout, so drafts come from templates.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

use arc_companion::config::Config;
use arc_companion::error::AppError;
use arc_companion::llm::{GenerationSource, MessagePipeline};
use arc_companion::storage::{
    CoreTheme, Deadline, DeadlineCategory, DeadlineStatus, DocumentStatus, EmergencyContact,
    SqliteStorage, Storage,
};
use arc_companion::AppState;

async fn offline_app() -> AppState {
    let storage = SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage");
    AppState::new(Config::default(), storage, MessagePipeline::new(Vec::new()))
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn deadline(title: &str, days: i64, category: DeadlineCategory) -> Deadline {
    Deadline::new(title, now() + Duration::days(days)).with_category(category)
}

#[cfg(test)]
mod priority_flow_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_add_scores_and_focus() {
        let app = offline_app().await;
        let service = &app.deadlines;

        let report = service
            .add_deadline(deadline("中間レポート", 20, DeadlineCategory::Report), now())
            .await
            .unwrap();
        let scholarship = service
            .add_deadline(deadline("奨学金申請", 2, DeadlineCategory::Scholarship), now())
            .await
            .unwrap();

        assert_eq!(report.priority_score, 140.0);
        assert_eq!(scholarship.priority_score, 500.0);

        let focus = service.today_focus(now()).await.unwrap();
        let task = focus.task.expect("focus task expected");
        assert_eq!(task.deadline.id, scholarship.id);
        assert_eq!(task.days_until, 2);
        assert!(focus.message.contains("【奨学金申請】"));
        assert!(focus.message.contains("⏰ あと2日です"));
    }

    #[tokio::test]
    async fn test_status_changes_rescore() {
        let app = offline_app().await;
        let service = &app.deadlines;

        let grant = service
            .add_deadline(deadline("科研費", 5, DeadlineCategory::Grant), now())
            .await
            .unwrap();
        assert_eq!(grant.priority_score, 340.0);

        let started = service.start_deadline(&grant.id, now()).await.unwrap();
        assert_eq!(started.status, DeadlineStatus::InProgress);
        assert_eq!(started.priority_score, 390.0);

        let stats = service.deadline_stats(now()).await.unwrap();
        assert_eq!((stats.total, stats.this_week, stats.in_progress), (1, 1, 1));

        let completed = service.complete_deadline(&grant.id, now()).await.unwrap();
        assert!(completed.completed_at.is_some());

        let focus = service.today_focus(now()).await.unwrap();
        assert!(!focus.has_task());
        assert_eq!(service.deadline_stats(now()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_overdue_outranks_everything() {
        let app = offline_app().await;
        let service = &app.deadlines;

        service
            .add_deadline(deadline("奨学金", 1, DeadlineCategory::Scholarship), now())
            .await
            .unwrap();
        let overdue = service
            .add_deadline(deadline("会議メモ", -1, DeadlineCategory::Meeting), now())
            .await
            .unwrap();

        assert_eq!(overdue.priority_score, 1050.0);
        let focus = service.today_focus(now()).await.unwrap();
        assert!(focus.message.contains("⚠️ 期限を過ぎています"));
        assert_eq!(service.deadline_stats(now()).await.unwrap().overdue, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_deadlines() {
        let app = offline_app().await;
        let service = &app.deadlines;

        assert!(matches!(
            service.complete_deadline("missing", now()).await,
            Err(AppError::NotFound { entity: "deadline", .. })
        ));
        assert!(matches!(
            service.delete_deadline("missing").await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service
                .add_deadline(deadline("   ", 3, DeadlineCategory::Other), now())
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_leaves_open_list() {
        let app = offline_app().await;
        let service = &app.deadlines;

        let d = service
            .add_deadline(deadline("学会発表", 10, DeadlineCategory::Submission), now())
            .await
            .unwrap();
        service.cancel_deadline(&d.id, now()).await.unwrap();

        assert!(service.list_deadlines().await.unwrap().is_empty());
        assert_eq!(
            service.get_deadline(&d.id).await.unwrap().status,
            DeadlineStatus::Cancelled
        );
    }
}

#[cfg(test)]
mod document_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_application_template_when_offline() {
        let app = offline_app().await;
        app.storage
            .create_theme(&CoreTheme::new("ケアの倫理", "誰が誰をケアするのか").with_importance(0.9))
            .await
            .unwrap();

        let d = app
            .deadlines
            .add_deadline(deadline("奨学金申請", 14, DeadlineCategory::Scholarship), now())
            .await
            .unwrap();

        let draft = app
            .deadlines
            .draft_application(&d.id, Some("研究目的"))
            .await
            .unwrap();

        assert!(draft.is_template());
        assert_eq!(draft.source, GenerationSource::Canned);
        assert_eq!(draft.document.title, "奨学金申請 - 申請書ドラフト（テンプレート）");
        assert!(draft.document.content.contains("ケアの倫理"));

        let docs = app.deadlines.deadline_documents(&d.id).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, draft.document.id);
    }

    #[tokio::test]
    async fn test_email_draft_defaults_recipient() {
        let app = offline_app().await;

        let draft = app
            .deadlines
            .draft_email("  ", "締め切り延長のお願い", "体調不良のため", None)
            .await
            .unwrap();

        assert_eq!(draft.document.title, "関係者へのメール（テンプレート）");
        assert!(draft.document.deadline_id.is_none());

        app.deadlines
            .set_document_status(&draft.document.id, DocumentStatus::Review, now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_email_requires_purpose() {
        let app = offline_app().await;
        assert!(matches!(
            app.deadlines.draft_email("先生", " ", "", None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            app.deadlines
                .set_document_status("missing", DocumentStatus::Submitted, now())
                .await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_application_for_unknown_deadline() {
        let app = offline_app().await;
        assert!(matches!(
            app.deadlines.draft_application("missing", None).await,
            Err(AppError::NotFound { .. })
        ));
    }
}

#[cfg(test)]
mod contact_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_emergency_contacts() {
        let app = offline_app().await;

        let empty = app.deadlines.emergency_contacts().await.unwrap();
        assert!(empty.is_empty());
        assert!(empty.message.contains("緊急連絡先が登録されていません"));

        app.deadlines
            .add_emergency_contact(EmergencyContact::new("姉", "090-1234-5678"))
            .await
            .unwrap();

        let listed = app.deadlines.emergency_contacts().await.unwrap();
        assert_eq!(listed.contacts.len(), 1);
        assert!(listed.message.contains("090-1234-5678"));
    }

    #[tokio::test]
    async fn test_emergency_contact_needs_name_and_phone() {
        let app = offline_app().await;
        let err = app
            .deadlines
            .add_emergency_contact(EmergencyContact::new("", ""))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(e) => assert_eq!(e.messages().len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
