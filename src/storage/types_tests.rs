//! Unit tests for storage types and builder patterns.

use super::*;
use chrono::TimeZone;

// ============================================================================
// Life log tests
// ============================================================================

#[test]
fn test_life_log_new_is_unsaved() {
    let day = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    let entry = LifeLogEntry::new(day)
        .with_sleep_hours(6.5)
        .with_meal_count(2)
        .with_stress_score(4)
        .with_free_text("まあまあ");

    assert!(entry.id.is_none());
    assert_eq!(entry.log_date, day);
    assert_eq!(entry.sleep_hours, Some(6.5));
    assert_eq!(entry.meal_count, Some(2));
    assert_eq!(entry.stress_score, Some(4));
    assert!(!entry.crisis_flag);
    assert!(!entry.intervention_given);
}

#[test]
fn test_threshold_defaults() {
    let t = Thresholds::default();
    assert_eq!(t.stress_score, 8.0);
    assert_eq!(t.meal_count, 0.0);
    assert_eq!(t.sleep_hours, 3.0);
}

#[test]
fn test_threshold_param_parse() {
    assert_eq!("stress".parse::<ThresholdParam>().unwrap(), ThresholdParam::StressScore);
    assert_eq!("meal-count".parse::<ThresholdParam>().unwrap(), ThresholdParam::MealCount);
    assert_eq!("SLEEP_HOURS".parse::<ThresholdParam>().unwrap(), ThresholdParam::SleepHours);
    assert!("mood".parse::<ThresholdParam>().is_err());
}

// ============================================================================
// Deadline tests
// ============================================================================

#[test]
fn test_deadline_builder() {
    let due = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let d = Deadline::new("JASSO", due)
        .with_category(DeadlineCategory::Scholarship)
        .with_status(DeadlineStatus::InProgress)
        .with_description("継続申請");

    assert!(!d.id.is_empty());
    assert_eq!(d.category, DeadlineCategory::Scholarship);
    assert_eq!(d.status, DeadlineStatus::InProgress);
    assert_eq!(d.priority_score, 0.0);
    assert!(d.completed_at.is_none());
}

#[test]
fn test_deadline_category_lenient_parse() {
    assert_eq!(DeadlineCategory::parse_lenient("grant"), DeadlineCategory::Grant);
    assert_eq!(DeadlineCategory::parse_lenient("party"), DeadlineCategory::Other);
    assert_eq!(DeadlineCategory::Meeting.display_name(), "打ち合わせ");
}

#[test]
fn test_deadline_status_open() {
    assert!(DeadlineStatus::Pending.is_open());
    assert!(DeadlineStatus::InProgress.is_open());
    assert!(!DeadlineStatus::Completed.is_open());
    assert!(!DeadlineStatus::Cancelled.is_open());
    assert_eq!("in_progress".parse::<DeadlineStatus>().unwrap(), DeadlineStatus::InProgress);
}

#[test]
fn test_deadline_serialization() {
    let due = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let d = Deadline::new("report", due).with_category(DeadlineCategory::Report);
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["category"], "report");
    assert_eq!(json["status"], "pending");
}

// ============================================================================
// Research memory tests
// ============================================================================

#[test]
fn test_emotion_tag_names() {
    assert_eq!(EmotionTag::Anger.as_str(), "anger");
    assert_eq!(EmotionTag::Discomfort.display_name(), "違和感");
    assert_eq!("驚き".parse::<EmotionTag>().unwrap(), EmotionTag::Surprise);
    assert_eq!("Joy".parse::<EmotionTag>().unwrap(), EmotionTag::Joy);
    assert!("boredom".parse::<EmotionTag>().is_err());
}

#[test]
fn test_emotion_tag_strong() {
    assert!(EmotionTag::Anger.is_strong());
    assert!(EmotionTag::Discomfort.is_strong());
    assert!(!EmotionTag::Surprise.is_strong());
    assert!(!EmotionTag::Neutral.is_strong());
}

#[test]
fn test_fragment_builder() {
    let f = Fragment::new("なぜ評価指標はこうなのか")
        .with_emotion(EmotionTag::Discomfort)
        .with_context("ゼミ");
    assert_eq!(f.source_type, "manual");
    assert_eq!(f.importance_score, 0.5);
    assert_eq!(f.emotion_tag, Some(EmotionTag::Discomfort));
    assert_eq!(f.context.as_deref(), Some("ゼミ"));
}

#[test]
fn test_core_theme_new() {
    let theme = CoreTheme::new("評価の公平性", "説明")
        .with_fragments(vec!["a".into(), "b".into()])
        .with_importance(0.7);
    assert_eq!(theme.frequency, 1);
    assert!(theme.is_active);
    assert!(theme.last_shown.is_none());
    assert_eq!(theme.fragment_ids.len(), 2);
    assert_eq!(theme.first_appeared, theme.last_updated);
}

#[test]
fn test_snapshot_type_parse() {
    assert_eq!("paper-background".parse::<SnapshotType>().unwrap(), SnapshotType::PaperBackground);
    assert_eq!("grant".parse::<SnapshotType>().unwrap(), SnapshotType::GrantProposal);
    assert_eq!(SnapshotType::Summary.display_name(), "要約");
    assert!("essay".parse::<SnapshotType>().is_err());
}

#[test]
fn test_tag_kind_roundtrip_names() {
    for kind in [TagKind::Concept, TagKind::Question, TagKind::KeyPhrase, TagKind::Analyzed] {
        assert_eq!(kind.as_str().parse::<TagKind>().unwrap(), kind);
    }
}

#[test]
fn test_timestamp_encoding_sorts_lexically() {
    let a = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(5);
    let (ea, eb) = (encode_timestamp(&a), encode_timestamp(&b));
    assert!(ea < eb);
    assert_eq!(ea.len(), eb.len());
    assert_eq!(decode_timestamp(&ea), a);
}
