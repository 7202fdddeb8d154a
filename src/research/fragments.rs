use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use super::ResearchMemory;
use crate::error::{AppResult, ValidationError};
use crate::storage::{EmotionTag, Fragment, Storage};

const MAX_CONTENT_CHARS: usize = 5000;
const INACTIVITY_DAYS: i64 = 3;

/// A fragment as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentInput {
    pub content: String,
    pub emotion: Option<String>,
    pub context: Option<String>,
}

impl FragmentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Validate a fragment and resolve its emotion tag.
///
/// Every violation is reported together.
pub fn validate_fragment(input: &FragmentInput) -> Result<Option<EmotionTag>, ValidationError> {
    let mut errors = Vec::new();

    if input.content.trim().is_empty() {
        errors.push("内容を入力してください".to_string());
    }
    if input.content.chars().count() > MAX_CONTENT_CHARS {
        errors.push("内容は5000文字以内にしてください".to_string());
    }

    let emotion = match input.emotion.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<EmotionTag>() {
            Ok(tag) => Some(tag),
            Err(_) => {
                errors.push("無効な感情タグです".to_string());
                None
            }
        },
    };

    if errors.is_empty() {
        Ok(emotion)
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

/// Importance assigned when a fragment is recorded, capped at 1.0.
pub fn initial_importance(content: &str, emotion: Option<EmotionTag>) -> f64 {
    let chars = content.chars().count();
    let mut score = 0.5;

    if chars > 100 {
        score += 0.1;
    }
    if chars > 300 {
        score += 0.1;
    }

    match emotion {
        Some(tag) if tag.is_strong() => score += 0.2,
        Some(EmotionTag::Surprise) => score += 0.1,
        _ => {}
    }

    if content.contains('?') || content.contains('？') {
        score += 0.1;
    }

    f64::min(score, 1.0)
}

/// How long it has been since the last fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inactivity {
    pub inactive: bool,
    /// Whole days since the latest fragment; `None` when nothing was recorded.
    pub days: Option<i64>,
    pub message: Option<String>,
    /// When the latest fragment was recorded.
    pub latest: Option<DateTime<Utc>>,
}

impl Inactivity {
    pub fn since(latest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(latest) = latest else {
            return Self {
                inactive: true,
                days: None,
                message: Some("まだ断片が記録されていません".to_string()),
                latest: None,
            };
        };

        let days = (now - latest).num_days();
        if days >= INACTIVITY_DAYS {
            Self {
                inactive: true,
                days: Some(days),
                message: Some(format!(
                    "最後の記録から{}日経過しています。最近、考え事はありますか？",
                    days
                )),
                latest: Some(latest),
            }
        } else {
            Self {
                inactive: false,
                days: Some(days),
                message: None,
                latest: Some(latest),
            }
        }
    }

    /// Whether `now` falls in the first hour after another whole idle day.
    ///
    /// An hourly check sees this exactly once per idle day.
    pub fn is_new_idle_day(&self, now: DateTime<Utc>) -> bool {
        match (self.inactive, self.latest) {
            (true, Some(latest)) => {
                let elapsed = now - latest;
                elapsed - Duration::days(elapsed.num_days()) < Duration::hours(1)
            }
            _ => false,
        }
    }
}

impl ResearchMemory {
    /// Validate and store a fragment.
    pub async fn record_fragment(&self, input: FragmentInput) -> AppResult<Fragment> {
        let emotion = validate_fragment(&input)?;

        let content = input.content.trim().to_string();
        let mut fragment = Fragment::new(content);
        fragment.emotion_tag = emotion;
        fragment.context = input.context.filter(|c| !c.trim().is_empty());
        fragment.importance_score = initial_importance(&fragment.content, emotion);

        self.core.storage().create_fragment(&fragment).await?;
        info!(
            fragment_id = %fragment.id,
            importance = fragment.importance_score,
            "Fragment recorded"
        );
        Ok(fragment)
    }

    /// Most recent fragments.
    pub async fn recent_fragments(&self, limit: u32) -> AppResult<Vec<Fragment>> {
        Ok(self.core.storage().list_recent_fragments(limit).await?)
    }

    /// Fragments containing a keyword, most important first.
    pub async fn search_fragments(&self, keyword: &str) -> AppResult<Vec<Fragment>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ValidationError::field("keyword", "cannot be empty").into());
        }
        Ok(self.core.storage().search_fragments(keyword).await?)
    }

    /// Fragments recorded with a given emotion.
    pub async fn fragments_by_emotion(&self, emotion: EmotionTag) -> AppResult<Vec<Fragment>> {
        Ok(self.core.storage().list_fragments_by_emotion(emotion).await?)
    }

    /// Check whether fragment recording has stalled.
    pub async fn check_inactivity(&self, now: DateTime<Utc>) -> AppResult<Inactivity> {
        let latest = self.core.storage().list_recent_fragments(1).await?;
        Ok(Inactivity::since(latest.first().map(|f| f.created_at), now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_japanese_emotion() {
        let input = FragmentInput::new("なぜ制度はこうなのか").with_emotion("違和感");
        assert_eq!(validate_fragment(&input).unwrap(), Some(EmotionTag::Discomfort));

        let input = FragmentInput::new("メモ").with_emotion("joy");
        assert_eq!(validate_fragment(&input).unwrap(), Some(EmotionTag::Joy));
    }

    #[test]
    fn test_validate_collects_errors() {
        let input = FragmentInput::new("   ").with_emotion("boredom");
        let err = validate_fragment(&input).unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["内容を入力してください".to_string(), "無効な感情タグです".to_string()]
        );
    }

    #[test]
    fn test_validate_length_counts_chars() {
        let exactly = "あ".repeat(5000);
        assert!(validate_fragment(&FragmentInput::new(exactly)).is_ok());
        let over = "あ".repeat(5001);
        assert!(validate_fragment(&FragmentInput::new(over)).is_err());
    }

    #[test]
    fn test_importance_rules() {
        assert_eq!(initial_importance("短い", None), 0.5);
        assert!((initial_importance("なぜ？", Some(EmotionTag::Surprise)) - 0.7).abs() < 1e-9);

        let long = "長".repeat(301);
        let score = initial_importance(&format!("{}?", long), Some(EmotionTag::Anger));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_inactivity() {
        let now = Utc::now();
        assert!(Inactivity::since(None, now).inactive);

        let recent = Inactivity::since(Some(now - Duration::hours(30)), now);
        assert!(!recent.inactive);
        assert_eq!(recent.days, Some(1));

        let stale = Inactivity::since(Some(now - Duration::days(4)), now);
        assert!(stale.inactive);
        assert_eq!(
            stale.message.as_deref(),
            Some("最後の記録から4日経過しています。最近、考え事はありますか？")
        );
    }

    #[test]
    fn test_new_idle_day_once_per_day() {
        let latest = Utc::now();
        let at = |offset: Duration| {
            let now = latest + offset;
            Inactivity::since(Some(latest), now).is_new_idle_day(now)
        };

        assert!(!at(Duration::days(2) + Duration::minutes(10)));
        assert!(at(Duration::days(3) + Duration::minutes(10)));
        assert!(!at(Duration::days(3) + Duration::hours(1)));
        assert!(!at(Duration::days(3) + Duration::hours(5)));
        assert!(at(Duration::days(4) + Duration::minutes(59)));
        assert!(!Inactivity::since(None, latest).is_new_idle_day(latest));
    }
}
