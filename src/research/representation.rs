use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ResearchMemory, RECENT_WINDOW};
use crate::error::{AppError, AppResult};
use crate::storage::{CoreTheme, Storage};

const NO_QUESTION: &str = "今日の問いはまだありません。\n思考の断片を記録し始めてみませんか？";
const NO_THEMES_THIS_WEEK: &str = "この週はまだテーマが特定されていません。";
const REVIEW_THEMES: usize = 3;
const TEMPLATE_COUNT: usize = 3;

/// User reaction to a re-presented theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeFeedback {
    /// Keep the theme.
    StillImportant,
    /// Archive the theme.
    NotAnymore,
    /// The user wants a draft for it.
    WantToWrite,
}

impl ThemeFeedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeFeedback::StillImportant => "still_important",
            ThemeFeedback::NotAnymore => "not_anymore",
            ThemeFeedback::WantToWrite => "want_to_write",
        }
    }
}

impl std::fmt::Display for ThemeFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThemeFeedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "still_important" => Ok(ThemeFeedback::StillImportant),
            "not_anymore" => Ok(ThemeFeedback::NotAnymore),
            "want_to_write" => Ok(ThemeFeedback::WantToWrite),
            _ => Err(format!("Unknown feedback: {}", s)),
        }
    }
}

fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_days()
}

/// Pick the theme to show today.
///
/// Never-shown themes come first; among the rest the higher
/// `importance - days_since_shown * 0.1` wins. Ties keep input order.
pub fn rank_for_today(themes: &[CoreTheme], now: DateTime<Utc>) -> Option<&CoreTheme> {
    let key = |t: &CoreTheme| match t.last_shown {
        None => (true, t.importance_score),
        Some(shown) => (false, t.importance_score - days_since(shown, now) as f64 * 0.1),
    };

    themes.iter().fold(None, |best, theme| match best {
        None => Some(theme),
        Some(current) => {
            let (cur_new, cur_score) = key(current);
            let (new, score) = key(theme);
            if (new && !cur_new) || (new == cur_new && score > cur_score) {
                Some(theme)
            } else {
                Some(current)
            }
        }
    })
}

/// One of the re-presentation templates; `variant` wraps around.
pub fn question_message(theme: &CoreTheme, variant: usize) -> String {
    let (header, closing) = match variant % TEMPLATE_COUNT {
        0 => ("🌟 今日の問い", "これ、まだあなたにとって大事ですか？"),
        1 => ("💭 あなたの核", "この問い、まだ燃えてますか？"),
        _ => ("🔥 忘れないで", "これ、明文化しておきたい？"),
    };
    format!(
        "{}\n\n「{}」\n\n{}\n\n{}",
        header, theme.name, theme.description, closing
    )
}

/// Today's question, if any theme exists.
#[derive(Debug, Clone, Serialize)]
pub struct TodaysQuestion {
    pub theme: Option<CoreTheme>,
    pub message: String,
}

/// Summary of the current top themes.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReview {
    pub top_themes: Vec<CoreTheme>,
    pub fragments_count: usize,
    pub summary: String,
}

fn format_review(top_themes: &[CoreTheme], fragments_count: usize) -> String {
    let mut parts = vec!["📊 この週の核心テーマ\n".to_string()];

    for (idx, theme) in top_themes.iter().enumerate() {
        parts.push(format!("{}. {}", idx + 1, theme.name));
        parts.push(format!("   {}", theme.description));
        parts.push(format!("   (関連断片: {}件)\n", theme.fragment_ids.len()));
    }

    parts.push(format!(
        "\n合計 {} 個の思考の断片を記録しました。",
        fragments_count
    ));
    parts.push("よくここまで考え続けてくれました。".to_string());
    parts.join("\n")
}

impl ResearchMemory {
    /// Select today's question and stamp it as shown.
    pub async fn todays_question(&self, now: DateTime<Utc>) -> AppResult<TodaysQuestion> {
        let themes = self.core.storage().list_active_themes().await?;

        let Some(theme) = rank_for_today(&themes, now).cloned() else {
            return Ok(TodaysQuestion {
                theme: None,
                message: NO_QUESTION.to_string(),
            });
        };

        self.core.storage().mark_theme_shown(&theme.id, now).await?;
        let variant = rand::thread_rng().gen_range(0..TEMPLATE_COUNT);
        info!(theme_id = %theme.id, "Question of the day selected");

        Ok(TodaysQuestion {
            message: question_message(&theme, variant),
            theme: Some(CoreTheme {
                last_shown: Some(now),
                ..theme
            }),
        })
    }

    /// Review of the top three themes.
    pub async fn weekly_review(&self) -> AppResult<WeeklyReview> {
        let mut themes = self.core.storage().list_active_themes().await?;
        let fragments_count = self
            .core
            .storage()
            .list_recent_fragments(RECENT_WINDOW)
            .await?
            .len();

        if themes.is_empty() {
            return Ok(WeeklyReview {
                top_themes: Vec::new(),
                fragments_count,
                summary: NO_THEMES_THIS_WEEK.to_string(),
            });
        }

        themes.sort_by(|a, b| b.importance_score.total_cmp(&a.importance_score));
        themes.truncate(REVIEW_THEMES);

        Ok(WeeklyReview {
            summary: format_review(&themes, fragments_count),
            top_themes: themes,
            fragments_count,
        })
    }

    /// Record feedback on a theme and return the reply to show.
    pub async fn record_feedback(&self, theme_id: &str, feedback: ThemeFeedback) -> AppResult<String> {
        if self.core.storage().get_theme(theme_id).await?.is_none() {
            return Err(AppError::NotFound {
                entity: "theme",
                id: theme_id.to_string(),
            });
        }

        info!(theme_id = %theme_id, feedback = %feedback, "Theme feedback recorded");

        Ok(match feedback {
            ThemeFeedback::NotAnymore => {
                self.core.storage().deactivate_theme(theme_id).await?;
                "このテーマをアーカイブしました。".to_string()
            }
            ThemeFeedback::WantToWrite => format!(
                "`arc snapshot --theme {}` でドラフトを作成できます。",
                theme_id
            ),
            ThemeFeedback::StillImportant => "フィードバックを記録しました。".to_string(),
        })
    }
}
