use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::LifeSupport;
use crate::error::AppResult;
use crate::llm::Generation;
use crate::prompts;
use crate::storage::{LifeLogEntry, Storage};

const NO_LOG_TODAY: &str = "今日の記録はまだありません。";
const NO_LOGS_THIS_WEEK: &str = "過去7日間の記録がありません。";

/// Aggregates over a window of entries. Averages cover present values only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyStats {
    pub entries: usize,
    pub avg_sleep: Option<f64>,
    pub avg_meals: Option<f64>,
    pub avg_stress: Option<f64>,
    pub crisis_count: usize,
}

impl WeeklyStats {
    pub fn from_entries(entries: &[LifeLogEntry]) -> Self {
        fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
            let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            (n > 0).then(|| sum / n as f64)
        }

        Self {
            entries: entries.len(),
            avg_sleep: mean(entries.iter().filter_map(|e| e.sleep_hours)),
            avg_meals: mean(entries.iter().filter_map(|e| e.meal_count.map(f64::from))),
            avg_stress: mean(entries.iter().filter_map(|e| e.stress_score.map(f64::from))),
            crisis_count: entries.iter().filter(|e| e.crisis_flag).count(),
        }
    }
}

fn stress_emoji(score: u8) -> &'static str {
    if score >= 8 {
        "😰"
    } else if score >= 5 {
        "😓"
    } else {
        "😌"
    }
}

fn positive_message(entry: &LifeLogEntry) -> String {
    let mut messages = Vec::new();

    match entry.sleep_hours {
        Some(h) if h >= 6.0 => messages.push("十分な睡眠が取れました。"),
        Some(h) if h >= 3.0 => messages.push("眠れる時間を確保できました。"),
        Some(_) => messages.push("少しでも休めたことは大きな一歩です。"),
        None => {}
    }

    match entry.meal_count {
        Some(m) if m >= 2 => messages.push("食事を取ることができました。"),
        Some(1) => messages.push("何か口にできたこと、それだけでも十分です。"),
        _ => {}
    }

    match entry.stress_score {
        Some(s) if s < 5 => messages.push("比較的穏やかな1日でした。"),
        Some(s) if s < 8 => messages.push("大変な中、よく耐えました。"),
        Some(_) => messages.push("限界の中、ここまで来たこと自体がすごいことです。"),
        None => {}
    }

    if messages.is_empty() {
        return "記録を残してくれて、ありがとう。それだけでも十分な行動です。".to_string();
    }

    format!(
        "{}\n\n今日はこれで生き延びた。それが何よりも大事です。",
        messages.join(" ")
    )
}

/// Daily report for one entry. The verdict is always a pass.
pub fn format_daily_summary(entry: &LifeLogEntry) -> String {
    let mut parts = vec!["🌟 今日の振り返り".to_string(), String::new()];

    if let Some(sleep) = entry.sleep_hours {
        parts.push(format!("😴 睡眠: {}時間", sleep));
    }
    if let Some(meals) = entry.meal_count {
        parts.push(format!("🍽️  食事: {}回", meals));
    }
    if let Some(stress) = entry.stress_score {
        parts.push(format!("{} しんどさ: {}/10", stress_emoji(stress), stress));
    }

    parts.push(String::new());
    parts.push("✅ 判定: 合格".to_string());
    parts.push(String::new());
    parts.push(positive_message(entry));

    parts.join("\n")
}

/// Report over a window of entries; `None` when the window is empty.
pub fn format_weekly_summary(entries: &[LifeLogEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let stats = WeeklyStats::from_entries(entries);
    let mut parts = vec![
        "📊 過去7日間の記録".to_string(),
        String::new(),
        format!("記録日数: {}日", stats.entries),
    ];

    if let Some(avg) = stats.avg_sleep {
        parts.push(format!("平均睡眠: {:.1}時間", avg));
    }
    if let Some(avg) = stats.avg_meals {
        parts.push(format!("平均食事: {:.1}回", avg));
    }
    if let Some(avg) = stats.avg_stress {
        parts.push(format!("平均しんどさ: {:.1}/10", avg));
    }

    parts.push(String::new());
    parts.push(format!("危機介入: {}回", stats.crisis_count));
    parts.push(String::new());

    if stats.crisis_count > 0 {
        parts.push("大変な日々が続いていますが、それでもあなたはここにいる。".to_string());
        parts.push("それ自体が、計り知れない強さです。".to_string());
    } else {
        parts.push("比較的安定した週でした。このペースを無理なく続けられますように。".to_string());
    }

    Some(parts.join("\n"))
}

impl LifeSupport {
    /// Report on today's latest entry.
    pub async fn daily_summary(&self, today: NaiveDate) -> AppResult<String> {
        Ok(match self.core.storage().get_latest_life_log(today).await? {
            Some(entry) => format_daily_summary(&entry),
            None => NO_LOG_TODAY.to_string(),
        })
    }

    /// Model-written summary of today's latest entry.
    pub async fn daily_summary_with_llm(&self, today: NaiveDate) -> AppResult<String> {
        let Some(entry) = self.core.storage().get_latest_life_log(today).await? else {
            return Ok(NO_LOG_TODAY.to_string());
        };

        let request = self.core.pipeline().request(
            prompts::DAILY_SUMMARY_PROMPT,
            prompts::daily_summary_user(&entry),
        );
        let generation = self.core.pipeline().generate(&request).await;
        debug!(source = %generation.source, "Daily summary generated");
        Ok(generation.text)
    }

    /// Report over the last seven days.
    pub async fn weekly_summary(&self, today: NaiveDate) -> AppResult<String> {
        let since = today - Duration::days(7);
        let entries = self.core.storage().get_life_logs_since(since).await?;
        Ok(format_weekly_summary(&entries).unwrap_or_else(|| NO_LOGS_THIS_WEEK.to_string()))
    }

    /// One-shot supportive reply.
    pub async fn chat(&self, message: &str) -> Generation {
        let request = self.core.pipeline().request(prompts::CHAT_PROMPT, message);
        self.core.pipeline().generate(&request).await
    }
}
