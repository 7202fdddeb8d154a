//! Threshold and keyword crisis evaluation.
//!
//! [`evaluate`] is pure: it reads nothing but its arguments. Flagging the
//! stored entry is done by `LifeSupport::assess`.

use serde::{Deserialize, Serialize};

use crate::storage::{LifeLogEntry, Thresholds};

/// Free-text phrases that force the highest level, in scan order.
pub const DANGER_KEYWORDS: [&str; 6] = ["無理", "死", "つらい", "限界", "消えたい", "終わりたい"];

/// Stress at or above this is escalated to [`CrisisLevel::High`].
const SEVERE_STRESS: u8 = 9;

/// Severity of a crisis verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CrisisLevel {
    /// 通常
    #[default]
    Normal = 0,
    /// 軽度の注意
    Low = 1,
    /// 中度の警戒
    Medium = 2,
    /// 高度な警戒
    High = 3,
}

impl CrisisLevel {
    /// Numeric level (0-3).
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Japanese description.
    pub fn description(self) -> &'static str {
        match self {
            CrisisLevel::Normal => "通常",
            CrisisLevel::Low => "軽度の注意",
            CrisisLevel::Medium => "中度の警戒",
            CrisisLevel::High => "高度な警戒",
        }
    }
}

impl From<CrisisLevel> for u8 {
    fn from(level: CrisisLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for CrisisLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CrisisLevel::Normal),
            1 => Ok(CrisisLevel::Low),
            2 => Ok(CrisisLevel::Medium),
            3 => Ok(CrisisLevel::High),
            other => Err(format!("Crisis level out of range: {}", other)),
        }
    }
}

impl std::fmt::Display for CrisisLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_u8(), self.description())
    }
}

/// Rule that fired, with the values it compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReasonKind {
    StressScore { value: u8, threshold: f64 },
    MealCount { value: u32, threshold: f64 },
    SleepHours { value: f64, threshold: f64 },
    KeywordDetected { keyword: String },
}

/// One fired rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisReason {
    #[serde(flatten)]
    pub kind: ReasonKind,
    pub message: String,
}

/// Result of evaluating one entry. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisVerdict {
    pub is_crisis: bool,
    pub level: CrisisLevel,
    pub reasons: Vec<CrisisReason>,
}

impl CrisisVerdict {
    /// A verdict with no fired rules.
    pub fn normal() -> Self {
        Self {
            is_crisis: false,
            level: CrisisLevel::Normal,
            reasons: Vec::new(),
        }
    }

    /// First fired keyword, if any.
    pub fn keyword(&self) -> Option<&str> {
        self.reasons.iter().find_map(|r| match &r.kind {
            ReasonKind::KeywordDetected { keyword } => Some(keyword.as_str()),
            _ => None,
        })
    }
}

/// Evaluate an entry against thresholds.
///
/// Missing fields are skipped. The overall level is the maximum over fired
/// rules and `is_crisis` is true iff at least one rule fired.
pub fn evaluate(entry: &LifeLogEntry, thresholds: &Thresholds) -> CrisisVerdict {
    let mut reasons = Vec::new();
    let mut level = CrisisLevel::Normal;

    if let Some(stress) = entry.stress_score {
        if f64::from(stress) >= thresholds.stress_score {
            reasons.push(CrisisReason {
                kind: ReasonKind::StressScore {
                    value: stress,
                    threshold: thresholds.stress_score,
                },
                message: "しんどさスコアが高い状態です".to_string(),
            });
            let fired = if stress >= SEVERE_STRESS {
                CrisisLevel::High
            } else {
                CrisisLevel::Medium
            };
            level = level.max(fired);
        }
    }

    if let Some(meals) = entry.meal_count {
        if f64::from(meals) <= thresholds.meal_count {
            reasons.push(CrisisReason {
                kind: ReasonKind::MealCount {
                    value: meals,
                    threshold: thresholds.meal_count,
                },
                message: "食事が取れていない状態です".to_string(),
            });
            level = level.max(CrisisLevel::Medium);
        }
    }

    if let Some(sleep) = entry.sleep_hours {
        if sleep <= thresholds.sleep_hours {
            reasons.push(CrisisReason {
                kind: ReasonKind::SleepHours {
                    value: sleep,
                    threshold: thresholds.sleep_hours,
                },
                message: "睡眠が十分に取れていない状態です".to_string(),
            });
            level = level.max(CrisisLevel::Medium);
        }
    }

    if let Some(keyword) = entry.free_text.as_deref().and_then(find_danger_keyword) {
        reasons.push(CrisisReason {
            kind: ReasonKind::KeywordDetected {
                keyword: keyword.to_string(),
            },
            message: format!("危機キーワード「{}」が検出されました", keyword),
        });
        level = CrisisLevel::High;
    }

    CrisisVerdict {
        is_crisis: !reasons.is_empty(),
        level,
        reasons,
    }
}

/// First danger keyword (in list order) contained in the text.
pub fn find_danger_keyword(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    DANGER_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry() -> LifeLogEntry {
        LifeLogEntry::new(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
    }

    #[test]
    fn test_high_stress_is_level_three() {
        let verdict = evaluate(&entry().with_stress_score(9), &Thresholds::default());
        assert!(verdict.is_crisis);
        assert_eq!(verdict.level, CrisisLevel::High);
        assert_eq!(verdict.reasons.len(), 1);
    }

    #[test]
    fn test_threshold_stress_is_level_two() {
        let verdict = evaluate(&entry().with_stress_score(8), &Thresholds::default());
        assert_eq!(verdict.level, CrisisLevel::Medium);
    }

    #[test]
    fn test_calm_day_is_normal() {
        let e = entry()
            .with_stress_score(5)
            .with_meal_count(2)
            .with_sleep_hours(7.0)
            .with_free_text("今日は元気");
        let verdict = evaluate(&e, &Thresholds::default());
        assert_eq!(verdict, CrisisVerdict::normal());
    }

    #[test]
    fn test_meal_and_sleep_rules() {
        let e = entry().with_meal_count(0).with_sleep_hours(3.0);
        let verdict = evaluate(&e, &Thresholds::default());
        assert_eq!(verdict.level, CrisisLevel::Medium);
        assert_eq!(verdict.reasons.len(), 2);
        assert!(matches!(verdict.reasons[0].kind, ReasonKind::MealCount { value: 0, .. }));
        assert!(matches!(verdict.reasons[1].kind, ReasonKind::SleepHours { .. }));
    }

    #[test]
    fn test_first_keyword_wins_and_stops() {
        let e = entry().with_free_text("もう限界、無理");
        let verdict = evaluate(&e, &Thresholds::default());
        assert_eq!(verdict.level, CrisisLevel::High);
        assert_eq!(verdict.reasons.len(), 1);
        assert_eq!(verdict.keyword(), Some("無理"));
    }

    fn fixed_contexts() -> Vec<LifeLogEntry> {
        let mut contexts = Vec::new();
        for meals in [None, Some(0), Some(3)] {
            for sleep in [None, Some(2.0), Some(8.0)] {
                for text in [None, Some("今日は元気"), Some("少し疲れた")] {
                    let mut e = entry();
                    e.meal_count = meals;
                    e.sleep_hours = sleep;
                    e.free_text = text.map(str::to_string);
                    contexts.push(e);
                }
            }
        }
        contexts
    }

    #[test]
    fn test_level_never_drops_as_stress_rises() {
        let thresholds = Thresholds::default();
        for base in fixed_contexts() {
            let mut previous = CrisisLevel::Normal;
            for stress in 0..=10 {
                let level = evaluate(&base.clone().with_stress_score(stress), &thresholds).level;
                assert!(level >= previous, "stress {} lowered level for {:?}", stress, base);
                previous = level;
            }
        }
    }

    #[test]
    fn test_limit_keyword_is_always_high() {
        let thresholds = Thresholds::default();
        for base in fixed_contexts() {
            for stress in [None, Some(0), Some(5), Some(10)] {
                let mut e = base.clone().with_free_text("今日はもう限界かも");
                e.stress_score = stress;
                assert_eq!(evaluate(&e, &thresholds).level, CrisisLevel::High);
            }
        }
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let verdict = evaluate(&entry(), &Thresholds::default());
        assert!(!verdict.is_crisis);
    }

    #[test]
    fn test_reason_serialization_is_tagged() {
        let verdict = evaluate(&entry().with_stress_score(10), &Thresholds::default());
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["level"], 3);
        assert_eq!(json["reasons"][0]["type"], "stress_score");
        assert_eq!(json["reasons"][0]["value"], 10);
        assert_eq!(json["reasons"][0]["threshold"], 8.0);
    }

    #[test]
    fn test_level_descriptions() {
        assert_eq!(CrisisLevel::Normal.description(), "通常");
        assert_eq!(CrisisLevel::Low.description(), "軽度の注意");
        assert_eq!(CrisisLevel::Medium.description(), "中度の警戒");
        assert_eq!(CrisisLevel::High.description(), "高度な警戒");
        assert!(CrisisLevel::try_from(4).is_err());
    }
}
