use chrono::NaiveDate;
use tracing::info;

use super::LifeSupport;
use crate::error::{AppResult, ValidationError};
use crate::storage::{LifeLogEntry, Storage};

/// Raw check-in values as typed by the user, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifeLogInput {
    pub sleep_hours: Option<f64>,
    pub meal_count: Option<i64>,
    pub stress_score: Option<i64>,
    pub free_text: Option<String>,
}

/// Check ranges: sleep 0-24, meals 0-10, stress 0-10.
///
/// Every violation is reported in one `ValidationError::Multiple`.
pub fn validate_life_data(input: &LifeLogInput) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if let Some(sleep) = input.sleep_hours {
        if !(0.0..=24.0).contains(&sleep) {
            errors.push("睡眠時間は0〜24時間の範囲で入力してください".to_string());
        }
    }

    if let Some(meals) = input.meal_count {
        if !(0..=10).contains(&meals) {
            errors.push("食事回数は0〜10の範囲で入力してください".to_string());
        }
    }

    if let Some(stress) = input.stress_score {
        if !(0..=10).contains(&stress) {
            errors.push("しんどさスコアは0〜10の範囲で入力してください".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

impl LifeLogInput {
    /// Validate and convert into an unsaved entry.
    pub fn into_entry(self, log_date: NaiveDate) -> Result<LifeLogEntry, ValidationError> {
        validate_life_data(&self)?;

        let mut entry = LifeLogEntry::new(log_date);
        entry.sleep_hours = self.sleep_hours;
        entry.meal_count = self.meal_count.and_then(|m| u32::try_from(m).ok());
        entry.stress_score = self.stress_score.and_then(|s| u8::try_from(s).ok());
        entry.free_text = self.free_text.filter(|t| !t.trim().is_empty());
        Ok(entry)
    }
}

impl LifeSupport {
    /// Validate and store a check-in for `today`. Nothing is stored on error.
    pub async fn record_life_log(
        &self,
        input: LifeLogInput,
        today: NaiveDate,
    ) -> AppResult<LifeLogEntry> {
        let entry = input.into_entry(today)?;
        let stored = self.core.storage().create_life_log(&entry).await?;

        info!(
            log_id = stored.id.as_deref().unwrap_or_default(),
            date = %today,
            "Life log recorded"
        );
        Ok(stored)
    }

    /// Store a note as a new entry that carries today's latest numeric values.
    pub async fn record_free_note(&self, text: &str, today: NaiveDate) -> AppResult<LifeLogEntry> {
        if text.trim().is_empty() {
            return Err(ValidationError::field("free_text", "cannot be empty").into());
        }

        let latest = self.core.storage().get_latest_life_log(today).await?;
        let mut entry = LifeLogEntry::new(today).with_free_text(text.trim());
        if let Some(latest) = latest {
            entry.sleep_hours = latest.sleep_hours;
            entry.meal_count = latest.meal_count;
            entry.stress_score = latest.stress_score;
        }

        let stored = self.core.storage().create_life_log(&entry).await?;
        info!(
            log_id = stored.id.as_deref().unwrap_or_default(),
            "Free note recorded"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_input_passes() {
        let input = LifeLogInput {
            sleep_hours: Some(7.5),
            meal_count: Some(3),
            stress_score: Some(10),
            free_text: None,
        };
        assert!(validate_life_data(&input).is_ok());
        assert!(validate_life_data(&LifeLogInput::default()).is_ok());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let input = LifeLogInput {
            sleep_hours: Some(25.0),
            meal_count: Some(-1),
            stress_score: Some(11),
            free_text: None,
        };
        let err = validate_life_data(&input).unwrap_err();
        assert_eq!(err.messages().len(), 3);
    }

    #[test]
    fn test_nan_sleep_is_rejected() {
        let input = LifeLogInput {
            sleep_hours: Some(f64::NAN),
            ..Default::default()
        };
        assert!(validate_life_data(&input).is_err());
    }

    #[test]
    fn test_into_entry_drops_blank_text() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let entry = LifeLogInput {
            stress_score: Some(4),
            free_text: Some("   ".to_string()),
            ..Default::default()
        }
        .into_entry(day)
        .unwrap();
        assert_eq!(entry.stress_score, Some(4));
        assert!(entry.free_text.is_none());
        assert!(entry.id.is_none());
    }
}
