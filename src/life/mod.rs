//! Life support: wellbeing logging, crisis assessment, interventions and summaries.

pub mod crisis;
mod intervention;
mod logger;
mod summary;

pub use crisis::{evaluate, CrisisLevel, CrisisReason, CrisisVerdict, ReasonKind};
pub use intervention::fallback_message;
pub use logger::{validate_life_data, LifeLogInput};
pub use summary::{format_daily_summary, format_weekly_summary, WeeklyStats};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::core::ServiceCore;
use crate::error::{AppResult, ValidationError};
use crate::storage::{Intervention, LifeLogEntry, Storage, ThresholdParam, Thresholds};

/// Outcome of one check-in: the stored entry, its verdict and, when in
/// crisis, the intervention that was shown.
#[derive(Debug, Clone)]
pub struct CheckIn {
    pub entry: LifeLogEntry,
    pub verdict: CrisisVerdict,
    pub intervention: Option<Intervention>,
}

/// Life support service.
#[derive(Clone)]
pub struct LifeSupport {
    core: ServiceCore,
}

impl LifeSupport {
    /// Create a new life support service.
    pub fn new(core: ServiceCore) -> Self {
        Self { core }
    }

    /// Evaluate an entry with the stored thresholds and flag it when in crisis.
    ///
    /// Entries without a persisted id are evaluated but not flagged.
    pub async fn assess(&self, entry: &LifeLogEntry) -> AppResult<CrisisVerdict> {
        let thresholds = self.core.storage().get_thresholds().await?;
        let verdict = evaluate(entry, &thresholds);

        if verdict.is_crisis {
            warn!(
                level = verdict.level.as_u8(),
                reasons = verdict.reasons.len(),
                "Crisis detected"
            );
            if let Some(id) = &entry.id {
                self.core.storage().set_crisis_flag(id, true).await?;
            }
        }

        Ok(verdict)
    }

    /// Record, assess and, when in crisis, intervene.
    pub async fn check_in(&self, input: LifeLogInput, today: NaiveDate) -> AppResult<CheckIn> {
        let entry = self.record_life_log(input, today).await?;
        self.follow_up(entry).await
    }

    /// Record a free-text note and run the same follow-up as a check-in.
    pub async fn check_in_note(&self, text: &str, today: NaiveDate) -> AppResult<CheckIn> {
        let entry = self.record_free_note(text, today).await?;
        self.follow_up(entry).await
    }

    async fn follow_up(&self, mut entry: LifeLogEntry) -> AppResult<CheckIn> {
        let verdict = self.assess(&entry).await?;
        entry.crisis_flag = verdict.is_crisis;

        let intervention = if verdict.is_crisis {
            let intervention = self.intervene(&entry, &verdict).await?;
            entry.intervention_given = true;
            Some(intervention)
        } else {
            None
        };

        Ok(CheckIn {
            entry,
            verdict,
            intervention,
        })
    }

    /// Current thresholds.
    pub async fn thresholds(&self) -> AppResult<Thresholds> {
        Ok(self.core.storage().get_thresholds().await?)
    }

    /// Override one threshold; negative or non-finite values are rejected.
    pub async fn set_threshold(&self, param: ThresholdParam, value: f64) -> AppResult<Thresholds> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::field(param.as_str(), "must be a non-negative number").into());
        }

        self.core.storage().set_threshold(param, value).await?;
        info!(param = %param, value, "Threshold updated");
        self.thresholds().await
    }
}
