use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::notifier::{Notification, Notifier};
use super::Trigger;
use crate::app::AppState;
use crate::error::AppResult;
use crate::storage::Storage;

/// What a single job run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobReport {
    /// Notification sent, if any.
    pub notification: Option<Notification>,
    /// Short human-readable outcome.
    pub detail: String,
}

impl JobReport {
    fn quiet(detail: impl Into<String>) -> Self {
        Self {
            notification: None,
            detail: detail.into(),
        }
    }

    fn notified(notification: Notification, detail: impl Into<String>) -> Self {
        Self {
            notification: Some(notification),
            detail: detail.into(),
        }
    }
}

/// Run the job behind `trigger` once.
pub async fn run_job(
    trigger: Trigger,
    state: &AppState,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> AppResult<JobReport> {
    debug!(trigger = trigger.as_str(), "Running scheduled job");

    let report = match trigger {
        Trigger::MorningQuestion => morning_question(state, notifier, now).await?,
        Trigger::EveningCheckIn => evening_check_in(state, notifier, today).await?,
        Trigger::ThemeUpdate => theme_update(state, now).await?,
        Trigger::InactivityCheck => inactivity_check(state, notifier, now).await?,
    };

    info!(
        trigger = trigger.as_str(),
        notified = report.notification.is_some(),
        detail = %report.detail,
        "Scheduled job finished"
    );
    Ok(report)
}

async fn morning_question(
    state: &AppState,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> AppResult<JobReport> {
    let question = state.research.todays_question(now).await?;

    let Some(theme) = question.theme else {
        return Ok(JobReport::quiet("no active themes"));
    };

    let notification = Notification::new("🌟 ARC - 今日の問い", theme.name.clone());
    notifier.notify(&notification)?;
    Ok(JobReport::notified(notification, format!("theme {}", theme.id)))
}

async fn evening_check_in(
    state: &AppState,
    notifier: &dyn Notifier,
    today: NaiveDate,
) -> AppResult<JobReport> {
    if state.storage.get_latest_life_log(today).await?.is_some() {
        return Ok(JobReport::quiet("already logged today"));
    }

    let notification = Notification::new("💙 ARC - 体調確認", "今日の体調を記録しませんか？");
    notifier.notify(&notification)?;
    Ok(JobReport::notified(notification, "no log today"))
}

async fn theme_update(state: &AppState, now: DateTime<Utc>) -> AppResult<JobReport> {
    let outcome = state.research.identify_themes(now).await?;
    Ok(JobReport::quiet(format!(
        "{} created, {} updated from {} fragments",
        outcome.created.len(),
        outcome.updated.len(),
        outcome.fragments_considered
    )))
}

async fn inactivity_check(
    state: &AppState,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> AppResult<JobReport> {
    let inactivity = state.research.check_inactivity(now).await?;
    let new_day = inactivity.is_new_idle_day(now);

    match (new_day, inactivity.days, inactivity.message) {
        (true, Some(days), Some(message)) => {
            let notification = Notification::new("🔥 ARC - 思考の記録", message);
            notifier.notify(&notification)?;
            Ok(JobReport::notified(notification, format!("idle for {} days", days)))
        }
        (_, days, _) => Ok(JobReport::quiet(match days {
            Some(days) => format!("last fragment {} days ago", days),
            None => "no fragments yet".to_string(),
        })),
    }
}
