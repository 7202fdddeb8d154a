//! Background triggers.
//!
//! Each [`Trigger`] runs in its own tokio task on a fixed wall-clock
//! [`Schedule`]. A failing or panicking job is logged and the loop waits
//! for its next firing time.

mod jobs;
mod notifier;
mod schedule;

pub use jobs::{run_job, JobReport};
pub use notifier::{Notification, Notifier, TracingNotifier};
pub use schedule::Schedule;

#[cfg(test)]
pub use notifier::MockNotifier;

use std::sync::Arc;

use chrono::{Local, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::error::AppResult;

/// The four scheduled jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Daily 09:00: remind the user of today's question.
    MorningQuestion,
    /// Daily 22:00: nudge when nothing was logged today.
    EveningCheckIn,
    /// Daily 23:00: re-identify core themes.
    ThemeUpdate,
    /// Hourly: nudge after several idle days without fragments.
    InactivityCheck,
}

impl Trigger {
    /// Every trigger, in firing order within a day.
    pub const ALL: [Trigger; 4] = [
        Trigger::MorningQuestion,
        Trigger::EveningCheckIn,
        Trigger::ThemeUpdate,
        Trigger::InactivityCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::MorningQuestion => "morning_question",
            Trigger::EveningCheckIn => "evening_check_in",
            Trigger::ThemeUpdate => "theme_update",
            Trigger::InactivityCheck => "inactivity_check",
        }
    }

    pub fn schedule(&self) -> Schedule {
        match self {
            Trigger::MorningQuestion => Schedule::Daily { hour: 9, minute: 0 },
            Trigger::EveningCheckIn => Schedule::Daily { hour: 22, minute: 0 },
            Trigger::ThemeUpdate => Schedule::Daily { hour: 23, minute: 0 },
            Trigger::InactivityCheck => Schedule::Hourly { minute: 0 },
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "morning_question" | "morning" => Ok(Trigger::MorningQuestion),
            "evening_check_in" | "evening" => Ok(Trigger::EveningCheckIn),
            "theme_update" | "themes" => Ok(Trigger::ThemeUpdate),
            "inactivity_check" | "inactivity" => Ok(Trigger::InactivityCheck),
            _ => Err(format!("Unknown trigger: {}", s)),
        }
    }
}

/// Owns the trigger loops.
pub struct Scheduler {
    state: Arc<AppState>,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(state: Arc<AppState>, notifier: Arc<dyn Notifier>) -> Self {
        Self { state, notifier }
    }

    /// Run one trigger's job now.
    pub async fn run_once(&self, trigger: Trigger) -> AppResult<JobReport> {
        run_job(
            trigger,
            &self.state,
            self.notifier.as_ref(),
            Utc::now(),
            Local::now().date_naive(),
        )
        .await
    }

    /// Start one loop per trigger.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        Trigger::ALL
            .iter()
            .map(|&trigger| {
                let state = Arc::clone(&self.state);
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(trigger_loop(trigger, state, notifier))
            })
            .collect()
    }

    /// Run every trigger until Ctrl-C.
    pub async fn run(&self) -> AppResult<()> {
        let handles = self.spawn();
        for trigger in Trigger::ALL {
            info!(trigger = trigger.as_str(), schedule = %trigger.schedule(), "Trigger scheduled");
        }

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }

        info!("Scheduler shutting down");
        for handle in handles {
            handle.abort();
        }
        Ok(())
    }
}

async fn trigger_loop(trigger: Trigger, state: Arc<AppState>, notifier: Arc<dyn Notifier>) {
    let schedule = trigger.schedule();

    loop {
        let now = Local::now().naive_local();
        let next = schedule.next_fire(now);
        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        // Inner task so a panic in the job surfaces as a JoinError here.
        let job_state = Arc::clone(&state);
        let job_notifier = Arc::clone(&notifier);
        let job = tokio::spawn(async move {
            run_job(
                trigger,
                &job_state,
                job_notifier.as_ref(),
                Utc::now(),
                Local::now().date_naive(),
            )
            .await
        });

        match job.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!(trigger = trigger.as_str(), error = %e, "Scheduled job failed");
            }
            Err(e) => {
                warn!(trigger = trigger.as_str(), error = %e, "Scheduled job aborted");
            }
        }
    }
}
