use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::priority::{self, DeadlineStats, TodayFocus};
use super::{not_found, DeadlineService};
use crate::error::{AppError, AppResult, ValidationError};
use crate::storage::{Deadline, DeadlineStatus, Storage};

impl DeadlineService {
    /// Store a new deadline and rescore every open one.
    pub async fn add_deadline(&self, deadline: Deadline, now: DateTime<Utc>) -> AppResult<Deadline> {
        if deadline.title.trim().is_empty() {
            return Err(ValidationError::field("title", "cannot be empty").into());
        }

        self.core.storage().create_deadline(&deadline).await?;
        info!(
            deadline_id = %deadline.id,
            category = deadline.category.as_str(),
            due = %deadline.due_date,
            "Deadline added"
        );

        self.recompute_priorities(now).await?;
        self.get_deadline(&deadline.id).await
    }

    /// Fetch a deadline or fail with `NotFound`.
    pub async fn get_deadline(&self, id: &str) -> AppResult<Deadline> {
        self.core
            .storage()
            .get_deadline(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "deadline",
                id: id.to_string(),
            })
    }

    /// Mark a deadline in progress.
    pub async fn start_deadline(&self, id: &str, now: DateTime<Utc>) -> AppResult<Deadline> {
        self.set_status(id, DeadlineStatus::InProgress, now).await
    }

    /// Mark a deadline completed.
    pub async fn complete_deadline(&self, id: &str, now: DateTime<Utc>) -> AppResult<Deadline> {
        self.set_status(id, DeadlineStatus::Completed, now).await
    }

    /// Mark a deadline cancelled.
    pub async fn cancel_deadline(&self, id: &str, now: DateTime<Utc>) -> AppResult<Deadline> {
        self.set_status(id, DeadlineStatus::Cancelled, now).await
    }

    async fn set_status(
        &self,
        id: &str,
        status: DeadlineStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Deadline> {
        self.core
            .storage()
            .update_deadline_status(id, status, now)
            .await
            .map_err(not_found("deadline"))?;
        info!(deadline_id = %id, status = status.as_str(), "Deadline status changed");

        self.recompute_priorities(now).await?;
        self.get_deadline(id).await
    }

    /// Remove a deadline.
    pub async fn delete_deadline(&self, id: &str) -> AppResult<()> {
        self.core
            .storage()
            .delete_deadline(id)
            .await
            .map_err(not_found("deadline"))
    }

    /// Rescore and persist every open deadline; returns how many were scored.
    pub async fn recompute_priorities(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let open = self.core.storage().get_open_deadlines().await?;
        let rescored = priority::recompute_all(open, now);

        for deadline in &rescored {
            self.core
                .storage()
                .update_deadline_priority(&deadline.id, deadline.priority_score)
                .await?;
        }

        debug!(count = rescored.len(), "Deadline priorities recomputed");
        Ok(rescored.len())
    }

    /// Open deadlines, highest priority first.
    pub async fn list_deadlines(&self) -> AppResult<Vec<Deadline>> {
        Ok(self.core.storage().get_open_deadlines().await?)
    }

    /// The single task to work on today.
    pub async fn today_focus(&self, now: DateTime<Utc>) -> AppResult<TodayFocus> {
        self.recompute_priorities(now).await?;
        let open = self.core.storage().get_open_deadlines().await?;
        Ok(TodayFocus::from_deadlines(&open, now))
    }

    /// Counts over open deadlines.
    pub async fn deadline_stats(&self, now: DateTime<Utc>) -> AppResult<DeadlineStats> {
        let open = self.core.storage().get_open_deadlines().await?;
        Ok(DeadlineStats::from_deadlines(&open, now))
    }
}
