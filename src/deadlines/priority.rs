//! Deadline priority scoring.
//!
//! Every function here is pure in `(deadline, now)`; persisting the results is
//! done by [`super::DeadlineService`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::{Deadline, DeadlineCategory, DeadlineStatus};

const DAY_MS: i64 = 86_400_000;

/// Base score of anything due now or earlier.
pub const OVERDUE_SCORE: f64 = 1000.0;

/// Bonus for deadlines that have been started.
pub const IN_PROGRESS_BONUS: f64 = 50.0;

const NO_TASK_MESSAGE: &str = "今日やるべき外部タスクはありません。お疲れ様です。";

/// Weight added for a category.
pub fn category_weight(category: DeadlineCategory) -> f64 {
    match category {
        DeadlineCategory::Scholarship => 100.0,
        DeadlineCategory::Grant => 90.0,
        DeadlineCategory::Submission => 80.0,
        DeadlineCategory::Report => 60.0,
        DeadlineCategory::Meeting => 50.0,
        DeadlineCategory::Other => 40.0,
    }
}

/// Whole days until `due`, rounded up. Zero or negative means overdue.
pub fn days_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff = (due - now).num_milliseconds();
    let days = diff.div_euclid(DAY_MS);
    if diff.rem_euclid(DAY_MS) > 0 {
        days + 1
    } else {
        days
    }
}

fn urgency_base(days: i64) -> f64 {
    let d = days as f64;
    match days {
        d0 if d0 <= 0 => OVERDUE_SCORE,
        1..=3 => 500.0 - d * 50.0,
        4..=7 => 350.0 - d * 20.0,
        8..=14 => 200.0 - d * 5.0,
        _ => 100.0 - d.min(30.0),
    }
}

/// Score one deadline at `now`.
pub fn score(deadline: &Deadline, now: DateTime<Utc>) -> f64 {
    let mut total = urgency_base(days_until_due(deadline.due_date, now));
    total += category_weight(deadline.category);
    if deadline.status == DeadlineStatus::InProgress {
        total += IN_PROGRESS_BONUS;
    }
    total
}

/// Rescore every deadline; other fields are untouched.
pub fn recompute_all(deadlines: Vec<Deadline>, now: DateTime<Utc>) -> Vec<Deadline> {
    deadlines
        .into_iter()
        .map(|mut d| {
            d.priority_score = score(&d, now);
            d
        })
        .collect()
}

/// Highest-scored open deadline.
///
/// Ties go to the earliest due date, then to the earlier position in `deadlines`.
pub fn top_task(deadlines: &[Deadline]) -> Option<&Deadline> {
    deadlines
        .iter()
        .filter(|d| d.status.is_open())
        .fold(None, |best: Option<&Deadline>, d| match best {
            Some(b)
                if b.priority_score > d.priority_score
                    || (b.priority_score == d.priority_score && b.due_date <= d.due_date) =>
            {
                Some(b)
            }
            _ => Some(d),
        })
}

/// Short label for how close a deadline is.
pub fn urgency_label(days: i64) -> String {
    match days {
        d if d <= 0 => "⚠️ 期限を過ぎています".to_string(),
        1 => "🔥 明日が締め切りです".to_string(),
        2..=3 => format!("⏰ あと{}日です", days),
        _ => format!("📅 {}日後", days),
    }
}

/// The single task to work on today.
#[derive(Debug, Clone, Serialize)]
pub struct FocusTask {
    pub deadline: Deadline,
    pub days_until: i64,
    pub urgency: String,
}

/// Result of asking for today's focus; `task` is `None` when nothing is open.
#[derive(Debug, Clone, Serialize)]
pub struct TodayFocus {
    pub task: Option<FocusTask>,
    pub message: String,
}

impl TodayFocus {
    /// Build the focus message for the top open deadline, if any.
    pub fn from_deadlines(deadlines: &[Deadline], now: DateTime<Utc>) -> Self {
        let Some(deadline) = top_task(deadlines) else {
            return Self {
                task: None,
                message: NO_TASK_MESSAGE.to_string(),
            };
        };

        let days_until = days_until_due(deadline.due_date, now);
        let urgency = urgency_label(days_until);
        let message = format!(
            "今日やるのは、これ1つだけ:\n\n【{}】\n{}\n\n他のタスクは今は見なくていい。これだけに集中してOK。",
            deadline.title, urgency
        );

        Self {
            task: Some(FocusTask {
                deadline: deadline.clone(),
                days_until,
                urgency,
            }),
            message,
        }
    }

    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }
}

/// Counts over open deadlines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeadlineStats {
    pub total: usize,
    pub overdue: usize,
    pub this_week: usize,
    pub in_progress: usize,
}

impl DeadlineStats {
    pub fn from_deadlines(deadlines: &[Deadline], now: DateTime<Utc>) -> Self {
        let open: Vec<&Deadline> = deadlines.iter().filter(|d| d.status.is_open()).collect();
        let week_ms = 7 * DAY_MS;

        Self {
            total: open.len(),
            overdue: open.iter().filter(|d| d.due_date < now).count(),
            this_week: open
                .iter()
                .filter(|d| {
                    let diff = (d.due_date - now).num_milliseconds();
                    (0..=week_ms).contains(&diff)
                })
                .count(),
            in_progress: open
                .iter()
                .filter(|d| d.status == DeadlineStatus::InProgress)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn due_in(days: i64, category: DeadlineCategory) -> Deadline {
        Deadline::new("task", now() + Duration::days(days)).with_category(category)
    }

    #[test]
    fn test_grant_due_in_two_days() {
        let d = due_in(2, DeadlineCategory::Grant);
        assert_eq!(score(&d, now()), 490.0);
    }

    #[test]
    fn test_partial_days_round_up() {
        let due = now() + Duration::hours(25);
        assert_eq!(days_until_due(due, now()), 2);
        assert_eq!(days_until_due(now() - Duration::hours(36), now()), -1);
        assert_eq!(days_until_due(now(), now()), 0);
    }

    #[test]
    fn test_overdue_is_flat() {
        let a = due_in(-1, DeadlineCategory::Meeting);
        let b = due_in(-40, DeadlineCategory::Meeting);
        assert_eq!(score(&a, now()), 1050.0);
        assert_eq!(score(&a, now()), score(&b, now()));

        let started = due_in(-3, DeadlineCategory::Other).with_status(DeadlineStatus::InProgress);
        assert_eq!(score(&started, now()), 1000.0 + 40.0 + 50.0);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(score(&due_in(5, DeadlineCategory::Other), now()), 350.0 - 100.0 + 40.0);
        assert_eq!(score(&due_in(10, DeadlineCategory::Other), now()), 200.0 - 50.0 + 40.0);
        assert_eq!(score(&due_in(20, DeadlineCategory::Other), now()), 80.0 + 40.0);
        assert_eq!(score(&due_in(90, DeadlineCategory::Other), now()), 70.0 + 40.0);
    }

    #[test]
    fn test_closer_scores_at_least_as_high() {
        let mut last = f64::MAX;
        for days in -2..60 {
            let s = score(&due_in(days, DeadlineCategory::Report), now());
            assert!(s <= last, "score rose at {} days", days);
            last = s;
        }
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let deadlines = vec![
            due_in(1, DeadlineCategory::Scholarship),
            due_in(12, DeadlineCategory::Submission),
        ];
        let once = recompute_all(deadlines, now());
        let twice = recompute_all(once.clone(), now());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_top_task_tie_breaks() {
        let mut a = due_in(9, DeadlineCategory::Other);
        let mut b = due_in(3, DeadlineCategory::Other);
        let mut c = due_in(3, DeadlineCategory::Other);
        a.priority_score = 100.0;
        b.priority_score = 100.0;
        c.priority_score = 100.0;
        c.due_date = b.due_date;

        let list = vec![a, b.clone(), c];
        assert_eq!(top_task(&list).map(|d| d.id.as_str()), Some(b.id.as_str()));
    }

    #[test]
    fn test_top_task_skips_closed() {
        let mut done = due_in(0, DeadlineCategory::Grant).with_status(DeadlineStatus::Completed);
        done.priority_score = 5000.0;
        let list = vec![done];
        assert!(top_task(&list).is_none());

        let focus = TodayFocus::from_deadlines(&list, now());
        assert!(!focus.has_task());
        assert_eq!(focus.message, NO_TASK_MESSAGE);
    }

    #[test]
    fn test_focus_message() {
        let list = recompute_all(vec![due_in(1, DeadlineCategory::Report)], now());
        let focus = TodayFocus::from_deadlines(&list, now());
        assert!(focus.message.contains("【task】"));
        assert!(focus.message.contains("🔥 明日が締め切りです"));
    }

    #[test]
    fn test_urgency_labels() {
        assert_eq!(urgency_label(-2), "⚠️ 期限を過ぎています");
        assert_eq!(urgency_label(3), "⏰ あと3日です");
        assert_eq!(urgency_label(8), "📅 8日後");
    }

    #[test]
    fn test_stats() {
        let list = vec![
            due_in(-1, DeadlineCategory::Other),
            due_in(2, DeadlineCategory::Other).with_status(DeadlineStatus::InProgress),
            due_in(30, DeadlineCategory::Other),
            due_in(1, DeadlineCategory::Other).with_status(DeadlineStatus::Cancelled),
        ];
        let stats = DeadlineStats::from_deadlines(&list, now());
        assert_eq!(
            stats,
            DeadlineStats {
                total: 3,
                overdue: 1,
                this_week: 1,
                in_progress: 1,
            }
        );
    }
}
