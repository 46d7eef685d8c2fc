/// Dashboard counters computed from the caller's own records

use chrono::{DateTime, Utc};
use memberportal_shared::models::{BanView, Task, Warning};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Tasks not yet completed
    pub active_tasks: usize,

    pub completed_tasks: usize,

    /// Open tasks past their due date
    pub overdue_tasks: usize,

    pub warnings: usize,

    /// Bans with no expiry or an expiry after `now`
    pub active_bans: usize,
}

impl DashboardStats {
    /// Counts at `now`
    ///
    /// Ban activity is re-evaluated here rather than trusting the `active`
    /// flag, which reflects the time the list was fetched.
    pub fn compute(
        tasks: &[Task],
        warnings: &[Warning],
        bans: &[BanView],
        now: DateTime<Utc>,
    ) -> Self {
        let completed_tasks = tasks.iter().filter(|t| t.completed).count();

        Self {
            active_tasks: tasks.len() - completed_tasks,
            completed_tasks,
            overdue_tasks: tasks.iter().filter(|t| t.is_overdue_at(now)).count(),
            warnings: warnings.len(),
            active_bans: bans.iter().filter(|b| b.ban.is_active_at(now)).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use memberportal_shared::models::Ban;

    fn task(id: i32, completed: bool, due_date: Option<DateTime<Utc>>) -> Task {
        Task {
            id,
            user_id: 2,
            title: format!("Task {}", id),
            description: None,
            completed,
            due_date,
            created_by: 1,
            approved: false,
            approved_by: None,
            approval_note: None,
        }
    }

    fn ban(id: i32, expires_at: Option<DateTime<Utc>>, fetched_at: DateTime<Utc>) -> BanView {
        BanView::at(
            Ban {
                id,
                user_id: 2,
                reason: "Spam".to_string(),
                expires_at,
                issued_at: fetched_at - Duration::days(3),
                issued_by: 1,
                approved: false,
                approved_by: None,
                approval_note: None,
            },
            fetched_at,
        )
    }

    #[test]
    fn test_counts() {
        let now = Utc::now();
        let tasks = vec![
            task(1, false, None),
            task(2, true, None),
            task(3, false, Some(now - Duration::hours(1))),
            task(4, true, Some(now - Duration::hours(1))),
        ];
        let bans = vec![
            ban(1, None, now),
            ban(2, Some(now + Duration::days(1)), now),
            ban(3, Some(now - Duration::days(1)), now),
        ];

        let stats = DashboardStats::compute(&tasks, &[], &bans, now);

        assert_eq!(
            stats,
            DashboardStats {
                active_tasks: 2,
                completed_tasks: 2,
                overdue_tasks: 1,
                warnings: 0,
                active_bans: 2,
            }
        );
    }

    #[test]
    fn test_ban_expiring_after_fetch_is_not_counted() {
        let fetched_at = Utc::now() - Duration::hours(2);
        let bans = vec![ban(1, Some(fetched_at + Duration::hours(1)), fetched_at)];
        assert!(bans[0].active);

        let stats = DashboardStats::compute(&[], &[], &bans, Utc::now());
        assert_eq!(stats.active_bans, 0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(
            DashboardStats::compute(&[], &[], &[], Utc::now()),
            DashboardStats::default()
        );
    }
}
