//! Dashboard counters.

use serde::Serialize;

use crate::task::{Project, Task, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    /// Every task not yet completed
    pub active: usize,
    pub in_review: usize,
    pub projects: usize,
    /// Whole percent of tasks completed; 0 for an empty store
    pub completion_rate: u32,
}

impl DashboardStats {
    pub fn compute(tasks: &[Task], projects: &[Project]) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|task| task.status == status).count();
        let completed = count(TaskStatus::Completed);
        let completion_rate = if tasks.is_empty() {
            0
        } else {
            (completed as f64 / tasks.len() as f64 * 100.0).round() as u32
        };
        Self {
            total: tasks.len(),
            completed,
            active: tasks.len() - completed,
            in_review: count(TaskStatus::Review),
            projects: projects.len(),
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;
    use chrono::Utc;
    use uuid::Uuid;

    fn tasks(statuses: &[TaskStatus]) -> Vec<Task> {
        statuses
            .iter()
            .map(|status| {
                TaskDraft {
                    status: Some(*status),
                    ..TaskDraft::default()
                }
                .into_task(Uuid::new_v4(), Utc::now(), "default")
            })
            .collect()
    }

    #[test]
    fn empty_store_has_zero_rate() {
        let stats = DashboardStats::compute(&[], &[]);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn rate_rounds_to_whole_percent() {
        let stats = DashboardStats::compute(
            &tasks(&[TaskStatus::Completed, TaskStatus::InProgress, TaskStatus::Todo]),
            &[],
        );
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completion_rate, 33);

        let stats = DashboardStats::compute(
            &tasks(&[TaskStatus::Completed, TaskStatus::Completed, TaskStatus::Review]),
            &[],
        );
        assert_eq!(stats.completion_rate, 67);
        assert_eq!(stats.in_review, 1);
    }

    #[test]
    fn active_counts_every_open_status() {
        let stats = DashboardStats::compute(
            &tasks(&[TaskStatus::Todo, TaskStatus::Review, TaskStatus::Completed]),
            &[],
        );
        assert_eq!(stats.active, 2);
        assert_eq!(stats.in_review, 1);
        assert_eq!(stats.total, stats.active + stats.completed);
    }
}
