//! Focus ranking: which open tasks deserve attention now.
//!
//! ```text
//! score = priority weight * 25
//!       + due bonus (overdue 100, <=1 day 75, <=3 days 50, <=7 days 25)
//!       + 10 per open subtask
//! ```
//!
//! Days until due are rounded up, so a task due later today counts as one
//! day away. Recomputed on every call; nothing is cached.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{Task, TaskStatus};

/// Maximum size of the focus set
pub const FOCUS_LIMIT: usize = 3;

const PRIORITY_FACTOR: i64 = 25;
const SUBTASK_BONUS: i64 = 10;
const MS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusEntry {
    pub task: Task,
    pub score: i64,
}

/// `ceil((due - now) / 1 day)`, at millisecond resolution.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (due - now).num_milliseconds();
    millis.div_euclid(MS_PER_DAY) + i64::from(millis.rem_euclid(MS_PER_DAY) != 0)
}

fn due_bonus(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    match days_until(due, now) {
        days if days < 0 => 100,
        days if days <= 1 => 75,
        days if days <= 3 => 50,
        days if days <= 7 => 25,
        _ => 0,
    }
}

pub fn score(task: &Task, now: DateTime<Utc>) -> i64 {
    let mut score = i64::from(task.priority.weight()) * PRIORITY_FACTOR;
    if let Some(due) = task.due_date {
        score += due_bonus(due, now);
    }
    score + SUBTASK_BONUS * task.open_subtasks() as i64
}

/// Every non-completed task with its score, highest first. Equal scores keep
/// input order.
pub fn rank(tasks: &[Task], now: DateTime<Utc>) -> Vec<FocusEntry> {
    let mut entries: Vec<FocusEntry> = tasks
        .iter()
        .filter(|task| task.status != TaskStatus::Completed)
        .map(|task| FocusEntry {
            task: task.clone(),
            score: score(task, now),
        })
        .collect();
    // sort_by is stable
    entries.sort_by(|left, right| right.score.cmp(&left.score));
    entries
}

/// The top [`FOCUS_LIMIT`] entries of [`rank`].
pub fn focus(tasks: &[Task], now: DateTime<Utc>) -> Vec<FocusEntry> {
    let mut entries = rank(tasks, now);
    entries.truncate(FOCUS_LIMIT);
    entries
}
