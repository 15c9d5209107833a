//! Filtering and ordering for task listings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::task::{Task, TaskPriority, TaskStatus};

/// All set criteria must match.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring over title, description and tags
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tag: Option<String>,
    pub project: Option<String>,
    /// Drop completed tasks
    pub open_only: bool,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.open_only && task.status == TaskStatus::Completed {
            return false;
        }
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if let Some(project) = &self.project {
            if &task.project_id != project {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !task.tags.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => matches_search(task, query),
            _ => true,
        }
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

fn matches_search(task: &Task, query: &str) -> bool {
    let query = query.to_lowercase();
    task.title.to_lowercase().contains(&query)
        || task.description.to_lowercase().contains(&query)
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Created,
    Updated,
    Due,
    Priority,
    Title,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Created => "created",
            SortKey::Updated => "updated",
            SortKey::Due => "due",
            SortKey::Priority => "priority",
            SortKey::Title => "title",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" | "created-at" => Ok(SortKey::Created),
            "updated" | "updated-at" => Ok(SortKey::Updated),
            "due" | "due-date" => Ok(SortKey::Due),
            "priority" => Ok(SortKey::Priority),
            "title" => Ok(SortKey::Title),
            other => Err(Error::InvalidArgument(format!(
                "invalid sort key '{other}' (expected created|updated|due|priority|title)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSort {
    pub key: SortKey,
    pub descending: bool,
}

impl TaskSort {
    /// Stable; tasks without a due date sort after dated ones in either direction.
    pub fn sort(&self, tasks: &mut [&Task]) {
        tasks.sort_by(|left, right| self.compare(left, right));
    }

    fn compare(&self, left: &Task, right: &Task) -> Ordering {
        let ordering = match self.key {
            SortKey::Created => left.created_at.cmp(&right.created_at),
            SortKey::Updated => left.updated_at.cmp(&right.updated_at),
            SortKey::Priority => left.priority.weight().cmp(&right.priority.weight()),
            SortKey::Title => left.title.to_lowercase().cmp(&right.title.to_lowercase()),
            SortKey::Due => match (left.due_date, right.due_date) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}
