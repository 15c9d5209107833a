//! Demo dataset written on first start when the store holds nothing.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::task::{
    Project, ProjectMember, ProjectRole, Subtask, Task, TaskDraft, TaskPriority, TaskStatus,
};

pub const SEED_OWNER: &str = "demo-user";

pub struct SeedData {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
}

fn project(id: &str, name: &str, description: &str, color: &str, icon: &str, now: DateTime<Utc>) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        color: color.to_string(),
        icon: icon.to_string(),
        owner_id: SEED_OWNER.to_string(),
        members: vec![ProjectMember {
            user_id: SEED_OWNER.to_string(),
            role: ProjectRole::Owner,
            joined_at: now,
        }],
        created_at: now,
        updated_at: now,
        is_archived: false,
    }
}

fn subtasks(titles: &[(&str, bool)], now: DateTime<Utc>) -> Vec<Subtask> {
    titles
        .iter()
        .map(|(title, completed)| Subtask {
            completed: *completed,
            ..Subtask::new(*title, now)
        })
        .collect()
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|tag| tag.to_string()).collect()
}

/// Fixed demo projects and tasks, dated relative to `now`.
pub fn demo_data(now: DateTime<Utc>, default_project: &str) -> SeedData {
    let projects = vec![
        project(
            default_project,
            "Personal",
            "Everyday errands and personal goals",
            "#6366f1",
            "user",
            now,
        ),
        project(
            "work",
            "Work",
            "Deliverables for the day job",
            "#f59e0b",
            "briefcase",
            now,
        ),
    ];

    let drafts = vec![
        TaskDraft {
            description: Some("Draft the quarterly report and send it for review".to_string()),
            status: Some(TaskStatus::InProgress),
            priority: Some(TaskPriority::Urgent),
            due_date: Some(now + Duration::days(1)),
            project_id: Some("work".to_string()),
            tags: Some(tags(&["report", "q3"])),
            subtasks: Some(subtasks(
                &[("Collect figures", true), ("Write summary", false), ("Make charts", false)],
                now,
            )),
            estimated_hours: Some(6.0),
            ..TaskDraft::titled("Finish quarterly report")
        },
        TaskDraft {
            description: Some("Go through open pull requests".to_string()),
            status: Some(TaskStatus::Review),
            priority: Some(TaskPriority::High),
            due_date: Some(now + Duration::days(3)),
            project_id: Some("work".to_string()),
            tags: Some(tags(&["code"])),
            ..TaskDraft::titled("Review pull requests")
        },
        TaskDraft {
            description: Some("Milk, eggs, coffee".to_string()),
            priority: Some(TaskPriority::Low),
            due_date: Some(now + Duration::days(10)),
            tags: Some(tags(&["errand"])),
            ..TaskDraft::titled("Buy groceries")
        },
        TaskDraft {
            description: Some("Book the annual check-up".to_string()),
            priority: Some(TaskPriority::Medium),
            due_date: Some(now - Duration::days(2)),
            tags: Some(tags(&["health"])),
            ..TaskDraft::titled("Call the dentist")
        },
        TaskDraft {
            description: Some("Set up the new laptop".to_string()),
            status: Some(TaskStatus::Completed),
            priority: Some(TaskPriority::High),
            project_id: Some("work".to_string()),
            completed_at: Some(now - Duration::days(1)),
            actual_hours: Some(2.5),
            ..TaskDraft::titled("Onboard laptop")
        },
    ];

    let tasks = drafts
        .into_iter()
        .map(|draft| TaskDraft {
            created_by: Some(SEED_OWNER.to_string()),
            ..draft
        })
        .map(|draft| draft.into_task(Uuid::new_v4(), now, default_project))
        .collect();

    SeedData { tasks, projects }
}
