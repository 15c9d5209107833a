//! Task store: owns the task and project collections.
//!
//! Every mutation is written through to the persistence port before the call
//! returns. Mutations never fail observably: unknown ids are no-ops and
//! persistence failures are logged, leaving the in-memory state updated.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::seed;
use crate::storage::{self, KeyValueStore, StorageChange, PROJECTS_KEY, TASKS_KEY};
use crate::task::{Project, Task, TaskDraft, TaskPatch, TaskStatus};

pub struct TaskStore {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: TasksConfig,
}

impl TaskStore {
    /// Load both collections, seeding the demo dataset when both are empty.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: TasksConfig) -> Self {
        let tasks: Vec<Task> = storage::read_or_default(store.as_ref(), TASKS_KEY, Vec::new());
        let projects: Vec<Project> =
            storage::read_or_default(store.as_ref(), PROJECTS_KEY, Vec::new());
        let mut task_store = Self {
            tasks,
            projects,
            store,
            clock,
            config,
        };

        if task_store.tasks.is_empty()
            && task_store.projects.is_empty()
            && task_store.config.seed_on_empty
        {
            let data = seed::demo_data(task_store.clock.now(), &task_store.config.default_project);
            tracing::info!(
                tasks = data.tasks.len(),
                projects = data.projects.len(),
                "seeding empty store"
            );
            task_store.tasks = data.tasks;
            task_store.projects = data.projects;
            task_store.persist_projects();
            task_store.persist_tasks();
        }
        task_store
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    /// Append a task built from `draft` and persist.
    pub fn create(&mut self, draft: TaskDraft) -> Task {
        let task = draft.into_task(Uuid::new_v4(), self.clock.now(), &self.config.default_project);
        tracing::debug!(id = %task.id, title = %task.title, "created task");
        self.tasks.push(task.clone());
        self.persist_tasks();
        task
    }

    /// Shallow-merge `patch` and bump `updated_at`. Returns whether the
    /// task existed; an unknown id changes nothing.
    pub fn update(&mut self, id: Uuid, patch: TaskPatch) -> bool {
        let now = self.clock.now();
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            tracing::debug!(id = %id, "update of unknown task ignored");
            return false;
        };
        patch.apply_to(task);
        task.updated_at = now.max(task.created_at);
        tracing::debug!(id = %id, status = %task.status, "updated task");
        self.persist_tasks();
        true
    }

    /// Remove a task if present. Idempotent.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            return false;
        }
        tracing::debug!(id = %id, "deleted task");
        self.persist_tasks();
        true
    }

    /// `update(id, { status })`. Any status may follow any other.
    pub fn move_task(&mut self, id: Uuid, status: TaskStatus) -> bool {
        self.update(id, TaskPatch::status(status))
    }

    pub fn by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.status == status).collect()
    }

    pub fn by_project(&self, project_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.project_id == project_id)
            .collect()
    }

    /// Resolve a full id or a unique prefix of one.
    pub fn resolve_id(&self, input: &str) -> Result<Uuid> {
        let needle = input.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if let Ok(id) = Uuid::parse_str(&needle) {
            return self
                .get(id)
                .map(|task| task.id)
                .ok_or_else(|| Error::TaskNotFound(input.trim().to_string()));
        }

        let matches: Vec<Uuid> = self
            .tasks
            .iter()
            .map(|task| task.id)
            .filter(|id| id.to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(Error::TaskNotFound(input.trim().to_string())),
            [id] => Ok(*id),
            _ => Err(Error::InvalidArgument(format!(
                "ambiguous task id '{}': {}",
                input.trim(),
                matches
                    .iter()
                    .map(Uuid::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Replace a collection with a value written elsewhere. Last write wins;
    /// unreadable values are ignored. Returns whether anything was applied.
    pub fn apply_change(&mut self, change: &StorageChange) -> bool {
        let Some(value) = change.value.clone() else {
            return false;
        };
        match change.key.as_str() {
            TASKS_KEY => match serde_json::from_value::<Vec<Task>>(value) {
                Ok(tasks) => self.tasks = tasks,
                Err(err) => {
                    tracing::warn!(%err, "ignoring malformed external tasks");
                    return false;
                }
            },
            PROJECTS_KEY => match serde_json::from_value::<Vec<Project>>(value) {
                Ok(projects) => self.projects = projects,
                Err(err) => {
                    tracing::warn!(%err, "ignoring malformed external projects");
                    return false;
                }
            },
            _ => return false,
        }
        tracing::debug!(key = %change.key, "applied external change");
        true
    }

    fn persist_tasks(&self) {
        if let Err(err) = storage::write_value(self.store.as_ref(), TASKS_KEY, &self.tasks) {
            tracing::warn!(%err, "could not persist tasks");
        }
    }

    fn persist_projects(&self) {
        if let Err(err) = storage::write_value(self.store.as_ref(), PROJECTS_KEY, &self.projects) {
            tracing::warn!(%err, "could not persist projects");
        }
    }
}
