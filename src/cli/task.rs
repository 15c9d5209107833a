//! tasksphere task command implementations.

use serde::Serialize;
use uuid::Uuid;

use crate::cli::AppContext;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::query::{SortKey, TaskFilter, TaskSort};
use crate::store::TaskStore;
use crate::task::{parse_due, Subtask, Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus};

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub tags: Vec<String>,
    pub project: Option<String>,
    pub subtasks: Vec<String>,
    pub estimate: Option<f64>,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub tags: Vec<String>,
    pub project: Option<String>,
}

pub struct ListOptions {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub project: Option<String>,
    pub open: bool,
    pub sort: String,
    pub desc: bool,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    total: usize,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct TaskRemovedOutput {
    id: Uuid,
    title: String,
}

pub(crate) fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub(crate) fn task_line(task: &Task) -> String {
    let mut line = format!(
        "{} [{}][{}] {}",
        short_id(&task.id),
        task.status,
        task.priority,
        task.title
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due {})", due.format("%Y-%m-%d")));
    }
    if !task.subtasks.is_empty() {
        let done = task.subtasks.len() - task.open_subtasks();
        line.push_str(&format!(" [{}/{}]", done, task.subtasks.len()));
    }
    if !task.tags.is_empty() {
        line.push_str(&format!(" #{}", task.tags.join(" #")));
    }
    line
}

fn parse_status(value: Option<&str>) -> Result<Option<TaskStatus>> {
    value.map(str::parse).transpose()
}

fn parse_priority(value: Option<&str>) -> Result<Option<TaskPriority>> {
    value.map(str::parse).transpose()
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

fn non_empty(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn lookup<'a>(store: &'a TaskStore, input: &str) -> Result<&'a Task> {
    let id = store.resolve_id(input)?;
    store
        .get(id)
        .ok_or_else(|| Error::TaskNotFound(input.trim().to_string()))
}

fn task_human(header: &str, task: &Task) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Project", task.project_id.clone());
    if let Some(due) = task.due_date {
        human.push_summary("Due", due.to_rfc3339());
    }
    if !task.tags.is_empty() {
        human.push_summary("Tags", task.tags.join(", "));
    }
    human
}

pub fn run_add(ctx: &AppContext, options: AddOptions, output: OutputOptions) -> Result<()> {
    let now = ctx.clock.now();
    let title = non_empty("title", options.title)?;
    let due_date = options
        .due
        .as_deref()
        .map(|value| parse_due(value, now))
        .transpose()?;
    let subtasks = options
        .subtasks
        .into_iter()
        .map(|title| non_empty("subtask", title).map(|title| Subtask::new(title, now)))
        .collect::<Result<Vec<_>>>()?;

    let mut store = ctx.tasks();
    let project_id = options.project.map(|project| project.trim().to_string());
    let unknown_project = project_id
        .as_deref()
        .filter(|project| store.project(project).is_none())
        .map(str::to_string);

    let draft = TaskDraft {
        description: options.description,
        status: parse_status(options.status.as_deref())?,
        priority: parse_priority(options.priority.as_deref())?,
        due_date,
        project_id,
        tags: Some(clean_tags(options.tags)),
        subtasks: Some(subtasks),
        estimated_hours: options.estimate,
        ..TaskDraft::titled(title)
    };
    let task = store.create(draft);

    let mut human = task_human("Task created", &task);
    if let Some(project) = unknown_project {
        human.push_warning(format!("project '{project}' does not exist yet"));
    }
    human.push_next_step(format!("tasksphere task show {}", short_id(&task.id)));
    emit_success(output, "task add", &task, Some(&human))
}

pub fn run_edit(ctx: &AppContext, options: EditOptions, output: OutputOptions) -> Result<()> {
    let now = ctx.clock.now();
    let mut store = ctx.tasks();
    let id = lookup(&store, &options.id)?.id;

    let due_date = if options.clear_due {
        Some(None)
    } else {
        options
            .due
            .as_deref()
            .map(|value| parse_due(value, now).map(Some))
            .transpose()?
    };
    let patch = TaskPatch {
        title: options.title.map(|title| non_empty("title", title)).transpose()?,
        description: options.description,
        status: parse_status(options.status.as_deref())?,
        priority: parse_priority(options.priority.as_deref())?,
        due_date,
        tags: (!options.tags.is_empty()).then(|| clean_tags(options.tags)),
        project_id: options.project.map(|project| project.trim().to_string()),
        ..TaskPatch::default()
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass at least one field".to_string(),
        ));
    }

    store.update(id, patch);
    let task = lookup(&store, &id.to_string())?;
    let human = task_human("Task updated", task);
    emit_success(output, "task edit", task, Some(&human))
}

pub fn run_move(ctx: &AppContext, id: &str, status: &str, output: OutputOptions) -> Result<()> {
    let status: TaskStatus = status.parse()?;
    let mut store = ctx.tasks();
    let (id, from) = {
        let task = lookup(&store, id)?;
        (task.id, task.status)
    };
    store.move_task(id, status);
    let task = lookup(&store, &id.to_string())?;

    let mut human = HumanOutput::new("Task moved");
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", format!("{from} -> {}", task.status));
    emit_success(output, "task move", task, Some(&human))
}

pub fn run_rm(ctx: &AppContext, id: &str, output: OutputOptions) -> Result<()> {
    let mut store = ctx.tasks();
    let removed = {
        let task = lookup(&store, id)?;
        TaskRemovedOutput {
            id: task.id,
            title: task.title.clone(),
        }
    };
    store.delete(removed.id);

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", removed.id.to_string());
    human.push_summary("Title", removed.title.clone());
    emit_success(output, "task rm", &removed, Some(&human))
}

pub fn run_list(ctx: &AppContext, options: ListOptions, output: OutputOptions) -> Result<()> {
    let filter = TaskFilter {
        search: options.search,
        status: parse_status(options.status.as_deref())?,
        priority: parse_priority(options.priority.as_deref())?,
        tag: options.tag.map(|tag| tag.trim().trim_start_matches('#').to_string()),
        project: options.project,
        open_only: options.open,
    };
    let sort = TaskSort {
        key: options.sort.parse::<SortKey>()?,
        descending: options.desc,
    };

    let store = ctx.tasks();
    let mut tasks = filter.apply(store.tasks());
    sort.sort(&mut tasks);

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    human.push_summary("Sort", format!("{}{}", sort.key, if sort.descending { " (desc)" } else { "" }));
    for task in &tasks {
        human.push_row(task_line(task));
    }
    if tasks.is_empty() {
        human.push_next_step("tasksphere task add <title>");
    }

    let data = TaskListOutput {
        total: tasks.len(),
        tasks,
    };
    emit_success(output, "task ls", &data, Some(&human))
}

pub fn run_show(ctx: &AppContext, id: &str, output: OutputOptions) -> Result<()> {
    let store = ctx.tasks();
    let task = lookup(&store, id)?;

    let mut human = task_human(&task.title, task);
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    human.push_summary("Created", task.created_at.to_rfc3339());
    human.push_summary("Updated", task.updated_at.to_rfc3339());
    for (index, subtask) in task.subtasks.iter().enumerate() {
        let mark = if subtask.completed { "x" } else { " " };
        human.push_row(format!(
            "{}. [{}] {} ({})",
            index + 1,
            mark,
            subtask.title,
            short_id(&subtask.id)
        ));
    }
    emit_success(output, "task show", task, Some(&human))
}

/// Find a subtask by 1-based position or unique id prefix.
fn resolve_subtask(task: &Task, input: &str) -> Result<usize> {
    let needle = input.trim().to_ascii_lowercase();
    if let Ok(position) = needle.parse::<usize>() {
        if (1..=task.subtasks.len()).contains(&position) {
            return Ok(position - 1);
        }
    }
    let matches: Vec<usize> = task
        .subtasks
        .iter()
        .enumerate()
        .filter(|(_, subtask)| !needle.is_empty() && subtask.id.to_string().starts_with(&needle))
        .map(|(index, _)| index)
        .collect();
    match matches.as_slice() {
        [index] => Ok(*index),
        [] => Err(Error::InvalidArgument(format!(
            "no subtask '{}' on task {}",
            input.trim(),
            short_id(&task.id)
        ))),
        _ => Err(Error::InvalidArgument(format!(
            "ambiguous subtask '{}'",
            input.trim()
        ))),
    }
}

pub fn run_check(
    ctx: &AppContext,
    id: &str,
    subtask: &str,
    completed: bool,
    output: OutputOptions,
) -> Result<()> {
    let mut store = ctx.tasks();
    let (id, subtasks, index) = {
        let task = lookup(&store, id)?;
        let index = resolve_subtask(task, subtask)?;
        let mut subtasks = task.subtasks.clone();
        subtasks[index].completed = completed;
        (task.id, subtasks, index)
    };
    store.update(
        id,
        TaskPatch {
            subtasks: Some(subtasks),
            ..TaskPatch::default()
        },
    );
    let task = lookup(&store, &id.to_string())?;

    let header = if completed {
        "Subtask checked"
    } else {
        "Subtask unchecked"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Task", task.title.clone());
    human.push_summary("Subtask", task.subtasks[index].title.clone());
    human.push_summary(
        "Open subtasks",
        format!("{}/{}", task.open_subtasks(), task.subtasks.len()),
    );
    emit_success(output, "task check", task, Some(&human))
}
