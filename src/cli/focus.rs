//! `focus` and `stats` commands.

use serde::Serialize;

use crate::auth::AuthManager;
use crate::cli::task::short_id;
use crate::cli::AppContext;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::focus::{self, FocusEntry};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::stats::DashboardStats;
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::watch::StoreWatcher;

#[derive(Serialize)]
struct FocusOutput {
    open: usize,
    entries: Vec<FocusEntry>,
}

fn focus_report(ctx: &AppContext, store: &TaskStore) -> (FocusOutput, HumanOutput) {
    let now = ctx.clock.now();
    let ranked = focus::rank(store.tasks(), now);
    let open = ranked.len();
    let entries: Vec<FocusEntry> = ranked.into_iter().take(focus::FOCUS_LIMIT).collect();

    let mut human = HumanOutput::new("Focus");
    human.push_summary("Open tasks", open.to_string());
    for (position, entry) in entries.iter().enumerate() {
        let mut line = format!(
            "{}. {} [{}] {} (score {})",
            position + 1,
            short_id(&entry.task.id),
            entry.task.priority,
            entry.task.title,
            entry.score
        );
        if let Some(due) = entry.task.due_date {
            let days = focus::days_until(due, now);
            let when = match days {
                d if d < 0 => format!("overdue by {} day(s)", -d),
                0 => "due today".to_string(),
                d => format!("due in {d} day(s)"),
            };
            line.push_str(&format!(", {when}"));
        }
        human.push_row(line);
    }
    if entries.is_empty() {
        human.push_next_step("tasksphere task add <title>");
    }

    (FocusOutput { open, entries }, human)
}

pub fn run_focus(ctx: &AppContext, output: OutputOptions) -> Result<()> {
    let store = ctx.tasks();
    let (data, human) = focus_report(ctx, &store);
    emit_success(output, "focus", &data, Some(&human))
}

/// Print the focus set, then again after every task change on disk, until
/// the session ends.
pub fn run_watch(ctx: &AppContext, auth: AuthManager, output: OutputOptions) -> Result<()> {
    let mut store = ctx.tasks();
    let _watcher = StoreWatcher::start(&ctx.files)?;
    let changes = ctx.files.subscribe();

    let (data, human) = focus_report(ctx, &store);
    emit_success(output, "focus", &data, Some(&human))?;

    for change in changes.iter() {
        let auth_changed = auth.apply_change(&change);
        if auth_changed && !auth.is_authenticated() {
            tracing::info!("session ended while watching");
            return Err(Error::NotAuthenticated);
        }
        if store.apply_change(&change) {
            let (data, human) = focus_report(ctx, &store);
            emit_success(output, "focus", &data, Some(&human))?;
        }
    }
    Ok(())
}

pub fn run_stats(ctx: &AppContext, output: OutputOptions) -> Result<()> {
    let store = ctx.tasks();
    let stats = DashboardStats::compute(store.tasks(), store.projects());

    let mut human = HumanOutput::new("Dashboard");
    human.push_summary("Tasks", stats.total.to_string());
    human.push_summary("Completed", stats.completed.to_string());
    human.push_summary("Active", stats.active.to_string());
    human.push_summary("In review", stats.in_review.to_string());
    human.push_summary("Projects", stats.projects.to_string());
    human.push_summary("Completion rate", format!("{}%", stats.completion_rate));
    emit_success(output, "stats", &stats, Some(&human))
}
