//! Command-line interface for tasksphere
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in the submodules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::AuthManager;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::paths;
use crate::storage::{FileStore, KeyValueStore};
use crate::store::TaskStore;

mod auth;
mod focus;
mod task;

/// tasksphere - personal task management
///
/// Keeps a task board with projects, subtasks and due dates behind a local
/// account, and ranks what to work on next.
#[derive(Parser, Debug)]
#[command(name = "tasksphere")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "TASKSPHERE_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the local account and log in
    Signup {
        /// Display name
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "TASKSPHERE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Start a 24 hour session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "TASKSPHERE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session (the account is kept)
    Logout,

    /// Show the account and session state
    Whoami,

    /// Request a password reset
    ResetPassword {
        #[arg(long)]
        email: String,
    },

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Show the top three tasks to work on now
    Focus {
        /// Keep running and reprint when tasks change
        #[arg(long)]
        watch: bool,
    },

    /// Dashboard counters
    Stats,
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// todo, in-progress, review, completed
        #[arg(long)]
        status: Option<String>,

        /// low, medium, high, urgent
        #[arg(short, long)]
        priority: Option<String>,

        /// YYYY-MM-DD, RFC 3339, or an offset like 3d / -1d / 12h
        #[arg(long)]
        due: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Project id
        #[arg(long)]
        project: Option<String>,

        /// Subtask title (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,

        /// Estimated hours
        #[arg(long)]
        estimate: Option<f64>,
    },

    /// Change fields of a task
    Edit {
        /// Task id or unique prefix
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Replace tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        project: Option<String>,
    },

    /// Set a task's status
    Move {
        id: String,
        status: String,
    },

    /// Delete a task
    Rm {
        id: String,
    },

    /// List tasks
    Ls {
        /// Match title, description or tags
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        tag: Option<String>,

        #[arg(long)]
        project: Option<String>,

        /// Hide completed tasks
        #[arg(long)]
        open: bool,

        /// created, updated, due, priority, title
        #[arg(long, default_value = "created")]
        sort: String,

        /// Reverse the sort order
        #[arg(long)]
        desc: bool,
    },

    /// Show one task with its subtasks
    Show {
        id: String,
    },

    /// Mark a subtask done
    Check {
        /// Task id or unique prefix
        id: String,

        /// Subtask id prefix or 1-based position
        subtask: String,

        /// Mark it open again instead
        #[arg(long)]
        uncheck: bool,
    },
}

/// Shared handles for one CLI invocation.
pub(crate) struct AppContext {
    pub data_dir: PathBuf,
    pub config: Config,
    pub files: FileStore,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn open(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = paths::resolve_data_dir(data_dir)?;
        let files = FileStore::open(&data_dir)?;
        let config = Config::load_from_dir(files.dir());
        tracing::debug!(data_dir = %files.dir().display(), "opened data directory");
        Ok(Self {
            data_dir,
            config,
            files,
            clock: Arc::new(SystemClock),
        })
    }

    fn port(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(self.files.clone())
    }

    pub fn auth(&self) -> AuthManager {
        AuthManager::new(self.port(), Arc::clone(&self.clock), self.config.auth.clone())
    }

    pub fn tasks(&self) -> TaskStore {
        TaskStore::new(self.port(), Arc::clone(&self.clock), self.config.tasks.clone())
    }

    /// The auth manager, if its session is live.
    pub fn require_session(&self) -> Result<AuthManager> {
        let auth = self.auth();
        if auth.is_authenticated() {
            Ok(auth)
        } else {
            Err(Error::NotAuthenticated)
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = AppContext::open(self.data_dir.as_deref())?;
        let output = crate::output::OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Signup { name, email, password } => auth::run_signup(
                &ctx,
                auth::SignupOptions { name, email, password },
                output,
            ),
            Commands::Login { email, password } => {
                auth::run_login(&ctx, auth::LoginOptions { email, password }, output)
            }
            Commands::Logout => auth::run_logout(&ctx, output),
            Commands::Whoami => auth::run_whoami(&ctx, output),
            Commands::ResetPassword { email } => auth::run_reset_password(&ctx, &email, output),
            Commands::Task(cmd) => {
                ctx.require_session()?;
                match cmd {
                    TaskCommands::Add {
                        title,
                        description,
                        status,
                        priority,
                        due,
                        tags,
                        project,
                        subtasks,
                        estimate,
                    } => task::run_add(
                        &ctx,
                        task::AddOptions {
                            title,
                            description,
                            status,
                            priority,
                            due,
                            tags,
                            project,
                            subtasks,
                            estimate,
                        },
                        output,
                    ),
                    TaskCommands::Edit {
                        id,
                        title,
                        description,
                        status,
                        priority,
                        due,
                        clear_due,
                        tags,
                        project,
                    } => task::run_edit(
                        &ctx,
                        task::EditOptions {
                            id,
                            title,
                            description,
                            status,
                            priority,
                            due,
                            clear_due,
                            tags,
                            project,
                        },
                        output,
                    ),
                    TaskCommands::Move { id, status } => task::run_move(&ctx, &id, &status, output),
                    TaskCommands::Rm { id } => task::run_rm(&ctx, &id, output),
                    TaskCommands::Ls {
                        search,
                        status,
                        priority,
                        tag,
                        project,
                        open,
                        sort,
                        desc,
                    } => task::run_list(
                        &ctx,
                        task::ListOptions {
                            search,
                            status,
                            priority,
                            tag,
                            project,
                            open,
                            sort,
                            desc,
                        },
                        output,
                    ),
                    TaskCommands::Show { id } => task::run_show(&ctx, &id, output),
                    TaskCommands::Check { id, subtask, uncheck } => {
                        task::run_check(&ctx, &id, &subtask, !uncheck, output)
                    }
                }
            }
            Commands::Focus { watch } => {
                let auth = ctx.require_session()?;
                if watch {
                    focus::run_watch(&ctx, auth, output)
                } else {
                    focus::run_focus(&ctx, output)
                }
            }
            Commands::Stats => {
                ctx.require_session()?;
                focus::run_stats(&ctx, output)
            }
        }
    }
}
