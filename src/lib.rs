//! tasksphere - personal task management library
//!
//! The core behind the `tasksphere` CLI: a local account with password
//! hashing and expiring sessions, a write-through task store, and a
//! deterministic focus ranking.
//!
//! # Core Concepts
//!
//! - **Persistence port**: a JSON key/value store with change
//!   notification; in-memory for tests, one file per key on disk
//! - **Session**: a random token valid for 24 hours, checked lazily
//! - **Task store**: owns tasks and projects; mutations never fail
//!   observably and are persisted before returning
//! - **Focus set**: the three highest-scoring open tasks
//!
//! # Module Organization
//!
//! - `auth`: account and session lifecycle
//! - `credential`: PBKDF2 password hashing
//! - `session`: session tokens
//! - `storage`: persistence port and adapters
//! - `watch`: cross-process change detection for the file adapter
//! - `store`: task store
//! - `task`: task and project model
//! - `focus`: prioritization
//! - `query`: filtering and sorting
//! - `stats`: dashboard counters
//! - `config`: `tasksphere.toml`
//! - `lock`: file locking and atomic writes
//! - `cli`: command-line interface using clap

pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod focus;
pub mod lock;
pub mod output;
pub mod paths;
pub mod query;
pub mod seed;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;
pub mod task;
pub mod watch;

pub use auth::AuthManager;
pub use error::{AuthError, Error, Result};
pub use store::TaskStore;
