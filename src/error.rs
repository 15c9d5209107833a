//! Error types for tasksphere
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown task, bad config)
//! - 3: Authentication denied (no session, wrong credentials)
//! - 4: Operation failed (io, storage, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tasksphere CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const AUTH_DENIED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Failure reasons reported by authentication operations.
///
/// These are returned as values, never raised: callers receive
/// `Err(AuthError)` and decide how to present it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// Anything unexpected (RNG failure, persistence failure, aborted task)
    #[error("{0}")]
    Failed(String),
}

impl AuthError {
    /// Stable machine-readable reason
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::UserNotFound => "not_found",
            AuthError::InvalidPassword => "invalid_credential",
            AuthError::EmailAlreadyRegistered => "conflict",
            AuthError::Failed(_) => "failed",
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Main error type for tasksphere operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Authentication (exit code 3)
    #[error("Not logged in (or session expired)")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::TaskNotFound(_) => {
                exit_codes::USER_ERROR
            }

            Error::NotAuthenticated => exit_codes::AUTH_DENIED,
            Error::Auth(AuthError::Failed(_)) => exit_codes::OPERATION_FAILED,
            Error::Auth(_) => exit_codes::AUTH_DENIED,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::Watch(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Auth(err) => Some(serde_json::json!({ "reason": err.kind() })),
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for tasksphere operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
