//! CLI output: a JSON envelope with `--json`, sectioned text otherwise.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::{exit_codes, AuthError, Error, Result};

pub const SCHEMA_VERSION: &str = "tasksphere.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    rows: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            rows: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    /// A listing line, printed as-is under the summary.
    pub fn push_row(&mut self, value: impl Into<String>) {
        self.rows.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }
    if let Some(human) = human {
        println!("{}", format_human(human));
    }
    Ok(())
}

/// Report a failed command: the JSON envelope on stdout with `--json`,
/// otherwise `error:`/`hint:` lines on stderr.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    if json {
        write_error(&mut io::stdout().lock(), command, err, json)
    } else {
        write_error(&mut io::stderr().lock(), command, err, json)
    }
}

/// Like [`emit_error`] with an explicit writer; write failures are returned.
pub fn write_error(out: &mut impl Write, command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
        return Ok(());
    }

    writeln!(out, "error: {err}")?;
    if let Some(hint) = next_steps.first() {
        writeln!(out, "hint: {hint}")?;
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    if !output.summary.is_empty() {
        lines.push(String::new());
        for (key, value) in &output.summary {
            if value.is_empty() {
                lines.push(format!("  {key}"));
            } else {
                lines.push(format!("  {key}: {value}"));
            }
        }
    }
    if !output.rows.is_empty() {
        lines.push(String::new());
        lines.extend(output.rows.iter().map(|row| format!("  {row}")));
    }
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// Best-effort command name for error envelopes raised before dispatch.
pub fn infer_command_name_from_args() -> String {
    let mut positional = std::env::args().skip(1).filter(|arg| !arg.starts_with('-'));
    match positional.next() {
        None => "tasksphere".to_string(),
        Some(command) if command == "task" => match positional.next() {
            Some(sub) => format!("task {sub}"),
            None => command,
        },
        Some(command) => command,
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::Auth(auth) => auth.kind(),
        Error::NotAuthenticated => "unauthenticated",
        Error::TaskNotFound(_) => "not_found",
        _ => match err.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::AUTH_DENIED => "auth_denied",
            _ => "operation_failed",
        },
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotAuthenticated => vec!["tasksphere login --email <email>".to_string()],
        Error::Auth(AuthError::UserNotFound) => {
            vec!["tasksphere signup --name <name> --email <email>".to_string()]
        }
        Error::Auth(AuthError::InvalidPassword) => {
            vec!["tasksphere reset-password --email <email>".to_string()]
        }
        Error::Auth(AuthError::EmailAlreadyRegistered) => {
            vec!["tasksphere login --email <email>".to_string()]
        }
        Error::TaskNotFound(_) => vec!["tasksphere task ls".to_string()],
        Error::InvalidConfig(_) => vec!["fix tasksphere.toml in the data directory".to_string()],
        _ => Vec::new(),
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}
