//! Account and session commands.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthManager, User};
use crate::cli::AppContext;
use crate::error::{AuthResult, Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::session::SessionToken;

pub struct SignupOptions {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct LoginOptions {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct SessionOutput {
    user_id: Uuid,
    name: String,
    email: String,
    expires: DateTime<Utc>,
}

#[derive(Serialize)]
struct WhoamiOutput {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires: Option<DateTime<Utc>>,
    data_dir: String,
}

#[derive(Serialize)]
struct UserSummary {
    id: Uuid,
    name: String,
    email: String,
    points: u32,
    streak: u32,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            points: user.points,
            streak: user.streak,
        }
    }
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Drive one auth future to completion on a single-threaded runtime.
fn block_on<T>(future: impl Future<Output = AuthResult<T>>) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future)?)
}

fn session_output(auth: &AuthManager, session: &SessionToken) -> Result<SessionOutput> {
    let user = auth
        .user()
        .ok_or_else(|| Error::OperationFailed("session issued without a user".to_string()))?;
    Ok(SessionOutput {
        user_id: user.id,
        name: user.name,
        email: user.email,
        expires: session.expires,
    })
}

fn session_human(header: &str, output: &SessionOutput) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("User", format!("{} <{}>", output.name, output.email));
    human.push_summary("Expires", output.expires.to_rfc3339());
    human.push_next_step("tasksphere focus");
    human
}

pub fn run_signup(ctx: &AppContext, options: SignupOptions, output: OutputOptions) -> Result<()> {
    required("name", &options.name)?;
    required("email", &options.email)?;
    required("password", &options.password)?;

    let auth = ctx.auth();
    let session = block_on(auth.signup(
        options.name.trim(),
        options.email.trim(),
        &options.password,
    ))?;
    let data = session_output(&auth, &session)?;
    let human = session_human("Signed up", &data);
    emit_success(output, "signup", &data, Some(&human))
}

pub fn run_login(ctx: &AppContext, options: LoginOptions, output: OutputOptions) -> Result<()> {
    required("email", &options.email)?;
    required("password", &options.password)?;

    let auth = ctx.auth();
    let session = block_on(auth.login(options.email.trim(), &options.password))?;
    let data = session_output(&auth, &session)?;
    let human = session_human("Logged in", &data);
    emit_success(output, "login", &data, Some(&human))
}

pub fn run_logout(ctx: &AppContext, output: OutputOptions) -> Result<()> {
    let auth = ctx.auth();
    let was_authenticated = auth.is_authenticated();
    auth.logout();

    #[derive(Serialize)]
    struct LogoutOutput {
        was_authenticated: bool,
    }

    let header = if was_authenticated {
        "Logged out"
    } else {
        "No active session"
    };
    let human = HumanOutput::new(header);
    emit_success(output, "logout", &LogoutOutput { was_authenticated }, Some(&human))
}

pub fn run_whoami(ctx: &AppContext, output: OutputOptions) -> Result<()> {
    let auth = ctx.auth();
    let user = auth.user();
    let authenticated = auth.is_authenticated();
    let expires = if authenticated {
        auth.session().map(|session| session.expires)
    } else {
        None
    };
    let data = WhoamiOutput {
        authenticated,
        user: user.as_ref().map(UserSummary::from),
        expires,
        data_dir: ctx.data_dir.display().to_string(),
    };

    let mut human = HumanOutput::new(if authenticated {
        "Logged in"
    } else {
        "Not logged in"
    });
    if let Some(user) = &data.user {
        human.push_summary("User", format!("{} <{}>", user.name, user.email));
        human.push_summary("Points", user.points.to_string());
        human.push_summary("Streak", user.streak.to_string());
    }
    if let Some(expires) = data.expires {
        human.push_summary("Expires", expires.to_rfc3339());
    }
    human.push_summary("Data dir", data.data_dir.clone());
    match (&data.user, authenticated) {
        (None, _) => human.push_next_step("tasksphere signup --name <name> --email <email>"),
        (Some(user), false) => human.push_next_step(format!("tasksphere login --email {}", user.email)),
        (Some(_), true) => {}
    }
    emit_success(output, "whoami", &data, Some(&human))
}

pub fn run_reset_password(ctx: &AppContext, email: &str, output: OutputOptions) -> Result<()> {
    required("email", email)?;
    let auth = ctx.auth();
    block_on(auth.reset_password(email.trim()))?;

    #[derive(Serialize)]
    struct ResetOutput<'a> {
        email: &'a str,
        requested: bool,
    }

    let mut human = HumanOutput::new("Password reset requested");
    human.push_summary("Email", email.trim());
    human.push_warning("no reset message is sent; the current password stays valid");
    emit_success(
        output,
        "reset-password",
        &ResetOutput {
            email: email.trim(),
            requested: true,
        },
        Some(&human),
    )
}
