//! Credential and session manager.
//!
//! Lifecycle:
//!
//! ```text
//! Unauthenticated --(login ok | signup ok)--> Authenticated(token)
//! Authenticated   --(logout | expiry seen by check)--> Unauthenticated
//! ```
//!
//! Expiry is observed lazily: the state is evaluated when the manager is
//! created (once per process start), when [`AuthManager::check_session`] is
//! called, and after a change to the user or session arrives from storage.
//! Nothing polls the clock in the background.
//!
//! There is a single stored user and at most one live session per data
//! directory. `login`, `signup` and `reset_password` wait out a fixed
//! simulated latency on a spawned task; the work is not cancelled if the
//! caller stops awaiting it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::credential;
use crate::error::{AuthError, AuthResult};
use crate::session::{self, SessionToken};
use crate::storage::{self, KeyValueStore, StorageChange, SESSION_KEY, USER_KEY};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashed_password: Option<String>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("points", &self.points)
            .field("streak", &self.streak)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(SessionToken),
}

/// Serializable `{success, token?, error?}` view of an auth result.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn from_session(result: &AuthResult<SessionToken>) -> Self {
        match result {
            Ok(session) => Self {
                success: true,
                token: Some(session.token),
                error: None,
            },
            Err(err) => Self::failure(err),
        }
    }

    pub fn from_unit(result: &AuthResult<()>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                token: None,
                error: None,
            },
            Err(err) => Self::failure(err),
        }
    }

    fn failure(err: &AuthError) -> Self {
        Self {
            success: false,
            token: None,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Debug)]
struct AuthInner {
    user: Option<User>,
    session: Option<SessionToken>,
    state: AuthState,
}

/// Owns the user record, its credential and the session token.
#[derive(Clone)]
pub struct AuthManager {
    inner: Arc<Mutex<AuthInner>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl AuthManager {
    /// Load persisted auth state and run the start-up session check.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: AuthConfig) -> Self {
        let user: Option<User> = storage::read_or_default(store.as_ref(), USER_KEY, None);
        let session: Option<SessionToken> =
            storage::read_or_default(store.as_ref(), SESSION_KEY, None);
        let manager = Self {
            inner: Arc::new(Mutex::new(AuthInner {
                user,
                session,
                state: AuthState::Unauthenticated,
            })),
            store,
            clock,
            config,
        };
        manager.check_session();
        manager
    }

    /// Re-read the user and session from storage and check the session.
    pub fn restore(&self) -> bool {
        let user: Option<User> = storage::read_or_default(self.store.as_ref(), USER_KEY, None);
        let session: Option<SessionToken> =
            storage::read_or_default(self.store.as_ref(), SESSION_KEY, None);
        {
            let mut inner = self.lock();
            inner.user = user;
            inner.session = session;
        }
        self.check_session()
    }

    fn lock(&self) -> MutexGuard<'_, AuthInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> AuthState {
        self.lock().state.clone()
    }

    /// Result of the most recent check; does not consult the clock.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.lock().state, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn session(&self) -> Option<SessionToken> {
        self.lock().session.clone()
    }

    /// Re-evaluate the session against the clock.
    ///
    /// Authenticated only with a stored user and an unexpired token;
    /// otherwise any stale token is cleared from storage.
    pub fn check_session(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.lock();
        let valid = inner.user.is_some() && session::is_valid(inner.session.as_ref(), now);
        if valid {
            if let Some(token) = inner.session.clone() {
                inner.state = AuthState::Authenticated(token);
            }
            return true;
        }

        inner.state = AuthState::Unauthenticated;
        if inner.session.take().is_some() {
            drop(inner);
            tracing::info!("session expired or orphaned; clearing");
            self.persist_session(None);
        }
        false
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<SessionToken> {
        let email = email.to_string();
        let password = password.to_string();
        self.run_delayed("login", move |auth| auth.login_now(&email, &password))
            .await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> AuthResult<SessionToken> {
        let name = name.to_string();
        let email = email.to_string();
        let password = password.to_string();
        self.run_delayed("signup", move |auth| auth.signup_now(&name, &email, &password))
            .await
    }

    /// Always succeeds; no credential is changed and nothing is sent.
    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        let email = email.to_string();
        self.run_delayed("reset_password", move |_| {
            tracing::info!(email = %email, "password reset requested");
            Ok(())
        })
        .await
    }

    /// Drop the session. The user record stays, so logging in again works.
    pub fn logout(&self) {
        {
            let mut inner = self.lock();
            inner.session = None;
            inner.state = AuthState::Unauthenticated;
        }
        self.persist_session(None);
        tracing::info!("logged out");
    }

    /// Adopt a user or session written elsewhere (last write wins), then
    /// re-check the session. Returns whether anything was applied.
    pub fn apply_change(&self, change: &StorageChange) -> bool {
        let Some(value) = change.value.clone() else {
            return false;
        };
        match change.key.as_str() {
            USER_KEY => match serde_json::from_value::<Option<User>>(value) {
                Ok(user) => self.lock().user = user,
                Err(err) => {
                    tracing::warn!(%err, "ignoring malformed external user");
                    return false;
                }
            },
            SESSION_KEY => match serde_json::from_value::<Option<SessionToken>>(value) {
                Ok(session) => self.lock().session = session,
                Err(err) => {
                    tracing::warn!(%err, "ignoring malformed external session");
                    return false;
                }
            },
            _ => return false,
        }
        self.check_session();
        true
    }

    async fn run_delayed<T, F>(&self, operation: &'static str, op: F) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&AuthManager) -> AuthResult<T> + Send + 'static,
    {
        let this = self.clone();
        let latency = self.config.latency();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            tokio::task::spawn_blocking(move || op(&this)).await
        });
        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) | Err(err) => {
                tracing::error!(operation, %err, "auth operation aborted");
                Err(AuthError::Failed(format!("{operation} failed")))
            }
        }
    }

    fn login_now(&self, email: &str, password: &str) -> AuthResult<SessionToken> {
        let stored: Option<User> = storage::read_or_default(self.store.as_ref(), USER_KEY, None);
        let user = match stored {
            Some(user) if user.email == email => user,
            _ => return Err(AuthError::UserNotFound),
        };

        let verified = user
            .hashed_password
            .as_deref()
            .is_some_and(|stored| credential::verify_password(password, stored));
        if !verified {
            tracing::info!(user_id = %user.id, "login rejected");
            return Err(AuthError::InvalidPassword);
        }

        let session = session::issue_session(self.clock.now());
        self.establish(user, session.clone(), "Login failed")?;
        Ok(session)
    }

    fn signup_now(&self, name: &str, email: &str, password: &str) -> AuthResult<SessionToken> {
        let stored: Option<User> = storage::read_or_default(self.store.as_ref(), USER_KEY, None);
        if stored.as_ref().is_some_and(|user| user.email == email) {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let hashed = credential::hash_password(password)?;
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            avatar: None,
            points: 0,
            streak: 0,
            hashed_password: Some(hashed),
        };

        let session = session::issue_session(self.clock.now());
        self.establish(user, session.clone(), "Signup failed")?;
        Ok(session)
    }

    fn establish(&self, user: User, session: SessionToken, failure: &str) -> AuthResult<()> {
        let user_id = user.id;
        storage::write_value(self.store.as_ref(), USER_KEY, &Some(&user))
            .and_then(|_| storage::write_value(self.store.as_ref(), SESSION_KEY, &Some(&session)))
            .map_err(|err| {
                tracing::error!(%err, "could not persist auth state");
                AuthError::Failed(failure.to_string())
            })?;

        let mut inner = self.lock();
        inner.user = Some(user);
        inner.session = Some(session.clone());
        inner.state = AuthState::Authenticated(session);
        tracing::info!(user_id = %user_id, "authenticated");
        Ok(())
    }

    fn persist_session(&self, session: Option<&SessionToken>) {
        if let Err(err) = storage::write_value(self.store.as_ref(), SESSION_KEY, &session) {
            tracing::warn!(%err, "could not persist session");
        }
    }
}
