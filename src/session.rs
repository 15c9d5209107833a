//! Session tokens: a random UUID with a fixed 24 hour lifetime.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a freshly issued session
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: Uuid,
    pub expires: DateTime<Utc>,
}

impl SessionToken {
    /// Valid strictly before `expires`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

pub fn session_ttl() -> Duration {
    Duration::hours(SESSION_TTL_HOURS)
}

pub fn issue_session(now: DateTime<Utc>) -> SessionToken {
    SessionToken {
        token: Uuid::new_v4(),
        expires: now + session_ttl(),
    }
}

/// `false` for a missing token.
pub fn is_valid(token: Option<&SessionToken>, now: DateTime<Utc>) -> bool {
    token.is_some_and(|token| token.is_valid_at(now))
}
