//! Session context domain model.
//!
//! Represents the logged-in user's identity for the lifetime of a client
//! session. Created at successful login, persisted through a
//! [`SessionStore`](super::repository::SessionStore), cleared at logout.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The logged-in user's identity.
///
/// Services that act on behalf of the user receive this context (or the
/// manager holding it) explicitly at construction; there is no global
/// username anywhere in the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Username the backend keys notifications and submissions by
    pub username: String,
    /// Display name returned at login
    pub display_name: String,
    /// RFC 3339 timestamp of the login that created this session
    pub logged_in_at: String,
}

impl SessionContext {
    /// Creates a context for a login that just succeeded.
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            logged_in_at: Utc::now().to_rfc3339(),
        }
    }
}
