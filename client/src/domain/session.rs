//! Authenticated session model.

use std::fmt;

use tracing::{debug, warn};

use super::api::{ApiError, ApiErrorKind};

/// Role granted to the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Regular account.
    User,
    /// Administrator; may open the admin dashboard and manage roles.
    Admin,
}

impl Role {
    /// Map the server's role string. Only `admin` grants admin access.
    ///
    /// # Examples
    /// ```
    /// use dedup_client::domain::Role;
    ///
    /// assert_eq!(Role::from_server("admin"), Role::Admin);
    /// assert_eq!(Role::from_server("user"), Role::User);
    /// assert_eq!(Role::from_server("moderator"), Role::User);
    /// ```
    pub fn from_server(raw: &str) -> Self {
        if raw == "admin" { Self::Admin } else { Self::User }
    }

    /// Whether this role is [`Role::Admin`].
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Server-side user id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Contact email, when the account has one.
    pub email: Option<String>,
    /// Granted role.
    pub role: Role,
}

impl Session {
    /// Whether the session belongs to an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Observable session state.
///
/// ## Invariants
/// - `session == None` means unauthenticated; it is never an error by itself.
/// - `role` is only meaningful while a session is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// A session operation is in flight and the outcome is not known yet.
    pub loading: bool,
    /// Current identity, if any.
    pub session: Option<Session>,
}

impl SessionState {
    /// State before the first restore completes.
    pub fn initial() -> Self {
        Self {
            loading: true,
            session: None,
        }
    }

    /// Whether a session is present.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the current session belongs to an administrator.
    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Outcome of a failed session restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RestoreFailure {
    /// Treat the user as signed out.
    Unauthenticated,
}

/// Classify a failed restore.
///
/// Every cause (401, other statuses, network failure, malformed profile)
/// currently collapses to [`RestoreFailure::Unauthenticated`]. Callers only
/// match on the returned value, so splitting out transient failures later
/// does not touch them.
pub fn classify_restore_failure(error: &ApiError) -> RestoreFailure {
    match (error.kind(), error.status()) {
        (ApiErrorKind::Status, Some(401)) => {
            debug!("no active session");
        }
        (kind, status) => {
            warn!(%kind, ?status, error = %error, "session restore failed; treating as signed out");
        }
    }
    RestoreFailure::Unauthenticated
}
