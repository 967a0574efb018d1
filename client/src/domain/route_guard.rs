//! Navigation decisions derived from session state.
//!
//! Everything here is a pure function of a [`SessionState`] snapshot; callers
//! re-evaluate whenever the session manager publishes a change.

use std::fmt;

use super::files::FileId;
use super::session::SessionState;

/// Access class of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteAccess {
    /// Reachable without a session.
    Public,
    /// Requires any session.
    Protected,
    /// Requires an administrator session.
    AdminProtected,
}

/// Where a redirect sends the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteTarget {
    /// Sign-in page.
    Login,
    /// Signed-in landing page.
    Home,
    /// Administrator dashboard.
    AdminDashboard,
    /// Root path, which redirects again by role.
    Root,
}

impl RouteTarget {
    /// Path rendered for this target.
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Home => "/home",
            Self::AdminDashboard => "/admin",
            Self::Root => "/",
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of a route evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDecision {
    /// Session state is still loading; show a placeholder.
    Pending,
    /// Navigate elsewhere.
    Redirect(RouteTarget),
    /// Render the requested route.
    Allow,
}

/// Decide access to a route of class `access`.
///
/// # Examples
/// ```
/// use dedup_client::domain::route_guard::evaluate;
/// use dedup_client::domain::{RouteAccess, RouteDecision, RouteTarget, SessionState};
///
/// let signed_out = SessionState { loading: false, session: None };
/// assert_eq!(
///     evaluate(&signed_out, RouteAccess::Protected),
///     RouteDecision::Redirect(RouteTarget::Login),
/// );
/// assert_eq!(evaluate(&SessionState::initial(), RouteAccess::Public), RouteDecision::Pending);
/// ```
pub fn evaluate(state: &SessionState, access: RouteAccess) -> RouteDecision {
    if state.loading {
        return RouteDecision::Pending;
    }
    match access {
        RouteAccess::Public => RouteDecision::Allow,
        RouteAccess::Protected | RouteAccess::AdminProtected if !state.is_authenticated() => {
            RouteDecision::Redirect(RouteTarget::Login)
        }
        RouteAccess::AdminProtected if !state.is_admin() => {
            RouteDecision::Redirect(RouteTarget::Home)
        }
        RouteAccess::Protected | RouteAccess::AdminProtected => RouteDecision::Allow,
    }
}

/// Decide where the root path leads.
pub fn resolve_root(state: &SessionState) -> RouteDecision {
    if state.loading {
        return RouteDecision::Pending;
    }
    let target = match &state.session {
        Some(session) if session.is_admin() => RouteTarget::AdminDashboard,
        Some(_) => RouteTarget::Home,
        None => RouteTarget::Login,
    };
    RouteDecision::Redirect(target)
}

/// Decide access for a raw path.
pub fn decide(state: &SessionState, path: &str) -> RouteDecision {
    AppRoute::parse(path).decide(state)
}

/// Routes known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    /// `/login`
    Login,
    /// `/signup`
    Signup,
    /// `/`
    Root,
    /// `/home`
    Home,
    /// `/admin`
    Admin,
    /// `/role-management`
    RoleManagement,
    /// `/fileDetails/{id}`
    FileDetails(FileId),
    /// Anything else.
    Unknown,
}

impl AppRoute {
    /// Classify `path`. A trailing slash and a query string are ignored.
    ///
    /// # Examples
    /// ```
    /// use dedup_client::domain::{AppRoute, FileId};
    ///
    /// assert_eq!(AppRoute::parse("/fileDetails/12"), AppRoute::FileDetails(FileId::new(12)));
    /// assert_eq!(AppRoute::parse("/home/"), AppRoute::Home);
    /// assert_eq!(AppRoute::parse("/nowhere"), AppRoute::Unknown);
    /// ```
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Root,
            "/login" => Self::Login,
            "/signup" => Self::Signup,
            "/home" => Self::Home,
            "/admin" => Self::Admin,
            "/role-management" => Self::RoleManagement,
            other => other
                .strip_prefix("/fileDetails/")
                .and_then(|id| id.parse().ok())
                .map_or(Self::Unknown, Self::FileDetails),
        }
    }

    /// Access class; `None` for routes that always redirect.
    pub fn access(self) -> Option<RouteAccess> {
        match self {
            Self::Login | Self::Signup | Self::FileDetails(_) => Some(RouteAccess::Public),
            Self::Home => Some(RouteAccess::Protected),
            Self::Admin | Self::RoleManagement => Some(RouteAccess::AdminProtected),
            Self::Root | Self::Unknown => None,
        }
    }

    /// Decide access to this route.
    pub fn decide(self, state: &SessionState) -> RouteDecision {
        match (self, self.access()) {
            (Self::Root, _) => resolve_root(state),
            (_, Some(access)) => evaluate(state, access),
            (_, None) => RouteDecision::Redirect(RouteTarget::Root),
        }
    }
}
