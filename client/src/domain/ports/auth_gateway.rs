//! Driven port for the service's authentication endpoints.
//!
//! The session manager drives this port; the reqwest adapter implements it.
//! Keeping it a trait lets session tests script responses and race calls
//! without a live server.

use async_trait::async_trait;

use crate::domain::{ApiError, LoginCredentials, Session, SignupDetails};

/// Authentication endpoints of the storage service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Fetch the profile for the current credentials (`GET /api/me`).
    ///
    /// Accepts either a bare profile or a `{user: profile}` envelope.
    async fn current_user(&self) -> Result<Session, ApiError>;

    /// Start a session (`POST /api/login`). The response body is ignored.
    async fn login(&self, credentials: &LoginCredentials) -> Result<(), ApiError>;

    /// Register an account (`POST /api/signup`). The response body is ignored.
    async fn signup(&self, details: &SignupDetails) -> Result<(), ApiError>;

    /// End the session (`POST /api/logout`).
    async fn logout(&self) -> Result<(), ApiError>;
}
