//! Driven port for administrator role management.

use async_trait::async_trait;

use crate::domain::{ApiError, ResponseBody};

/// Role management endpoints (admin only on the server side).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleAdministration: Send + Sync {
    /// Promote `username` to administrator (`POST /api/makeAdmin`).
    async fn make_admin(&self, username: &str) -> Result<ResponseBody, ApiError>;

    /// Demote `username` to a regular user (`POST /api/makeUser`).
    async fn make_user(&self, username: &str) -> Result<ResponseBody, ApiError>;
}
