//! Role management endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::client::HttpClient;
use crate::domain::ports::RoleAdministration;
use crate::domain::{ApiError, ResponseBody};

/// [`RoleAdministration`] over the service's JSON API.
#[derive(Clone)]
pub struct HttpRoleGateway {
    http: Arc<HttpClient>,
}

impl HttpRoleGateway {
    /// Wrap a shared client.
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    async fn post_username(&self, path: &str, username: &str) -> Result<ResponseBody, ApiError> {
        let body = json!({ "username": username });
        self.http.request(Method::POST, path, Some(&body)).await
    }
}

#[async_trait]
impl RoleAdministration for HttpRoleGateway {
    async fn make_admin(&self, username: &str) -> Result<ResponseBody, ApiError> {
        self.post_username("/api/makeAdmin", username).await
    }

    async fn make_user(&self, username: &str) -> Result<ResponseBody, ApiError> {
        self.post_username("/api/makeUser", username).await
    }
}
