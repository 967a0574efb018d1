//! Authentication endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value, json};

use super::client::{HttpClient, decode};
use super::dto::MeResponseDto;
use crate::domain::ports::AuthGateway;
use crate::domain::{ApiError, LoginCredentials, Session, SignupDetails};

/// [`AuthGateway`] over the service's JSON API.
#[derive(Clone)]
pub struct HttpAuthGateway {
    http: Arc<HttpClient>,
}

impl HttpAuthGateway {
    /// Wrap a shared client.
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

fn signup_body(details: &SignupDetails) -> Value {
    let mut body = Map::new();
    body.insert("username".to_owned(), json!(details.username()));
    if let Some(email) = details.email() {
        body.insert("email".to_owned(), json!(email));
    }
    body.insert("password".to_owned(), json!(details.password()));
    Value::Object(body)
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn current_user(&self) -> Result<Session, ApiError> {
        let body = self.http.request(Method::GET, "/api/me", None).await?;
        decode::<MeResponseDto>(body).map(MeResponseDto::into_session)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<(), ApiError> {
        let body = json!({
            "username": credentials.username(),
            "password": credentials.password(),
        });
        self.http
            .request(Method::POST, "/api/login", Some(&body))
            .await
            .map(drop)
    }

    async fn signup(&self, details: &SignupDetails) -> Result<(), ApiError> {
        self.http
            .request(Method::POST, "/api/signup", Some(&signup_body(details)))
            .await
            .map(drop)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.http
            .request(Method::POST, "/api/logout", Some(&json!({})))
            .await
            .map(drop)
    }
}
