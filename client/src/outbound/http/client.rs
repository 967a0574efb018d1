//! Shared reqwest client for the storage service.
//!
//! Every non-success response becomes an [`ApiError`] here and nowhere else.
//! Messages matching the rate-limit pattern are posted to the alert sink
//! before the error is returned. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::api::envelope_message;
use crate::domain::ports::AlertSink;
use crate::domain::{ApiError, ResponseBody, UploadSource};

const UPLOAD_FAILED: &str = "Upload failed";

/// Cookie-carrying HTTP client bound to one service base URL.
pub struct HttpClient {
    client: Client,
    base_url: Url,
    alerts: Arc<dyn AlertSink>,
}

impl HttpClient {
    /// Build a client with a request timeout and a session cookie store.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url,
            alerts,
        })
    }

    /// Absolute URL for an API path such as `/api/files`.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        Url::parse(&joined)
            .map_err(|error| ApiError::transport(format!("invalid request URL {joined}: {error}")))
    }

    /// Send a structured request with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ResponseBody, ApiError> {
        let mut builder = self.client.request(method.clone(), self.endpoint_url(path)?);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let (status, parsed) = self.send(builder, &method, path).await?;
        if status.is_success() {
            return Ok(parsed);
        }
        Err(self.raise(status_error(status, &parsed)))
    }

    /// `GET path` decoded into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.request(Method::GET, path, None).await?;
        decode(body)
    }

    /// Send `source` as multipart field `file`.
    ///
    /// Failures carry the full response envelope as details, or an empty
    /// object when the body was not JSON.
    pub async fn upload(&self, path: &str, source: &UploadSource) -> Result<ResponseBody, ApiError> {
        let part = Part::bytes(source.content().to_vec()).file_name(source.file_name().to_owned());
        let form = Form::new().part("file", part);
        let builder = self
            .client
            .post(self.endpoint_url(path)?)
            .multipart(form);
        let (status, parsed) = self.send(builder, &Method::POST, path).await?;
        if status.is_success() {
            return Ok(parsed);
        }
        Err(self.raise(upload_error(status, parsed)))
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<(StatusCode, ResponseBody), ApiError> {
        let response = builder
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        debug!(%method, path, status = status.as_u16(), "request completed");
        Ok((status, ResponseBody::parse(&text)))
    }

    fn raise(&self, error: ApiError) -> ApiError {
        if error.is_rate_limited() {
            self.alerts.post(error.message());
        }
        error
    }
}

/// Decode a successful body into `T`.
pub(super) fn decode<T: DeserializeOwned>(body: ResponseBody) -> Result<T, ApiError> {
    serde_json::from_value(body.into_value())
        .map_err(|error| ApiError::decode(format!("unexpected response shape: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::transport(format!("request timed out: {error}"))
    } else {
        ApiError::transport(error.to_string())
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| format!("status {}", status.as_u16()), str::to_owned)
}

fn status_error(status: StatusCode, body: &ResponseBody) -> ApiError {
    let message = body
        .envelope_message()
        .unwrap_or_else(|| status_text(status));
    ApiError::from_status(status.as_u16(), message)
}

fn upload_error(status: StatusCode, body: ResponseBody) -> ApiError {
    let details = match body {
        ResponseBody::Json(value) => value,
        ResponseBody::Empty | ResponseBody::Text(_) => json!({}),
    };
    let message = envelope_message(&details).unwrap_or_else(|| UPLOAD_FAILED.to_owned());
    ApiError::from_status(status.as_u16(), message).with_details(details)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network envelope mapping.
    use super::*;
    use crate::domain::ports::MockAlertSink;
    use rstest::rstest;

    #[rstest]
    #[case::error_field(StatusCode::BAD_REQUEST, r#"{"error":"bad input","message":"ignored"}"#, "bad input")]
    #[case::message_field(StatusCode::CONFLICT, r#"{"message":"already exists"}"#, "already exists")]
    #[case::blank_error(StatusCode::NOT_FOUND, r#"{"error":""}"#, "Not Found")]
    #[case::plain_text(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>", "Internal Server Error")]
    #[case::empty(StatusCode::UNAUTHORIZED, "", "Unauthorized")]
    fn structured_errors_prefer_envelope_then_status_text(
        #[case] status: StatusCode,
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        let error = status_error(status, &ResponseBody::parse(raw));
        assert_eq!(error.message(), expected);
        assert_eq!(error.status(), Some(status.as_u16()));
        assert!(error.details().is_none());
    }

    #[test]
    fn unknown_status_codes_fall_back_to_numeric_text() {
        let status = StatusCode::from_u16(599).expect("valid status code");
        assert_eq!(status_error(status, &ResponseBody::Empty).message(), "status 599");
    }

    #[rstest]
    #[case::envelope(r#"{"error":"Quota exceeded","allowed":5,"used":9}"#, "Quota exceeded", json!({"error":"Quota exceeded","allowed":5,"used":9}))]
    #[case::text_body("gateway exploded", "Upload failed", json!({}))]
    #[case::empty_body("", "Upload failed", json!({}))]
    #[case::no_message(r#"{"code":"StatusPreconditionFailed"}"#, "Upload failed", json!({"code":"StatusPreconditionFailed"}))]
    fn upload_errors_keep_envelope_as_details(
        #[case] raw: &str,
        #[case] expected_message: &str,
        #[case] expected_details: Value,
    ) {
        let error = upload_error(StatusCode::FORBIDDEN, ResponseBody::parse(raw));
        assert_eq!(error.message(), expected_message);
        assert_eq!(error.details(), Some(&expected_details));
    }

    fn client(alerts: MockAlertSink) -> HttpClient {
        HttpClient::new(
            Url::parse("http://localhost:8080/").expect("valid base URL"),
            Duration::from_secs(1),
            Arc::new(alerts),
        )
        .expect("client builds")
    }

    #[test]
    fn rate_limit_errors_are_posted_before_returning() {
        let mut alerts = MockAlertSink::new();
        alerts
            .expect_post()
            .withf(|message| message == "rate limit exceeded, try again later")
            .times(1)
            .return_const(());
        let client = client(alerts);

        let error = client.raise(ApiError::from_status(429, "rate limit exceeded, try again later"));
        assert!(error.is_rate_limited());
    }

    #[test]
    fn other_errors_are_not_posted() {
        let mut alerts = MockAlertSink::new();
        alerts.expect_post().never();
        let client = client(alerts);
        client.raise(ApiError::from_status(500, "Internal Server Error"));
    }

    #[test]
    fn endpoint_urls_join_without_double_slashes() {
        let client = client(MockAlertSink::new());
        assert_eq!(
            client
                .endpoint_url("/api/fileDownload/4")
                .expect("valid URL")
                .as_str(),
            "http://localhost:8080/api/fileDownload/4"
        );
    }

    #[test]
    fn decode_reports_shape_mismatches() {
        let error = decode::<Vec<u8>>(ResponseBody::Text("nope".to_owned()))
            .expect_err("text is not a list");
        assert_eq!(error.kind(), crate::domain::ApiErrorKind::Decode);
    }
}
