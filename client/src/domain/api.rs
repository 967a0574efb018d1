//! Failure and body shapes produced by the HTTP client.
//!
//! These types are transport agnostic. The reqwest adapter converts
//! non-success responses and network failures into [`ApiError`]; domain
//! services classify the error without importing any HTTP crate.

use std::fmt;

use serde_json::Value;

/// Substring, compared case-insensitively, that marks a rate-limit rejection.
pub const RATE_LIMIT_PATTERN: &str = "rate limit exceeded";

/// Return whether `message` carries the server's rate-limit signal.
///
/// # Examples
/// ```
/// use dedup_client::domain::is_rate_limit_message;
///
/// assert!(is_rate_limit_message("Rate Limit Exceeded, try again later"));
/// assert!(!is_rate_limit_message("Quota exceeded"));
/// ```
pub fn is_rate_limit_message(message: &str) -> bool {
    message.to_lowercase().contains(RATE_LIMIT_PATTERN)
}

/// Broad category describing where a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ApiErrorKind {
    /// The server answered with a non-success status.
    Status,
    /// The request never produced a response (connection, timeout).
    Transport,
    /// A successful response could not be decoded into the expected shape.
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => f.write_str("status"),
            Self::Transport => f.write_str("transport"),
            Self::Decode => f.write_str("decode"),
        }
    }
}

/// Error raised by the HTTP client.
///
/// ## Invariants
/// - `status` is present exactly when `kind` is [`ApiErrorKind::Status`].
/// - `details` carries the full failure envelope for upload calls.
///
/// # Examples
/// ```
/// use dedup_client::domain::{ApiError, ApiErrorKind};
/// use serde_json::json;
///
/// let err = ApiError::from_status(403, "Quota exceeded")
///     .with_details(json!({ "allowed": 100, "used": 120 }));
/// assert_eq!(err.kind(), ApiErrorKind::Status);
/// assert_eq!(err.status(), Some(403));
/// assert!(err.details().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: Option<u16>,
    details: Option<Value>,
}

impl ApiError {
    /// Error for a response that carried a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Status,
            message: message.into(),
            status: Some(status),
            details: None,
        }
    }

    /// Error for a request that failed before a response arrived.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// Error for a response body that did not match the expected shape.
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// Attach the structured failure envelope.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Failure category.
    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// Human-readable message derived from the failure envelope.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Structured failure envelope, when one was captured.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Whether the message carries the rate-limit signal.
    pub fn is_rate_limited(&self) -> bool {
        is_rate_limit_message(&self.message)
    }
}

/// Response body parsed defensively: JSON when possible, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The body was empty.
    Empty,
    /// The body parsed as JSON.
    Json(Value),
    /// The body was not valid JSON; the raw text is preserved.
    Text(String),
}

impl ResponseBody {
    /// Parse a raw body. Never fails: invalid JSON falls back to text.
    ///
    /// # Examples
    /// ```
    /// use dedup_client::domain::ResponseBody;
    /// use serde_json::json;
    ///
    /// assert_eq!(ResponseBody::parse(""), ResponseBody::Empty);
    /// assert_eq!(ResponseBody::parse("{\"ok\":true}"), ResponseBody::Json(json!({ "ok": true })));
    /// assert_eq!(ResponseBody::parse("oops"), ResponseBody::Text("oops".to_owned()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str(raw) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(raw.to_owned()),
        }
    }

    /// Message carried by a failure envelope: `error`, then `message`.
    ///
    /// Blank strings are ignored so the caller can fall back to its default.
    pub fn envelope_message(&self) -> Option<String> {
        match self {
            Self::Json(value) => envelope_message(value),
            Self::Empty | Self::Text(_) => None,
        }
    }

    /// Convert into a JSON value; empty bodies become `null`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// Extract the `error` or `message` field from a failure envelope.
pub(crate) fn envelope_message(value: &Value) -> Option<String> {
    ["error", "message"].into_iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_owned)
    })
}
