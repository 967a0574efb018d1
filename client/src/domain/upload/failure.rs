//! Classification of upload failures.
//!
//! Checks run in a fixed order: rate limiting, quota, content validation,
//! then the generic fallback.

use serde_json::Value;

use crate::domain::api::ApiError;

const DEFAULT_UPLOAD_FAILURE: &str = "Upload failed";
const CONTENT_MISMATCH_MESSAGE: &str = "file extension does not match detected MIME type";
const PRECONDITION_FAILED_CODE: &str = "StatusPreconditionFailed";

/// Why a single upload failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// The service is throttling; the batch stops.
    RateLimited {
        /// Message to surface on the notification bus.
        message: String,
    },
    /// Storage quota exhausted.
    QuotaExceeded {
        /// Item message including the allowed and used figures.
        message: String,
    },
    /// Detected MIME type disagrees with the file extension.
    ContentMismatch,
    /// Anything else.
    Other {
        /// Service message, or the static default.
        message: String,
    },
}

impl UploadFailure {
    /// Classify an upload error.
    ///
    /// # Examples
    /// ```
    /// use dedup_client::domain::{ApiError, UploadFailure};
    /// use serde_json::json;
    ///
    /// let quota = ApiError::from_status(403, "quota exceeded").with_details(json!({
    ///     "error": "quota exceeded", "allowed": 100, "used": 120
    /// }));
    /// assert_eq!(
    ///     UploadFailure::classify(&quota).message(),
    ///     "quota exceeded (Allowed: 100, Used: 120)",
    /// );
    /// ```
    pub fn classify(error: &ApiError) -> Self {
        if error.is_rate_limited() {
            return Self::RateLimited {
                message: error.message().to_owned(),
            };
        }
        if let Some(message) = quota_message(error) {
            return Self::QuotaExceeded { message };
        }
        if is_content_mismatch(error) {
            return Self::ContentMismatch;
        }
        let message = if error.message().is_empty() {
            DEFAULT_UPLOAD_FAILURE.to_owned()
        } else {
            error.message().to_owned()
        };
        Self::Other { message }
    }

    /// Whether the batch must stop.
    pub fn aborts_batch(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Text for this failure: the alert when the batch aborts, otherwise the
    /// item message.
    pub fn message(&self) -> &str {
        match self {
            Self::RateLimited { message }
            | Self::QuotaExceeded { message }
            | Self::Other { message } => message,
            Self::ContentMismatch => CONTENT_MISMATCH_MESSAGE,
        }
    }
}

fn quota_message(error: &ApiError) -> Option<String> {
    if error.status() != Some(403) {
        return None;
    }
    let details = error.details()?;
    let reason = details.get("error")?;
    let allowed = details.get("allowed")?;
    let used = details.get("used")?;
    Some(format!(
        "{} (Allowed: {}, Used: {})",
        render(reason),
        render(allowed),
        render(used)
    ))
}

fn is_content_mismatch(error: &ApiError) -> bool {
    if error.status() == Some(412) {
        return true;
    }
    error
        .details()
        .and_then(|details| details.get("code"))
        .and_then(Value::as_str)
        .is_some_and(|code| code == PRECONDITION_FAILED_CODE)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    //! Precedence and message coverage.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn rate_limit_wins_over_quota_shape() {
        let error = ApiError::from_status(403, "Rate limit exceeded, try again later")
            .with_details(json!({ "error": "x", "allowed": 1, "used": 2 }));
        let failure = UploadFailure::classify(&error);
        assert!(failure.aborts_batch());
        assert_eq!(failure.message(), "Rate limit exceeded, try again later");
    }

    #[rstest]
    #[case(json!({ "error": "Quota exceeded", "allowed": 1048576, "used": 2097152 }),
        "Quota exceeded (Allowed: 1048576, Used: 2097152)")]
    #[case(json!({ "error": "over", "allowed": "1 MB", "used": "2 MB" }),
        "over (Allowed: 1 MB, Used: 2 MB)")]
    fn quota_messages_include_figures(#[case] details: Value, #[case] expected: &str) {
        let error = ApiError::from_status(403, "Quota exceeded").with_details(details);
        let failure = UploadFailure::classify(&error);
        assert!(!failure.aborts_batch());
        assert_eq!(failure.message(), expected);
    }

    #[test]
    fn forbidden_without_quota_details_falls_back_to_message() {
        let error = ApiError::from_status(403, "forbidden").with_details(json!({ "error": "forbidden" }));
        assert_eq!(
            UploadFailure::classify(&error),
            UploadFailure::Other {
                message: "forbidden".to_owned()
            }
        );
    }

    #[rstest]
    #[case(ApiError::from_status(412, "Precondition Failed").with_details(json!({})))]
    #[case(ApiError::from_status(400, "bad").with_details(json!({ "code": "StatusPreconditionFailed" })))]
    fn content_mismatch_is_detected(#[case] error: ApiError) {
        let failure = UploadFailure::classify(&error);
        assert_eq!(failure, UploadFailure::ContentMismatch);
        assert!(!failure.aborts_batch());
        assert_eq!(
            failure.message(),
            "file extension does not match detected MIME type"
        );
    }

    #[rstest]
    #[case(ApiError::from_status(500, ""), "Upload failed")]
    #[case(ApiError::from_status(500, "disk full"), "disk full")]
    #[case(ApiError::transport("connection reset"), "connection reset")]
    fn generic_failures_use_message_or_default(#[case] error: ApiError, #[case] expected: &str) {
        let failure = UploadFailure::classify(&error);
        assert!(!failure.aborts_batch());
        assert_eq!(failure.message(), expected);
    }
}
