//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_NOTIFICATION_TTL, UploadLimits};

const DEFAULT_API_BASE: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration values for the storage service client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DEDUP_CLIENT")]
pub struct ClientSettings {
    /// Base URL of the storage service.
    pub api_base: Option<String>,
    /// Largest file accepted for upload, in bytes.
    pub max_file_size_bytes: Option<u64>,
    /// How long an alert stays visible, in milliseconds.
    pub notification_ttl_ms: Option<u64>,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Username used to sign in when no session is restored.
    pub username: Option<String>,
    /// Password used with `username`.
    pub password: Option<String>,
}

impl ClientSettings {
    /// Configured base URL, falling back to the local development server.
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Upload limits derived from configuration.
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size_bytes: self
                .max_file_size_bytes
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
        }
    }

    /// Alert lifetime.
    pub fn notification_ttl(&self) -> Duration {
        self.notification_ttl_ms
            .map_or(DEFAULT_NOTIFICATION_TTL, Duration::from_millis)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Username and password, when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username.as_deref().zip(self.password.as_deref())
    }
}
