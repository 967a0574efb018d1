//! Driven port for surfacing ambient alerts.
//!
//! The HTTP client and the upload orchestrator post rate-limit messages here
//! without knowing how (or whether) the shell displays them.

/// Sink for process-wide ambient alerts.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink: Send + Sync {
    /// Publish `message`, replacing whatever alert is currently shown.
    fn post(&self, message: &str);
}

/// Sink that drops every alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAlertSink;

impl AlertSink for NoOpAlertSink {
    fn post(&self, _message: &str) {}
}
