//! Constructor wiring for the client's domain services.
//!
//! One [`ClientServices`] value owns the notification bus, the shared HTTP
//! client, and every service built on top of it. Nothing is global: callers
//! create it, pass it around, and shut it down explicitly.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::domain::ports::{AlertSink, FileCatalogue, RoleAdministration, UploadListener};
use crate::domain::{NotificationBus, SessionManager, UploadQueue, UploadQueuePorts};
use crate::outbound::http::{HttpAuthGateway, HttpClient, HttpFileGateway, HttpRoleGateway};
use crate::settings::ClientSettings;

/// Failure while assembling [`ClientServices`].
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// The configured base URL did not parse.
    #[error("invalid api base URL {value}: {source}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The reqwest client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Fully wired client services.
pub struct ClientServices {
    /// Ambient alert slot.
    pub notifications: NotificationBus,
    /// Shared transport.
    pub http: Arc<HttpClient>,
    /// Session lifecycle.
    pub session: Arc<SessionManager>,
    /// Upload queue.
    pub uploads: Arc<UploadQueue>,
    /// Listing and per-file endpoints.
    pub catalogue: Arc<dyn FileCatalogue>,
    /// Role management endpoints.
    pub roles: Arc<dyn RoleAdministration>,
}

impl ClientServices {
    /// Build every service from `settings`.
    ///
    /// `listener` is told about each stored upload so listings can refresh.
    /// The session starts in the loading state; call
    /// [`SessionManager::start`] to restore it.
    pub fn build(
        settings: &ClientSettings,
        listener: Arc<dyn UploadListener>,
    ) -> Result<Self, ClientBuildError> {
        let base_url =
            Url::parse(settings.api_base()).map_err(|source| ClientBuildError::InvalidBaseUrl {
                value: settings.api_base().to_owned(),
                source,
            })?;
        let notifications = NotificationBus::new(settings.notification_ttl());
        let alerts: Arc<dyn AlertSink> = Arc::new(notifications.clone());
        let http = Arc::new(HttpClient::new(
            base_url,
            settings.request_timeout(),
            Arc::clone(&alerts),
        )?);

        let files = Arc::new(HttpFileGateway::new(Arc::clone(&http)));
        let session = Arc::new(SessionManager::new(Arc::new(HttpAuthGateway::new(
            Arc::clone(&http),
        ))));
        let uploads = Arc::new(UploadQueue::new(
            UploadQueuePorts {
                uploader: files.clone(),
                alerts,
                listener,
            },
            settings.upload_limits(),
        ));
        debug!(api_base = settings.api_base(), "client services built");

        Ok(Self {
            notifications,
            http: Arc::clone(&http),
            session,
            uploads,
            catalogue: files,
            roles: Arc::new(HttpRoleGateway::new(http)),
        })
    }

    /// Tear down the notification bus; later alerts are dropped.
    pub fn shutdown(&self) {
        self.notifications.shutdown();
    }
}
