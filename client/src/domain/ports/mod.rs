//! Domain ports and supporting types for the hexagonal boundary.

mod alert_sink;
mod auth_gateway;
mod file_gateway;
mod role_gateway;
mod upload_listener;

#[cfg(test)]
pub use alert_sink::MockAlertSink;
pub use alert_sink::{AlertSink, NoOpAlertSink};
#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::AuthGateway;
#[cfg(test)]
pub use file_gateway::{MockFileCatalogue, MockFileUploader};
pub use file_gateway::{FileCatalogue, FileUploader};
#[cfg(test)]
pub use role_gateway::MockRoleAdministration;
pub use role_gateway::RoleAdministration;
#[cfg(test)]
pub use upload_listener::MockUploadListener;
pub use upload_listener::{NoOpUploadListener, UploadListener};
