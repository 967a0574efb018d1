//! Client library for the file-storage and deduplication service.
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] holds the session state machine, the upload orchestrator, the
//!   notification bus, the route guard, and the ports they talk through.
//! - [`outbound`] provides the reqwest-backed HTTP client and the adapters
//!   implementing the domain ports.
//! - [`services`] wires adapters into domain services by constructor
//!   injection.
//! - [`settings`] loads configuration through OrthoConfig.

pub mod domain;
pub mod outbound;
pub mod services;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use services::{ClientBuildError, ClientServices};
pub use settings::ClientSettings;
