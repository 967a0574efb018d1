//! Outbound adapters implementing domain ports for the storage service.
//!
//! Adapters are thin translators between domain types and the service's HTTP
//! API. They contain no business logic.

pub mod http;
