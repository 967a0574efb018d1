//! Reqwest-backed adapters for the storage service's JSON API.
//!
//! [`HttpClient`] owns transport concerns: the cookie jar, envelope parsing,
//! status mapping, and rate-limit alerts. The gateway types translate port
//! calls into endpoint requests on top of it.

mod auth;
mod client;
mod dto;
mod files;
mod roles;

pub use auth::HttpAuthGateway;
pub use client::HttpClient;
pub use files::HttpFileGateway;
pub use roles::HttpRoleGateway;
