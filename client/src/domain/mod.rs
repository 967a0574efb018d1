//! Domain primitives, services, and ports.
//!
//! Purpose: keep session, upload, and navigation rules independent of the
//! transport. Services receive their collaborators as port trait objects so
//! tests substitute doubles instead of a live server.
//!
//! Public surface:
//! - `ApiError` / `ResponseBody` — failure and body shapes raised by the HTTP
//!   client.
//! - `SessionManager` — authenticated-session lifecycle.
//! - `UploadQueue` — batched upload pipeline.
//! - `NotificationBus` — single-slot, self-expiring ambient alert.
//! - `route_guard` — navigation decisions derived from session state.

pub mod api;
pub mod auth;
pub mod files;
pub mod format;
pub mod notification;
pub mod ports;
pub mod route_guard;
pub mod session;
pub mod session_manager;
pub mod upload;

pub use self::api::{ApiError, ApiErrorKind, RATE_LIMIT_PATTERN, ResponseBody, is_rate_limit_message};
pub use self::auth::{CredentialsValidationError, LoginCredentials, SignupDetails};
pub use self::files::{
    AdminFileListing, FileDetails, FileFilters, FileId, FileListing, FileSummary, PublicFile,
    PublicFileListing, StorageStats, UploadedFile, describe_details_failure,
};
pub use self::format::format_bytes;
pub use self::notification::{DEFAULT_NOTIFICATION_TTL, Notification, NotificationBus};
pub use self::route_guard::{AppRoute, RouteAccess, RouteDecision, RouteTarget};
pub use self::session::{RestoreFailure, Role, Session, SessionState, classify_restore_failure};
pub use self::session_manager::SessionManager;
pub use self::upload::{
    BatchAbort, BatchReport, DEFAULT_MAX_FILE_SIZE_BYTES, UploadFailure, UploadItem,
    UploadItemId, UploadLimits, UploadQueue, UploadQueuePorts, UploadSource, UploadStatus,
};
