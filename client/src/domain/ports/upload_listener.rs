//! Driven port notified when an upload lands, so listings can refresh.

use crate::domain::UploadedFile;

/// Observer for completed uploads.
#[cfg_attr(test, mockall::automock)]
pub trait UploadListener: Send + Sync {
    /// Called once per successful upload with the returned metadata.
    fn file_uploaded(&self, file: &UploadedFile);
}

/// Listener that ignores every upload.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpUploadListener;

impl UploadListener for NoOpUploadListener {
    fn file_uploaded(&self, _file: &UploadedFile) {}
}
