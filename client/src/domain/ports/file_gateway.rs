//! Driven ports for file upload and file catalogue endpoints.

use async_trait::async_trait;

use crate::domain::{
    AdminFileListing, ApiError, FileDetails, FileFilters, FileId, FileListing,
    PublicFileListing, ResponseBody, UploadSource, UploadedFile,
};

/// Upload endpoint used by the upload orchestrator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Send one file as multipart field `file` (`POST /api/upload`).
    ///
    /// On failure the error carries the full failure envelope in
    /// [`ApiError::details`] so quota and MIME rejections can be classified.
    async fn upload(&self, source: &UploadSource) -> Result<UploadedFile, ApiError>;
}

/// Listing and per-file endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileCatalogue: Send + Sync {
    /// Private listing for the signed-in user (`GET /api/files`).
    async fn list_files(&self, filters: &FileFilters) -> Result<FileListing, ApiError>;

    /// Admin listing with storage figures (`GET /api/adminFiles`).
    async fn list_admin_files(&self, filters: &FileFilters)
    -> Result<AdminFileListing, ApiError>;

    /// Public listing (`GET /api/publicFiles`).
    async fn list_public_files(&self) -> Result<PublicFileListing, ApiError>;

    /// Detail view (`GET /api/fileDetails/{id}`).
    async fn file_details(&self, id: FileId) -> Result<FileDetails, ApiError>;

    /// Flip public/private visibility (`GET /api/fileTogglePrivacy/{id}`).
    async fn toggle_privacy(&self, id: FileId) -> Result<ResponseBody, ApiError>;

    /// Delete the caller's reference to a file (`GET /api/fileDelete/{id}`).
    async fn delete_file(&self, id: FileId) -> Result<ResponseBody, ApiError>;

    /// Navigational download URL (`/api/fileDownload/{id}`); no request is made.
    fn download_url(&self, id: FileId) -> Result<String, ApiError>;
}
