//! Upload, listing, and per-file endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;

use super::client::{HttpClient, decode};
use crate::domain::ports::{FileCatalogue, FileUploader};
use crate::domain::{
    AdminFileListing, ApiError, FileDetails, FileFilters, FileId, FileListing,
    PublicFileListing, ResponseBody, UploadSource, UploadedFile,
};

/// [`FileUploader`] and [`FileCatalogue`] over the service's JSON API.
#[derive(Clone)]
pub struct HttpFileGateway {
    http: Arc<HttpClient>,
}

impl HttpFileGateway {
    /// Wrap a shared client.
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FileUploader for HttpFileGateway {
    async fn upload(&self, source: &UploadSource) -> Result<UploadedFile, ApiError> {
        let body = self.http.upload("/api/upload", source).await?;
        decode(body)
    }
}

#[async_trait]
impl FileCatalogue for HttpFileGateway {
    async fn list_files(&self, filters: &FileFilters) -> Result<FileListing, ApiError> {
        self.http.get_json(&filters.apply_to("/api/files")).await
    }

    async fn list_admin_files(
        &self,
        filters: &FileFilters,
    ) -> Result<AdminFileListing, ApiError> {
        self.http.get_json(&filters.apply_to("/api/adminFiles")).await
    }

    async fn list_public_files(&self) -> Result<PublicFileListing, ApiError> {
        self.http.get_json("/api/publicFiles").await
    }

    async fn file_details(&self, id: FileId) -> Result<FileDetails, ApiError> {
        self.http.get_json(&format!("/api/fileDetails/{id}")).await
    }

    async fn toggle_privacy(&self, id: FileId) -> Result<ResponseBody, ApiError> {
        self.http
            .request(Method::GET, &format!("/api/fileTogglePrivacy/{id}"), None)
            .await
    }

    async fn delete_file(&self, id: FileId) -> Result<ResponseBody, ApiError> {
        self.http
            .request(Method::GET, &format!("/api/fileDelete/{id}"), None)
            .await
    }

    fn download_url(&self, id: FileId) -> Result<String, ApiError> {
        self.http
            .endpoint_url(&format!("/api/fileDownload/{id}"))
            .map(String::from)
    }
}
