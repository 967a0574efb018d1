//! File metadata returned by the storage service and listing filters.
//!
//! Shapes mirror the service's JSON. Listings tolerate a JSON `null` where a
//! list is expected because the service encodes an empty result that way.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::api::ApiError;

/// Server-side file identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(i64);

impl FileId {
    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Metadata returned after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Identifier, when the service returns one.
    #[serde(default)]
    pub id: Option<FileId>,
    /// Original file name.
    #[serde(default)]
    pub filename: String,
    /// Content hash used for deduplication.
    #[serde(default)]
    pub hash: Option<String>,
    /// Stored size in bytes, when reported.
    #[serde(default)]
    pub size: Option<u64>,
    /// Service status marker (for example `ok`).
    #[serde(default)]
    pub status: Option<String>,
}

/// One row of the private or admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// File identifier.
    pub id: FileId,
    /// Original file name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Uploader's username (admin listing only).
    #[serde(default)]
    pub uploader: Option<String>,
    /// Whether this row is the stored master copy.
    #[serde(default)]
    pub deduplicated: bool,
    /// Whether the file is publicly visible.
    #[serde(default)]
    pub is_public: bool,
}

/// Private listing for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileListing {
    /// Files owned by the user, newest first.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileSummary>,
}

/// Aggregate storage figures reported with the admin listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Sum of all uploaded sizes before deduplication.
    #[serde(default)]
    pub original_size: u64,
    /// Bytes actually stored after deduplication.
    #[serde(default)]
    pub dedup_size: u64,
    /// Bytes saved by deduplication.
    #[serde(default)]
    pub save_size: u64,
}

impl StorageStats {
    /// Share of the original size saved by deduplication, in percent.
    ///
    /// # Examples
    /// ```
    /// use dedup_client::domain::StorageStats;
    ///
    /// let stats = StorageStats { original_size: 200, dedup_size: 150, save_size: 50 };
    /// assert_eq!(stats.saved_percent(), 25.0);
    /// assert_eq!(StorageStats::default().saved_percent(), 0.0);
    /// ```
    pub fn saved_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        self.save_size as f64 / self.original_size as f64 * 100.0
    }
}

/// Admin listing with aggregate storage figures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdminFileListing {
    /// Every stored file across users.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileSummary>,
    /// Aggregate sizes.
    #[serde(flatten)]
    pub stats: StorageStats,
}

/// One row of the public listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicFile {
    /// File identifier.
    pub id: FileId,
    /// Original file name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Whether this row is the stored master copy.
    #[serde(default)]
    pub is_master: bool,
    /// Uploader's username.
    #[serde(default)]
    pub uploader: String,
    /// Number of downloads so far.
    #[serde(default)]
    pub download_count: u64,
}

/// Public listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicFileListing {
    /// Public files, newest first.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<PublicFile>,
    /// Total number of public files.
    #[serde(default)]
    pub total: u64,
}

/// Detail view of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetails {
    /// File identifier.
    pub id: FileId,
    /// Original file name.
    pub filename: String,
    /// Uploader's username.
    #[serde(default)]
    pub uploader_username: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Whether the file is publicly visible.
    #[serde(default)]
    pub is_public: bool,
    /// Number of downloads so far.
    #[serde(default)]
    pub download_count: u64,
}

/// Message shown when loading file details fails.
pub fn describe_details_failure(error: &ApiError) -> &'static str {
    match error.status() {
        Some(403) => "This file is private. You are not allowed to view it.",
        Some(404) => "File not found.",
        _ => "Failed to load file details.",
    }
}

/// Listing filters sent as query parameters.
///
/// Unset or blank values are omitted from the query string entirely.
///
/// # Examples
/// ```
/// use dedup_client::domain::FileFilters;
///
/// let filters = FileFilters {
///     search: Some("report".to_owned()),
///     mime_type: Some(String::new()),
///     ..FileFilters::default()
/// };
/// assert_eq!(filters.apply_to("/api/files"), "/api/files?search=report");
/// assert_eq!(FileFilters::default().apply_to("/api/files"), "/api/files");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileFilters {
    /// Filename substring.
    pub search: Option<String>,
    /// MIME type filter.
    pub mime_type: Option<String>,
    /// Minimum size in KB.
    pub min_size: Option<String>,
    /// Maximum size in KB.
    pub max_size: Option<String>,
    /// Earliest upload date.
    pub start_date: Option<String>,
    /// Latest upload date.
    pub end_date: Option<String>,
    /// Uploader username substring (admin listing).
    pub uploader: Option<String>,
}

impl FileFilters {
    /// Query parameters with blank values removed, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("search", &self.search),
            ("mimeType", &self.mime_type),
            ("minSize", &self.min_size),
            ("maxSize", &self.max_size),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
            ("uploader", &self.uploader),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|value| !value.is_empty())
                .map(|value| (key, value))
        })
        .collect()
    }

    /// Append the encoded query string to `path`; no `?` when nothing is set.
    pub fn apply_to(&self, path: &str) -> String {
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            return path.to_owned();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        format!("{path}?{query}")
    }
}
