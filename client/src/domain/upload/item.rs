//! Upload queue entries and their forward-only status machine.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// File content handed to the orchestrator at intake.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadSource {
    file_name: String,
    size: u64,
    content: Arc<[u8]>,
}

impl UploadSource {
    /// Wrap in-memory content; the size is the content length.
    ///
    /// # Examples
    /// ```
    /// use dedup_client::domain::UploadSource;
    ///
    /// let source = UploadSource::from_bytes("notes.txt", b"hello".to_vec());
    /// assert_eq!(source.file_name(), "notes.txt");
    /// assert_eq!(source.size(), 5);
    /// ```
    pub fn from_bytes(file_name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        let content = content.into();
        Self {
            file_name: file_name.into(),
            size: content.len() as u64,
            content,
        }
    }

    /// Name sent with the multipart part.
    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Raw content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSource")
            .field("file_name", &self.file_name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Identifier assigned to each source at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadItemId(Uuid);

impl UploadItemId {
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UploadItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-item status. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    /// Waiting for the next batch.
    Pending,
    /// Request in flight.
    Uploading,
    /// Stored by the service. Terminal.
    Done,
    /// Rejected locally or by the service. Terminal.
    Error,
}

impl UploadStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// One entry in the upload queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    id: UploadItemId,
    source: UploadSource,
    status: UploadStatus,
    error_message: Option<String>,
}

impl UploadItem {
    pub(crate) fn pending(source: UploadSource) -> Self {
        Self {
            id: UploadItemId::random(),
            source,
            status: UploadStatus::Pending,
            error_message: None,
        }
    }

    pub(crate) fn rejected(source: UploadSource, message: String) -> Self {
        Self {
            id: UploadItemId::random(),
            source,
            status: UploadStatus::Error,
            error_message: Some(message),
        }
    }

    /// Item identifier.
    pub fn id(&self) -> UploadItemId {
        self.id
    }

    /// Source handed over at intake.
    pub fn source(&self) -> &UploadSource {
        &self.source
    }

    /// Current status.
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Message recorded when the item ended in [`UploadStatus::Error`].
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// `Pending -> Uploading`. Returns `false` for any other status.
    pub(crate) fn claim(&mut self) -> bool {
        if self.status != UploadStatus::Pending {
            return false;
        }
        self.status = UploadStatus::Uploading;
        true
    }

    /// `Uploading -> Done`.
    pub(crate) fn complete(&mut self) -> bool {
        if self.status != UploadStatus::Uploading {
            return false;
        }
        self.status = UploadStatus::Done;
        true
    }

    /// `Uploading -> Error` with `message`.
    pub(crate) fn fail(&mut self, message: String) -> bool {
        if self.status != UploadStatus::Uploading {
            return false;
        }
        self.status = UploadStatus::Error;
        self.error_message = Some(message);
        true
    }
}
