//! Batched multi-file upload orchestration.
//!
//! The queue validates sources at intake, then sends pending items strictly
//! one at a time. A rate-limit rejection posts an alert and stops the batch,
//! leaving the untouched items pending for a later run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::format::format_bytes;
use super::ports::{AlertSink, FileUploader, UploadListener};

mod failure;
mod item;

pub use failure::UploadFailure;
pub use item::{UploadItem, UploadItemId, UploadSource, UploadStatus};

/// Largest file accepted at intake unless configured otherwise.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Intake limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Sources larger than this are rejected without a request.
    pub max_file_size_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
        }
    }
}

/// Collaborators used by [`UploadQueue`].
#[derive(Clone)]
pub struct UploadQueuePorts {
    /// Upload endpoint.
    pub uploader: Arc<dyn FileUploader>,
    /// Ambient alert sink for rate-limit messages.
    pub alerts: Arc<dyn AlertSink>,
    /// Notified after each stored file.
    pub listener: Arc<dyn UploadListener>,
}

/// Item that stopped a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAbort {
    /// Item whose upload triggered the abort.
    pub item: UploadItemId,
    /// Message posted to the alert sink.
    pub message: String,
}

/// Outcome of one [`UploadQueue::upload_pending`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items stored by the service.
    pub uploaded: usize,
    /// Items that ended in an error.
    pub failed: usize,
    /// Set when the batch stopped early.
    pub aborted: Option<BatchAbort>,
}

impl BatchReport {
    /// Whether the run stopped before working through its snapshot.
    pub fn was_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Upload queue with per-item status tracking.
///
/// ## Invariants
/// - Item statuses only move forward; terminal items are never re-queued.
/// - At most one upload request is in flight.
/// - A batch only processes items that were pending when it started.
pub struct UploadQueue {
    ports: UploadQueuePorts,
    limits: UploadLimits,
    items: Mutex<Vec<UploadItem>>,
    batch_gate: tokio::sync::Mutex<()>,
}

impl UploadQueue {
    /// Create an empty queue.
    pub fn new(ports: UploadQueuePorts, limits: UploadLimits) -> Self {
        Self {
            ports,
            limits,
            items: Mutex::new(Vec::new()),
            batch_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Configured intake limits.
    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<UploadItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `sources` to the queue and return the new items.
    ///
    /// Oversized sources are marked failed immediately; no request is made.
    pub fn intake(&self, sources: impl IntoIterator<Item = UploadSource>) -> Vec<UploadItem> {
        let max = self.limits.max_file_size_bytes;
        let added: Vec<UploadItem> = sources
            .into_iter()
            .map(|source| {
                if source.size() > max {
                    debug!(
                        file = source.file_name(),
                        size = source.size(),
                        max,
                        "rejecting oversized file"
                    );
                    UploadItem::rejected(source, format!("Too large (max {})", format_bytes(max)))
                } else {
                    UploadItem::pending(source)
                }
            })
            .collect();
        self.lock_items().extend(added.iter().cloned());
        added
    }

    /// Snapshot of every item in intake order.
    pub fn items(&self) -> Vec<UploadItem> {
        self.lock_items().clone()
    }

    /// Whether any item is waiting for a batch.
    pub fn has_pending(&self) -> bool {
        self.lock_items()
            .iter()
            .any(|item| item.status() == UploadStatus::Pending)
    }

    /// Upload the items that are pending right now, one at a time.
    ///
    /// Overlapping calls run one after another, each over its own snapshot.
    pub async fn upload_pending(&self) -> BatchReport {
        let snapshot: Vec<UploadItemId> = self
            .lock_items()
            .iter()
            .filter(|item| item.status() == UploadStatus::Pending)
            .map(UploadItem::id)
            .collect();
        let _batch = self.batch_gate.lock().await;

        let mut report = BatchReport::default();
        for id in snapshot {
            let Some(source) = self.claim(id) else {
                continue;
            };

            match self.ports.uploader.upload(&source).await {
                Ok(uploaded) => {
                    self.update(id, |item| item.complete());
                    report.uploaded += 1;
                    info!(file = source.file_name(), hash = ?uploaded.hash, "upload stored");
                    self.ports.listener.file_uploaded(&uploaded);
                }
                Err(error) => {
                    let failure = UploadFailure::classify(&error);
                    if failure.aborts_batch() {
                        warn!(file = source.file_name(), "rate limited; stopping batch");
                        self.ports.alerts.post(failure.message());
                        report.aborted = Some(BatchAbort {
                            item: id,
                            message: failure.message().to_owned(),
                        });
                        break;
                    }
                    warn!(
                        file = source.file_name(),
                        status = ?error.status(),
                        reason = failure.message(),
                        "upload failed"
                    );
                    self.update(id, |item| item.fail(failure.message().to_owned()));
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn claim(&self, id: UploadItemId) -> Option<UploadSource> {
        let mut items = self.lock_items();
        let item = items.iter_mut().find(|item| item.id() == id)?;
        item.claim().then(|| item.source().clone())
    }

    fn update(&self, id: UploadItemId, transition: impl FnOnce(&mut UploadItem) -> bool) {
        let mut items = self.lock_items();
        if let Some(item) = items.iter_mut().find(|item| item.id() == id)
            && !transition(&mut *item)
        {
            debug!(%id, status = %item.status(), "ignored out-of-order transition");
        }
    }
}
