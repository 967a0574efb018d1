//! Shared test doubles for session and upload tests.
//!
//! Exposed to integration tests through the `test-support` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::ports::{AlertSink, FileUploader, UploadListener};
use crate::domain::{
    ApiError, UploadLimits, UploadQueue, UploadQueuePorts, UploadSource, UploadedFile,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

/// Source of `size` zero bytes named `name`.
pub fn source(name: &str, size: usize) -> UploadSource {
    UploadSource::from_bytes(name, vec![0_u8; size])
}

/// Upload response for `name`.
pub fn uploaded(name: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_owned(),
        hash: Some(format!("hash-{name}")),
        status: Some("ok".to_owned()),
        ..UploadedFile::default()
    }
}

/// Alert sink recording every posted message.
#[derive(Default)]
pub struct RecordingAlertSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlertSink {
    /// Messages posted so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages, "alert sink").clone()
    }
}

impl AlertSink for RecordingAlertSink {
    fn post(&self, message: &str) {
        lock(&self.messages, "alert sink").push(message.to_owned());
    }
}

/// Listener recording stored file names.
#[derive(Default)]
pub struct RecordingUploadListener {
    files: Mutex<Vec<String>>,
}

impl RecordingUploadListener {
    /// File names reported so far.
    pub fn files(&self) -> Vec<String> {
        lock(&self.files, "upload listener").clone()
    }
}

impl UploadListener for RecordingUploadListener {
    fn file_uploaded(&self, file: &UploadedFile) {
        lock(&self.files, "upload listener").push(file.filename.clone());
    }
}

/// Uploader replaying scripted results in call order.
///
/// Calls beyond the script succeed with [`uploaded`]. When a hold is armed,
/// the first call signals `entered` and waits for `release`.
#[derive(Default)]
pub struct ScriptedUploader {
    results: Mutex<VecDeque<Result<UploadedFile, ApiError>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    hold_first: std::sync::atomic::AtomicBool,
    /// Signalled when a held call starts.
    pub entered: Notify,
    /// Notify to let a held call finish.
    pub release: Notify,
}

impl ScriptedUploader {
    /// Uploader replaying `results`.
    pub fn new(results: impl IntoIterator<Item = Result<UploadedFile, ApiError>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Make the first call wait for [`ScriptedUploader::release`].
    pub fn hold_first_call(self) -> Self {
        self.hold_first.store(true, Ordering::SeqCst);
        self
    }

    /// File names sent so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls, "uploader calls").clone()
    }

    /// Highest number of concurrent calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileUploader for ScriptedUploader {
    async fn upload(&self, source: &UploadSource) -> Result<UploadedFile, ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        lock(&self.calls, "uploader calls").push(source.file_name().to_owned());

        if self.hold_first.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        let scripted = lock(&self.results, "uploader results").pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        scripted.unwrap_or_else(|| Ok(uploaded(source.file_name())))
    }
}

/// Queue wired to recording doubles.
pub struct UploadHarness {
    /// Queue under test.
    pub queue: UploadQueue,
    /// Scripted upload endpoint.
    pub uploader: Arc<ScriptedUploader>,
    /// Alerts posted by the queue.
    pub alerts: Arc<RecordingAlertSink>,
    /// Stored-file notifications.
    pub listener: Arc<RecordingUploadListener>,
}

impl UploadHarness {
    /// Build a queue with default limits around `uploader`.
    pub fn new(uploader: ScriptedUploader) -> Self {
        Self::with_limits(uploader, UploadLimits::default())
    }

    /// Build a queue with explicit limits around `uploader`.
    pub fn with_limits(uploader: ScriptedUploader, limits: UploadLimits) -> Self {
        let uploader = Arc::new(uploader);
        let alerts = Arc::new(RecordingAlertSink::default());
        let listener = Arc::new(RecordingUploadListener::default());
        let queue = UploadQueue::new(
            UploadQueuePorts {
                uploader: uploader.clone(),
                alerts: alerts.clone(),
                listener: listener.clone(),
            },
            limits,
        );
        Self {
            queue,
            uploader,
            alerts,
            listener,
        }
    }
}
