//! Behavioural tests for batched uploads.

use std::sync::Arc;

use dedup_client::domain::{
    ApiError, UploadItem, UploadLimits, UploadStatus, UploadedFile, DEFAULT_MAX_FILE_SIZE_BYTES,
};
use dedup_client::test_support::{ScriptedUploader, UploadHarness, source, uploaded};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::json;
use tokio::runtime::{Builder, Runtime};

const RATE_LIMITED: &str = "rate limit exceeded, try again later";

#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

#[derive(Default, ScenarioState)]
struct World {
    limit: Slot<u64>,
    script: Slot<Vec<Result<UploadedFile, ApiError>>>,
    harness: Slot<Arc<UploadHarness>>,
    runtime: Slot<RuntimeHandle>,
    report: Slot<dedup_client::domain::BatchReport>,
}

impl World {
    /// Queue for this scenario, built from the configured limit and script.
    fn harness(&self) -> Arc<UploadHarness> {
        if let Some(harness) = self.harness.get() {
            return harness;
        }
        let limits = UploadLimits {
            max_file_size_bytes: self.limit.get().unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
        };
        let script = self.script.get().unwrap_or_default();
        let harness = Arc::new(UploadHarness::with_limits(
            ScriptedUploader::new(script),
            limits,
        ));
        self.harness.set(Arc::clone(&harness));
        harness
    }

    fn runtime(&self) -> Arc<Runtime> {
        if let Some(RuntimeHandle(runtime)) = self.runtime.get() {
            return runtime;
        }
        let runtime = Arc::new(
            Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("create runtime"),
        );
        self.runtime.set(RuntimeHandle(Arc::clone(&runtime)));
        runtime
    }

    fn item(&self, name: &str) -> UploadItem {
        self.harness()
            .queue
            .items()
            .into_iter()
            .find(|item| item.source().file_name() == name)
            .expect("item should exist")
    }

    fn report(&self) -> dedup_client::domain::BatchReport {
        self.report.get().expect("batch should have run")
    }
}

#[fixture]
fn world() -> World {
    World::default()
}

fn parse_status(raw: &str) -> UploadStatus {
    match raw {
        "pending" => UploadStatus::Pending,
        "uploading" => UploadStatus::Uploading,
        "done" => UploadStatus::Done,
        "error" => UploadStatus::Error,
        other => panic!("unknown status {other}"),
    }
}

fn quoted_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim().trim_matches('"').to_owned())
        .collect()
}

// ============================================================================
// Given steps
// ============================================================================

#[given("an upload queue with a limit of {limit:u64} bytes")]
fn an_upload_queue_with_a_limit(world: &World, limit: u64) {
    world.limit.set(limit);
}

#[given("an upload queue with the default limit")]
fn an_upload_queue_with_the_default_limit(world: &World) {
    world.limit.set(DEFAULT_MAX_FILE_SIZE_BYTES);
}

#[given("the service rate limits the second upload")]
fn the_service_rate_limits_the_second_upload(world: &World) {
    world.script.set(vec![
        Ok(uploaded("a.txt")),
        Err(ApiError::from_status(429, RATE_LIMITED)
            .with_details(json!({ "error": RATE_LIMITED }))),
    ]);
}

#[given("the service rejects the first upload for quota with {allowed:u64} allowed and {used:u64} used")]
fn the_service_rejects_the_first_upload_for_quota(world: &World, allowed: u64, used: u64) {
    world.script.set(vec![Err(ApiError::from_status(403, "Quota exceeded")
        .with_details(json!({
            "error": "Quota exceeded",
            "allowed": allowed,
            "used": used
        })))]);
}

// ============================================================================
// When steps
// ============================================================================

#[when("a {size:usize} byte file named \"{name}\" is added")]
fn a_file_is_added(world: &World, size: usize, name: String) {
    world.harness().queue.intake([source(&name, size)]);
}

#[when("files {names} are added")]
fn files_are_added(world: &World, names: String) {
    let sources: Vec<_> = quoted_names(&names)
        .iter()
        .map(|name| source(name, 8))
        .collect();
    world.harness().queue.intake(sources);
}

#[when("the pending files are uploaded")]
fn the_pending_files_are_uploaded(world: &World) {
    let harness = world.harness();
    let report = world.runtime().block_on(harness.queue.upload_pending());
    world.report.set(report);
}

// ============================================================================
// Then steps
// ============================================================================

#[then("\"{name}\" has status \"{status}\" with message \"{message}\"")]
fn item_has_status_with_message(world: &World, name: String, status: String, message: String) {
    let item = world.item(&name);
    assert_eq!(item.status(), parse_status(&status));
    assert_eq!(item.error_message(), Some(message.as_str()));
}

#[then("\"{name}\" is \"{status}\" without a message")]
fn item_has_status(world: &World, name: String, status: String) {
    let item = world.item(&name);
    assert_eq!(item.status(), parse_status(&status));
    assert!(item.error_message().is_none());
}

#[then("no upload request was sent")]
fn no_upload_request_was_sent(world: &World) {
    assert!(world.harness().uploader.calls().is_empty());
}

#[then("{count:usize} file was uploaded")]
fn files_were_uploaded(world: &World, count: usize) {
    assert_eq!(world.report().uploaded, count);
}

#[then("the batch was stopped by \"{name}\"")]
fn the_batch_was_stopped_by(world: &World, name: String) {
    let abort = world.report().aborted.expect("batch should be aborted");
    assert_eq!(abort.item, world.item(&name).id());
    assert_eq!(abort.message, RATE_LIMITED);
}

#[then("the alert \"{message}\" was posted")]
fn the_alert_was_posted(world: &World, message: String) {
    assert_eq!(world.harness().alerts.messages(), [message]);
}

// ============================================================================
// Scenario bindings
// ============================================================================

#[scenario(
    path = "tests/features/upload_batch.feature",
    name = "Oversized files are rejected at intake"
)]
fn oversized_files_are_rejected_at_intake(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/upload_batch.feature",
    name = "A rate limit stops the batch"
)]
fn a_rate_limit_stops_the_batch(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/upload_batch.feature",
    name = "Quota rejections are reported per file"
)]
fn quota_rejections_are_reported_per_file(world: World) {
    let _ = world;
}
