//! Test helper utilities for API and E2E testing
#![allow(dead_code)]

use reqwest::multipart;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;
use uuid::Uuid;

use doc_forensics::{
    app_state::AppState,
    db::{InMemoryJobStore, JobStore},
    models::job::JobStatus,
    models::verification::{JobStatusResponse, SubmitResponse},
    routes,
    services::{
        detector::ForgeryDetector,
        processor::{self, ProcessOutcome},
        queue::{JobQueue, MemoryJobQueue},
        storage::DocumentStorage,
    },
};

const TEST_UPLOAD_LIMIT: usize = 5 * 1024 * 1024;

/// A running API server backed by in-memory store and queue.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemoryJobStore>,
    pub queue: Arc<MemoryJobQueue>,
    pub upload_dir: TempDir,
}

impl TestApp {
    /// Play the worker: drain the queue through `detector`.
    pub async fn run_worker(&self, detector: Arc<dyn ForgeryDetector>) -> Vec<ProcessOutcome> {
        let mut outcomes = Vec::new();
        while let Some(job) = self.queue.dequeue().await.expect("dequeue failed") {
            let outcome = processor::dispatch(
                self.store.as_ref(),
                self.queue.as_ref(),
                Arc::clone(&detector),
                &job,
            )
            .await
            .expect("queue error while dispatching");
            outcomes.extend(outcome);
        }
        outcomes
    }
}

/// Start the real router on an ephemeral port.
pub async fn spawn_app() -> TestApp {
    let queue = Arc::new(MemoryJobQueue::new());
    let (base_url, store, upload_dir) =
        spawn_app_with_queue(Arc::clone(&queue) as Arc<dyn JobQueue>).await;

    TestApp {
        base_url,
        client: reqwest::Client::new(),
        store,
        queue,
        upload_dir,
    }
}

/// Start the router over an in-memory store and the given queue.
pub async fn spawn_app_with_queue(
    queue: Arc<dyn JobQueue>,
) -> (String, Arc<InMemoryJobStore>, TempDir) {
    let store = Arc::new(InMemoryJobStore::new());
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

    let state = AppState::new(
        Arc::clone(&store) as Arc<dyn JobStore>,
        queue,
        DocumentStorage::new(upload_dir.path()),
    );
    let app = routes::router(state, TEST_UPLOAD_LIMIT);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    (format!("http://{}", addr), store, upload_dir)
}

/// Encode a small synthetic JPEG document.
pub fn sample_jpeg() -> Vec<u8> {
    let image = image::RgbImage::from_fn(96, 64, |x, y| {
        image::Rgb([(x * 2) as u8, (y * 3) as u8, 200])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    buf.into_inner()
}

/// POST raw bytes to /documents under the `document` field.
pub async fn upload_document(
    client: &reqwest::Client,
    base_url: &str,
    bytes: Vec<u8>,
    filename: &str,
) -> reqwest::Response {
    let form = multipart::Form::new().part(
        "document",
        multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
            .expect("Invalid mime type"),
    );

    client
        .post(format!("{}/documents", base_url))
        .multipart(form)
        .send()
        .await
        .expect("Upload request failed")
}

/// Upload and assert the job was accepted.
pub async fn submit_document(
    client: &reqwest::Client,
    base_url: &str,
    bytes: Vec<u8>,
    filename: &str,
) -> SubmitResponse {
    let response = upload_document(client, base_url, bytes, filename).await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    response
        .json::<SubmitResponse>()
        .await
        .expect("Invalid submit response")
}

/// GET /documents/{id}
pub async fn get_document(
    client: &reqwest::Client,
    base_url: &str,
    id: &str,
) -> reqwest::Response {
    client
        .get(format!("{}/documents/{}", base_url, id))
        .send()
        .await
        .expect("Status request failed")
}

/// GET /documents/{id} and decode a successful response.
pub async fn fetch_status(
    client: &reqwest::Client,
    base_url: &str,
    id: Uuid,
) -> JobStatusResponse {
    let response = get_document(client, base_url, &id.to_string()).await;
    assert!(
        response.status().is_success(),
        "Status check failed: {}",
        response.status()
    );
    response
        .json::<JobStatusResponse>()
        .await
        .expect("Invalid status response")
}

/// Poll job status until completed or failed (with timeout)
pub async fn poll_job_status(
    client: &reqwest::Client,
    base_url: &str,
    id: Uuid,
    timeout_secs: u64,
) -> Result<JobStatusResponse, Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs * 2; // Poll every 500ms

    for _ in 0..max_attempts {
        let status = fetch_status(client, base_url, id).await;
        if status.status.is_terminal() {
            return Ok(status);
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(format!("Job did not finish within {} seconds", timeout_secs).into())
}

/// Position of a status in the lifecycle, for ordering checks.
pub fn lifecycle_rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Pending => 0,
        JobStatus::Processing => 1,
        JobStatus::Completed | JobStatus::Failed => 2,
    }
}
