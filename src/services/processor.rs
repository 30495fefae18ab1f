use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::db::store::{JobStore, StoreError};
use crate::models::detection::DetectionResult;
use crate::models::job::{JobState, JobStatus};
use crate::services::detector::{DetectionError, ForgeryDetector};
use crate::services::queue::{JobQueue, QueueError, QueuedJob};

/// Deliveries of one job before it is dropped after store errors.
pub const MAX_DISPATCH_ATTEMPTS: u32 = 3;

/// What happened to a dispatched job.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Completed {
        confidence_score: f64,
        is_authentic: bool,
    },
    Failed {
        error: String,
    },
    /// The job was unknown or already claimed by another worker.
    Skipped,
}

/// Claim a pending job, run detection on it and persist the outcome.
///
/// Detection errors never escape: they are recorded on the job as `failed`.
/// Only store errors are returned, so the caller can decide whether to
/// redeliver the message. A redelivery finding the job still `processing`
/// resumes it and writes the terminal state.
pub async fn process_job(
    store: &dyn JobStore,
    detector: Arc<dyn ForgeryDetector>,
    delivery: &QueuedJob,
) -> Result<ProcessOutcome, StoreError> {
    let job_id = delivery.job_id;
    let job = match store.claim(job_id).await {
        Ok(job) => job,
        Err(StoreError::NotFound(_)) => {
            tracing::warn!(job_id = %job_id, "Dispatched job does not exist, skipping");
            return Ok(ProcessOutcome::Skipped);
        }
        Err(StoreError::InvalidTransition {
            from: JobStatus::Processing,
            ..
        }) if delivery.is_redelivery() => {
            tracing::info!(
                job_id = %job_id,
                attempt = delivery.attempt,
                "Resuming job left in processing by an earlier delivery"
            );
            store.get(job_id).await?
        }
        Err(StoreError::InvalidTransition { from, .. }) => {
            tracing::info!(job_id = %job_id, status = %from, "Job already claimed, skipping");
            return Ok(ProcessOutcome::Skipped);
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        job_id = %job.id,
        document_hash = %job.document_hash,
        file_path = %job.file_path,
        "Processing verification job"
    );

    let start = Instant::now();
    let detection = run_detection(detector, PathBuf::from(&job.file_path)).await;
    let elapsed = start.elapsed();
    metrics::histogram!("verification_processing_seconds").record(elapsed.as_secs_f64());

    match detection {
        Ok(result) => {
            store
                .update(
                    job.id,
                    JobState::Completed {
                        confidence_score: result.confidence_score,
                        analysis: result.analysis_results(),
                        completed_at: Utc::now(),
                    },
                )
                .await?;
            metrics::counter!("verification_jobs_completed").increment(1);

            tracing::info!(
                job_id = %job.id,
                confidence = result.confidence_score,
                is_authentic = result.is_authentic,
                duration_ms = elapsed.as_millis() as u64,
                "Job completed successfully"
            );

            Ok(ProcessOutcome::Completed {
                confidence_score: result.confidence_score,
                is_authentic: result.is_authentic,
            })
        }
        Err(error) => {
            store
                .update(
                    job.id,
                    JobState::Failed {
                        error: error.clone(),
                    },
                )
                .await?;
            metrics::counter!("verification_jobs_failed").increment(1);

            tracing::warn!(job_id = %job.id, error = %error, "Job processing failed");

            Ok(ProcessOutcome::Failed { error })
        }
    }
}

/// Handle one delivery taken off `queue` and acknowledge it.
///
/// A store error re-enqueues the job with the next attempt number until
/// [`MAX_DISPATCH_ATTEMPTS`] is reached; the delivery is acknowledged either
/// way. Returns `None` when the job hit a store error.
pub async fn dispatch(
    store: &dyn JobStore,
    queue: &dyn JobQueue,
    detector: Arc<dyn ForgeryDetector>,
    delivery: &QueuedJob,
) -> Result<Option<ProcessOutcome>, QueueError> {
    let outcome = match process_job(store, detector, delivery).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!(job_id = %delivery.job_id, error = %e, "Failed to persist job state");
            redeliver(queue, delivery).await;
            None
        }
    };

    queue.complete(delivery).await?;
    Ok(outcome)
}

async fn redeliver(queue: &dyn JobQueue, delivery: &QueuedJob) {
    if delivery.attempt >= MAX_DISPATCH_ATTEMPTS {
        tracing::warn!(
            job_id = %delivery.job_id,
            attempts = delivery.attempt,
            "Dropping job after max dispatch attempts"
        );
        return;
    }

    let next = delivery.retry();
    match queue.enqueue(&next).await {
        Ok(()) => tracing::info!(
            job_id = %next.job_id,
            attempt = next.attempt,
            "Job re-queued for retry"
        ),
        Err(e) => tracing::error!(
            job_id = %delivery.job_id,
            error = %e,
            "Failed to re-queue job, dropping delivery"
        ),
    }
}

/// Run the CPU-bound detector on the blocking pool. A panic inside the
/// detector is reported like any other detection error.
async fn run_detection(
    detector: Arc<dyn ForgeryDetector>,
    path: PathBuf,
) -> Result<DetectionResult, String> {
    let task = tokio::task::spawn_blocking(move || detector.detect(&path));
    match task.await {
        Ok(result) => result.map_err(|e: DetectionError| e.to_string()),
        Err(join_error) => Err(format!("Detection task aborted: {join_error}")),
    }
}
