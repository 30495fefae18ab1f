use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::verification::{JobStatusResponse, SubmitResponse};
use crate::services::queue::QueuedJob;

/// Multipart field carrying the uploaded document.
pub const DOCUMENT_FIELD: &str = "document";

/// POST /documents: upload a document image for forgery verification.
pub async fn submit_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::Validation(format!("Expected a multipart upload: {e}")))?;

    let mut document = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some(DOCUMENT_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read document: {e}")))?;
            document = Some(data);
        }
    }

    let data = document.ok_or_else(|| ApiError::Validation("No document provided".to_string()))?;

    let stored = state.storage.save(&data).await?;
    let file_path = stored.path.to_string_lossy();
    let job = state.store.create(&stored.document_hash, &file_path).await?;

    if let Err(e) = state.queue.enqueue(&QueuedJob::new(job.id)).await {
        tracing::error!(
            job_id = %job.id,
            document_hash = %job.document_hash,
            file_path = %job.file_path,
            error = %e,
            "Job created but could not be enqueued"
        );
        return Err(ApiError::NotQueued(job.id));
    }

    metrics::counter!("verification_jobs_total").increment(1);
    tracing::info!(
        job_id = %job.id,
        document_hash = %job.document_hash,
        size_bytes = data.len(),
        "Document submitted for verification"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            verification_id: job.id,
            status: job.status(),
        }),
    ))
}

/// GET /documents/{id}: check verification job status and results.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    // A malformed id cannot name an existing job.
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    let job = state.store.get(id).await?;
    Ok(Json(JobStatusResponse::from(&job)))
}
