use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::db::store::StoreError;
use crate::models::verification::ErrorResponse;
use crate::services::storage::StorageError;
use uuid::Uuid;

/// Errors surfaced synchronously by the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Verification job not found")]
    NotFound,

    /// The job row exists but could not be handed to the worker pool.
    #[error("Verification job was created but could not be queued, retry later")]
    NotQueued(Uuid),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotQueued(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let verification_id = match self {
            ApiError::NotQueued(id) => Some(id),
            _ => None,
        };
        (
            status,
            Json(ErrorResponse {
                error: message,
                verification_id,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Empty => ApiError::Validation("Uploaded document is empty".to_string()),
            StorageError::Io(e) => ApiError::Internal(format!("failed to store document: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: ApiError = StoreError::NotFound(Uuid::new_v4()).into();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn test_empty_upload_maps_to_validation() {
        let err: ApiError = StorageError::Empty.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_queued_is_503() {
        let id = Uuid::new_v4();
        assert_eq!(
            ApiError::NotQueued(id).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
