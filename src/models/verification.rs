use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{JobStatus, VerificationJob};

/// Response after submitting a document for verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub verification_id: Uuid,
    pub status: JobStatus,
}

/// Response for querying a verification job.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub verification_id: Uuid,
    pub status: JobStatus,
    pub confidence_score: Option<f64>,
    pub analysis_results: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&VerificationJob> for JobStatusResponse {
    fn from(job: &VerificationJob) -> Self {
        Self {
            verification_id: job.id,
            status: job.status(),
            confidence_score: job.state.confidence_score(),
            analysis_results: job.state.analysis_results(),
            created_at: job.created_at,
            completed_at: job.state.completed_at(),
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Set when the job was recorded but the request still failed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verification_id: Option<Uuid>,
}
