use async_trait::async_trait;
use uuid::Uuid;

use crate::models::job::{JobState, JobStatus, VerificationJob};

/// Persistence interface for verification jobs.
///
/// `update` only ever applies a forward lifecycle transition. Implementations
/// must make the check-and-set atomic so that two workers racing on `claim`
/// cannot both win.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job in the `pending` state.
    async fn create(
        &self,
        document_hash: &str,
        file_path: &str,
    ) -> Result<VerificationJob, StoreError>;

    /// Fetch a job by id.
    async fn get(&self, id: Uuid) -> Result<VerificationJob, StoreError>;

    /// Move a job to `next`, rejecting any non-forward transition.
    async fn update(&self, id: Uuid, next: JobState) -> Result<VerificationJob, StoreError>;

    /// Check backend connectivity (for health checks).
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Atomically take ownership of a pending job.
    async fn claim(&self, id: Uuid) -> Result<VerificationJob, StoreError> {
        self.update(id, JobState::Processing).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Verification job not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Stored job {id} is inconsistent: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
