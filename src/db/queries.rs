use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::store::{JobStore, StoreError};
use crate::models::detection::AnalysisResults;
use crate::models::job::{JobState, JobStatus, VerificationJob, ERROR_KEY};

const JOB_COLUMNS: &str = "id, document_hash, file_path, status, confidence_score, \
                           analysis_results, created_at, completed_at";

/// Flat `verification_jobs` row as stored in PostgreSQL.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    document_hash: String,
    file_path: String,
    status: String,
    confidence_score: Option<f64>,
    analysis_results: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl JobRow {
    /// Rebuild the tagged job state, rejecting rows that break the
    /// score/completion/error invariants.
    fn into_job(self) -> Result<VerificationJob, StoreError> {
        let id = self.id;
        let corrupt = |reason: &str| StoreError::Corrupt {
            id,
            reason: reason.to_string(),
        };

        let status = JobStatus::from_str(&self.status)
            .map_err(|_| corrupt(&format!("unknown status '{}'", self.status)))?;

        if status != JobStatus::Completed
            && (self.confidence_score.is_some() || self.completed_at.is_some())
        {
            return Err(corrupt("score or completion time set on a non-completed job"));
        }

        let state = match status {
            JobStatus::Pending => JobState::Pending,
            JobStatus::Processing => JobState::Processing,
            JobStatus::Completed => {
                let confidence_score = self
                    .confidence_score
                    .ok_or_else(|| corrupt("completed job without confidence score"))?;
                let completed_at = self
                    .completed_at
                    .ok_or_else(|| corrupt("completed job without completion time"))?;
                let analysis: AnalysisResults = serde_json::from_value(self.analysis_results.0)
                    .map_err(|e| corrupt(&format!("unreadable analysis results: {e}")))?;
                JobState::Completed {
                    confidence_score,
                    analysis,
                    completed_at,
                }
            }
            JobStatus::Failed => {
                let error = self
                    .analysis_results
                    .0
                    .get(ERROR_KEY)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| corrupt("failed job without error description"))?;
                JobState::Failed {
                    error: error.to_string(),
                }
            }
        };

        Ok(VerificationJob {
            id,
            document_hash: self.document_hash,
            file_path: self.file_path,
            state,
            created_at: self.created_at,
        })
    }
}

/// PostgreSQL-backed job store.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve why a conditional update touched no rows.
    async fn rejected_transition(&self, id: Uuid, to: JobStatus) -> StoreError {
        match self.get(id).await {
            Ok(job) => StoreError::InvalidTransition {
                from: job.status(),
                to,
            },
            Err(e) => e,
        }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    /// Insert a new verification job
    async fn create(
        &self,
        document_hash: &str,
        file_path: &str,
    ) -> Result<VerificationJob, StoreError> {
        let row: JobRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO verification_jobs (id, document_hash, file_path, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(document_hash)
        .bind(file_path)
        .fetch_one(&self.pool)
        .await?;

        row.into_job()
    }

    /// Get a job by ID
    async fn get(&self, id: Uuid) -> Result<VerificationJob, StoreError> {
        let row: Option<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM verification_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotFound(id))?.into_job()
    }

    /// Apply a forward transition; the `WHERE status = ...` guard makes the
    /// check-and-set a single atomic statement.
    async fn update(&self, id: Uuid, next: JobState) -> Result<VerificationJob, StoreError> {
        let to = next.status();

        let row: Option<JobRow> = match &next {
            JobState::Pending => None,
            JobState::Processing => {
                sqlx::query_as(&format!(
                    r#"
                    UPDATE verification_jobs
                    SET status = 'processing'
                    WHERE id = $1 AND status = 'pending'
                    RETURNING {JOB_COLUMNS}
                    "#
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            JobState::Completed {
                confidence_score,
                analysis,
                completed_at,
            } => {
                sqlx::query_as(&format!(
                    r#"
                    UPDATE verification_jobs
                    SET status = 'completed',
                        confidence_score = $2,
                        analysis_results = $3,
                        completed_at = $4
                    WHERE id = $1 AND status = 'processing'
                    RETURNING {JOB_COLUMNS}
                    "#
                ))
                .bind(id)
                .bind(confidence_score)
                .bind(Json(analysis))
                .bind(completed_at)
                .fetch_optional(&self.pool)
                .await?
            }
            JobState::Failed { .. } => {
                sqlx::query_as(&format!(
                    r#"
                    UPDATE verification_jobs
                    SET status = 'failed',
                        analysis_results = $2
                    WHERE id = $1 AND status = 'processing'
                    RETURNING {JOB_COLUMNS}
                    "#
                ))
                .bind(id)
                .bind(Json(next.analysis_results()))
                .fetch_optional(&self.pool)
                .await?
            }
        };

        match row {
            Some(row) => row.into_job(),
            None => Err(self.rejected_transition(id, to).await),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
