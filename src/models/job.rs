use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::models::detection::AnalysisResults;

/// Key under which a failed job records its error in `analysis_results`.
pub const ERROR_KEY: &str = "error";

/// Status of a verification job in the async queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Lifecycle state of a job, carrying only the data valid for that state.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Processing,
    Completed {
        confidence_score: f64,
        analysis: AnalysisResults,
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: String,
    },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Pending => JobStatus::Pending,
            JobState::Processing => JobStatus::Processing,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn confidence_score(&self) -> Option<f64> {
        match self {
            JobState::Completed {
                confidence_score, ..
            } => Some(*confidence_score),
            _ => None,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            JobState::Completed { completed_at, .. } => Some(*completed_at),
            _ => None,
        }
    }

    /// Flat `analysis_results` mapping as persisted and returned over HTTP.
    pub fn analysis_results(&self) -> serde_json::Value {
        match self {
            JobState::Completed { analysis, .. } => {
                serde_json::to_value(analysis).unwrap_or_else(|_| serde_json::json!({}))
            }
            JobState::Failed { error } => {
                let mut map = serde_json::Map::new();
                map.insert(ERROR_KEY.to_string(), serde_json::Value::String(error.clone()));
                serde_json::Value::Object(map)
            }
            JobState::Pending | JobState::Processing => serde_json::json!({}),
        }
    }
}

/// A document verification job.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationJob {
    pub id: Uuid,
    pub document_hash: String,
    pub file_path: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
}

impl VerificationJob {
    pub fn new(document_hash: &str, file_path: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_hash: document_hash.to_string(),
            file_path: file_path.to_string(),
            state: JobState::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }
}
