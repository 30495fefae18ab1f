use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::{JobStore, StoreError};
use crate::models::job::{JobState, VerificationJob};

/// In-process job store. Every transition runs under one write lock, which
/// gives the same single-winner claim semantics as the conditional UPDATE in
/// Postgres.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, VerificationJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(
        &self,
        document_hash: &str,
        file_path: &str,
    ) -> Result<VerificationJob, StoreError> {
        let job = VerificationJob::new(document_hash, file_path);
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<VerificationJob, StoreError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, next: JobState) -> Result<VerificationJob, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        let from = job.status();
        let to = next.status();
        if !from.can_transition_to(to) {
            return Err(StoreError::InvalidTransition { from, to });
        }

        job.state = next;
        Ok(job.clone())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
