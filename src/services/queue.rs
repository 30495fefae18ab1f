use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;
use uuid::Uuid;

const QUEUE_KEY: &str = "doc_forensics:jobs";
const PROCESSING_KEY: &str = "doc_forensics:processing";

/// Job payload handed to the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub job_id: Uuid,
    /// Dispatch attempt, starting at 1.
    #[serde(default = "first_attempt")]
    pub attempt: u32,
}

fn first_attempt() -> u32 {
    1
}

impl QueuedJob {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            attempt: first_attempt(),
        }
    }

    /// Payload for the next delivery of the same job.
    pub fn retry(&self) -> Self {
        Self {
            job_id: self.job_id,
            attempt: self.attempt + 1,
        }
    }

    /// True for any delivery after the first.
    pub fn is_redelivery(&self) -> bool {
        self.attempt > 1
    }
}

/// Async dispatch of job ids to background workers.
///
/// Delivery is at-least-once: `dequeue` moves a payload to an in-flight list
/// and it stays there until `complete` acknowledges it.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &QueuedJob) -> Result<(), QueueError>;

    async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError>;

    async fn complete(&self, job: &QueuedJob) -> Result<(), QueueError>;

    async fn queue_depth(&self) -> Result<u64, QueueError>;

    async fn health_check(&self) -> Result<(), QueueError>;
}

/// Redis-backed job queue using a pending list and a processing list.
pub struct RedisJobQueue {
    client: redis::Client,
}

impl RedisJobQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, QueueError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: &QueuedJob) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(job)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, &payload).await?;
        Ok(())
    }

    /// Pop the oldest job and move it to the processing list in one step.
    async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError> {
        let mut conn = self.connection().await?;
        let result: Option<String> = conn.rpoplpush(QUEUE_KEY, PROCESSING_KEY).await?;

        match result {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Remove an acknowledged job from the processing list.
    async fn complete(&self, job: &QueuedJob) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(job)?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, &payload).await?;
        Ok(())
    }

    async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self.connection().await?;
        let depth: u64 = conn.llen(QUEUE_KEY).await?;
        Ok(depth)
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// In-process FIFO queue with the same in-flight bookkeeping as Redis.
#[derive(Default)]
pub struct MemoryJobQueue {
    pending: Mutex<VecDeque<QueuedJob>>,
    in_flight: Mutex<Vec<QueuedJob>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: &QueuedJob) -> Result<(), QueueError> {
        self.pending.lock().await.push_back(job.clone());
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError> {
        let job = self.pending.lock().await.pop_front();
        if let Some(job) = &job {
            self.in_flight.lock().await.push(job.clone());
        }
        Ok(job)
    }

    async fn complete(&self, job: &QueuedJob) -> Result<(), QueueError> {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(pos) = in_flight.iter().position(|j| j == job) {
            in_flight.remove(pos);
        }
        Ok(())
    }

    async fn queue_depth(&self) -> Result<u64, QueueError> {
        Ok(self.pending.lock().await.len() as u64)
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
