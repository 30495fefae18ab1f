use doc_forensics::{
    config::AppConfig,
    db::{self, JobStore, PgJobStore, StoreError},
    models::detection::{AnalysisDetails, AnalysisResults},
    models::job::{JobState, JobStatus},
    services::queue::{JobQueue, QueuedJob, RedisJobQueue},
    services::storage::content_hash,
};
use std::sync::Arc;

/// Integration test: job lifecycle against real backends
///
/// This test verifies:
/// 1. Database connection and schema
/// 2. Job creation, claim and completion through PgJobStore
/// 3. Rejection of non-forward transitions
/// 4. Job queue (enqueue/dequeue/complete)
///
/// Note: This requires a running PostgreSQL and Redis instance
/// configured via environment variables.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_full_integration() {
    let config = AppConfig::from_env().expect("Failed to load config");

    let db_pool = db::init_pool(&config.database_url, db::SERVER_MAX_CONNECTIONS)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let store = PgJobStore::new(db_pool);
    let queue = RedisJobQueue::new(&config.redis_url).expect("Failed to initialize queue");

    store.health_check().await.expect("Database health check failed");
    queue.health_check().await.expect("Redis health check failed");

    // 1. Job creation
    let hash = content_hash(b"integration test document");
    let job = store
        .create(&hash, "uploads/test/integration.png")
        .await
        .expect("Failed to create job");
    assert_eq!(job.status(), JobStatus::Pending);
    assert_eq!(job.document_hash, hash);

    // 2. Retrieval
    let fetched = store.get(job.id).await.expect("Failed to get job");
    assert_eq!(fetched.id, job.id);
    assert_eq!(fetched.state, JobState::Pending);

    // 3. Skipping straight to completed is rejected
    let completed = JobState::Completed {
        confidence_score: 0.91,
        analysis: AnalysisResults::new(true, AnalysisDetails::placeholder()),
        completed_at: chrono::Utc::now(),
    };
    let early = store.update(job.id, completed.clone()).await;
    assert!(matches!(early, Err(StoreError::InvalidTransition { .. })));

    // 4. Queue round trip
    let queued = QueuedJob::new(job.id);
    queue.enqueue(&queued).await.expect("Failed to enqueue");
    let dequeued = queue
        .dequeue()
        .await
        .expect("Failed to dequeue")
        .expect("No job in queue");
    assert_eq!(dequeued.job_id, job.id);

    // 5. Claim then complete
    let claimed = store.claim(job.id).await.expect("Failed to claim");
    assert_eq!(claimed.status(), JobStatus::Processing);

    let done = store
        .update(job.id, completed)
        .await
        .expect("Failed to complete job");
    assert_eq!(done.state.confidence_score(), Some(0.91));

    let final_job = store.get(job.id).await.expect("Failed to get job");
    assert_eq!(final_job.status(), JobStatus::Completed);
    assert!(final_job.state.completed_at().is_some());
    assert_eq!(final_job.state.analysis_results()["is_authentic"], true);

    // 6. Terminal jobs cannot move
    let again = store.claim(job.id).await;
    assert!(matches!(again, Err(StoreError::InvalidTransition { .. })));

    queue
        .complete(&dequeued)
        .await
        .expect("Failed to complete job in queue");
}

/// Two workers claiming the same job: the conditional UPDATE picks one.
#[tokio::test]
#[ignore]
async fn test_concurrent_claim_single_winner() {
    let config = AppConfig::from_env().expect("Failed to load config");
    let db_pool = db::init_pool(&config.database_url, db::SERVER_MAX_CONNECTIONS)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let store = Arc::new(PgJobStore::new(db_pool));
    let job = store
        .create(&content_hash(b"race"), "uploads/test/race.png")
        .await
        .expect("Failed to create job");

    let attempts = (0..4).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.claim(job.id).await })
    });
    let winners = futures::future::join_all(attempts)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();

    assert_eq!(winners, 1);
}

/// Failing a job stores the error and no score.
#[tokio::test]
#[ignore]
async fn test_failed_job_persists_error() {
    let config = AppConfig::from_env().expect("Failed to load config");
    let db_pool = db::init_pool(&config.database_url, db::SERVER_MAX_CONNECTIONS)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let store = PgJobStore::new(db_pool);
    let job = store
        .create(&content_hash(b"broken"), "uploads/test/broken.jpg")
        .await
        .expect("Failed to create job");
    store.claim(job.id).await.expect("Failed to claim");

    store
        .update(
            job.id,
            JobState::Failed {
                error: "Failed to decode document image".to_string(),
            },
        )
        .await
        .expect("Failed to mark job failed");

    let failed = store.get(job.id).await.expect("Failed to get job");
    assert_eq!(failed.status(), JobStatus::Failed);
    assert_eq!(failed.state.confidence_score(), None);
    assert_eq!(
        failed.state.analysis_results()["error"],
        "Failed to decode document image"
    );
}
