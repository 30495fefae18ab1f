use tracing_subscriber::EnvFilter;

/// Initialize structured JSON logging, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}

/// Register descriptions for the application metrics.
pub fn describe_metrics() {
    metrics::describe_histogram!(
        "verification_processing_seconds",
        "Time to run forgery detection on a document"
    );
    metrics::describe_counter!(
        "verification_jobs_total",
        "Total verification jobs submitted"
    );
    metrics::describe_counter!(
        "verification_jobs_completed",
        "Total verification jobs completed"
    );
    metrics::describe_counter!(
        "verification_jobs_failed",
        "Total verification jobs that failed"
    );
    metrics::describe_gauge!(
        "verification_queue_depth",
        "Current number of jobs waiting in the queue"
    );
}
