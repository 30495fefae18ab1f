use doc_forensics::{
    config::AppConfig,
    db::{self, JobStore, PgJobStore},
    services::{
        detector::{ForgeryDetector, ModelHandle},
        processor::{self, ProcessOutcome},
        queue::{JobQueue, RedisJobQueue},
    },
    telemetry,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    tracing::info!("Starting forgery detection worker");

    let config = AppConfig::from_env().expect("Failed to load configuration");

    if let Some(addr) = config.worker_metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .expect("Failed to install Prometheus exporter");
        telemetry::describe_metrics();
        tracing::info!(%addr, "Serving worker metrics");
    }

    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url, config.worker_concurrency as u32 + 1)
        .await
        .expect("Failed to connect to database");
    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db_pool));

    tracing::info!("Connecting to Redis job queue");
    let queue: Arc<dyn JobQueue> =
        Arc::new(RedisJobQueue::new(&config.redis_url).expect("Failed to initialize job queue"));

    // The model is loaded exactly once here; a missing artifact is fatal.
    let model_path = config.model_path.clone();
    let channel_order = config.channel_order;
    let model = tokio::task::spawn_blocking(move || ModelHandle::load(model_path, channel_order))
        .await
        .expect("Model loading task panicked")
        .expect("Failed to load forgery detection model");
    let model = Arc::new(model);

    #[cfg(unix)]
    spawn_reload_listener(Arc::clone(&model));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    tracing::info!(
        concurrency = config.worker_concurrency,
        "Worker ready, starting job processing loop"
    );

    let consumers: Vec<_> = (0..config.worker_concurrency)
        .map(|consumer| {
            tokio::spawn(consume(
                consumer,
                Arc::clone(&store),
                Arc::clone(&queue),
                Arc::clone(&model),
                poll_interval,
                shutdown_rx.clone(),
            ))
        })
        .collect();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown requested, finishing in-flight jobs");
    let _ = shutdown_tx.send(true);

    for consumer in consumers {
        if let Err(e) = consumer.await {
            tracing::error!(error = %e, "Consumer task ended abnormally");
        }
    }

    tracing::info!("Worker stopped");
}

/// One queue consumer. Runs until shutdown is signalled; job errors never
/// end the loop.
async fn consume(
    consumer: usize,
    store: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
    model: Arc<ModelHandle>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        match process_next_job(store.as_ref(), queue.as_ref(), &model).await {
            Ok(true) => {
                tracing::debug!(consumer, "Job processed, checking for next job");
                continue;
            }
            Ok(false) => {
                tracing::trace!(consumer, "No jobs available, sleeping");
            }
            Err(e) => {
                tracing::error!(consumer, error = %e, "Error processing job, will retry");
            }
        }

        tokio::select! {
            _ = sleep(poll_interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::debug!(consumer, "Consumer stopped");
}

/// Process the next job from the queue.
/// Returns Ok(true) if a job was handled, Ok(false) if none was available.
async fn process_next_job(
    store: &dyn JobStore,
    queue: &dyn JobQueue,
    model: &ModelHandle,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let job = match queue.dequeue().await? {
        Some(j) => j,
        None => return Ok(false),
    };

    if let Ok(depth) = queue.queue_depth().await {
        metrics::gauge!("verification_queue_depth").set(depth as f64);
    }

    tracing::info!(job_id = %job.job_id, attempt = job.attempt, "Dequeued verification job");

    let detector: Arc<dyn ForgeryDetector> = model.current();
    if let Some(ProcessOutcome::Skipped) = processor::dispatch(store, queue, detector, &job).await? {
        tracing::debug!(job_id = %job.job_id, "Nothing to do for job");
    }

    Ok(true)
}

/// Reload the model from disk whenever the process receives SIGHUP.
#[cfg(unix)]
fn spawn_reload_listener(model: Arc<ModelHandle>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGHUP, model reload disabled");
                return;
            }
        };

        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, reloading forgery detection model");
            let handle = Arc::clone(&model);
            match tokio::task::spawn_blocking(move || handle.reload()).await {
                Ok(Ok(())) => tracing::info!("Model reloaded"),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Model reload failed, keeping previous model")
                }
                Err(e) => tracing::error!(error = %e, "Model reload task panicked"),
            }
        }
    });
}
