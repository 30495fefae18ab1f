use garde::Validate;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::services::detector::ChannelOrder;

#[derive(Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    #[garde(length(min = 1))]
    pub bind_addr: String,

    /// PostgreSQL connection string
    #[garde(length(min = 1))]
    pub database_url: String,

    /// Redis connection string for job queue
    #[garde(length(min = 1))]
    pub redis_url: String,

    /// Directory where uploaded documents are stored
    #[serde(default = "default_upload_dir")]
    #[garde(skip)]
    pub upload_dir: PathBuf,

    /// ONNX forgery detection model artifact (worker only)
    #[serde(default = "default_model_path")]
    #[garde(skip)]
    pub model_path: PathBuf,

    /// Channel order the model was trained with
    #[serde(default)]
    #[garde(skip)]
    pub channel_order: ChannelOrder,

    /// Number of concurrent job consumers per worker process
    #[serde(default = "default_worker_concurrency")]
    #[garde(range(min = 1, max = 64))]
    pub worker_concurrency: usize,

    /// Delay between queue polls when the queue is empty
    #[serde(default = "default_poll_interval_ms")]
    #[garde(range(min = 10, max = 60_000))]
    pub poll_interval_ms: u64,

    /// Address for the worker's Prometheus scrape endpoint (disabled when unset)
    #[serde(default)]
    #[garde(skip)]
    pub worker_metrics_addr: Option<SocketAddr>,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    #[garde(range(min = 1, max = 104_857_600))]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/forgery_detection_model.onnx")
}

fn default_worker_concurrency() -> usize {
    2
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit set of variables (used by `from_env` and tests).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
