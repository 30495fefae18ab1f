//! Detector fixtures that exercise the real decode path without an ONNX model
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use doc_forensics::{
    models::detection::DetectionResult,
    services::detector::{analysis, preprocess, ChannelOrder, DetectionError, ForgeryDetector},
    services::queue::{JobQueue, QueueError, QueuedJob},
};

/// Decodes and preprocesses the document like the real detector, then
/// reports a fixed confidence instead of running a model.
pub struct FixedScoreDetector {
    pub confidence_score: f64,
}

impl ForgeryDetector for FixedScoreDetector {
    fn detect(&self, image_path: &Path) -> Result<DetectionResult, DetectionError> {
        let image = preprocess::load_image(image_path)?;
        let tensor = preprocess::image_to_tensor(&image, ChannelOrder::Bgr);
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        Ok(DetectionResult::new(
            self.confidence_score,
            analysis::analyze(&image),
        ))
    }
}

pub fn detector_with_score(confidence_score: f64) -> Arc<dyn ForgeryDetector> {
    Arc::new(FixedScoreDetector { confidence_score })
}

/// Queue whose backend is down: every call fails.
pub struct UnreachableQueue;

fn connection_refused() -> QueueError {
    QueueError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl JobQueue for UnreachableQueue {
    async fn enqueue(&self, _job: &QueuedJob) -> Result<(), QueueError> {
        Err(connection_refused())
    }

    async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError> {
        Err(connection_refused())
    }

    async fn complete(&self, _job: &QueuedJob) -> Result<(), QueueError> {
        Err(connection_refused())
    }

    async fn queue_depth(&self) -> Result<u64, QueueError> {
        Err(connection_refused())
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        Err(connection_refused())
    }
}
