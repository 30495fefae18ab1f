//! Forgery detection over document images.
//!
//! [`ImageDetector`] wraps a pre-trained ONNX classifier. The model is loaded
//! once and shared read-only between worker tasks; [`ModelHandle`] swaps in a
//! fresh copy when an operator asks for a reload.

pub mod analysis;
pub mod preprocess;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tract_onnx::prelude::*;

use crate::models::detection::DetectionResult;
use preprocess::{INPUT_CHANNELS, INPUT_SIZE};

/// Channel layout the model expects for its input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChannelOrder {
    /// OpenCV decode order, used when the model was trained on `cv2.imread` output.
    #[default]
    Bgr,
    Rgb,
}

/// Anything that can score a document image for forgery.
pub trait ForgeryDetector: Send + Sync {
    fn detect(&self, image_path: &Path) -> Result<DetectionResult, DetectionError>;
}

type ForgeryModel = TypedRunnableModel<TypedModel>;

/// ONNX-backed forgery detector.
pub struct ImageDetector {
    model: ForgeryModel,
    channel_order: ChannelOrder,
}

impl ImageDetector {
    /// Load and optimise the model artifact. A missing or corrupt file is an
    /// error; nothing is retried.
    pub fn load(model_path: &Path, channel_order: ChannelOrder) -> Result<Self, DetectionError> {
        let load_err = |e: TractError| DetectionError::ModelLoad {
            path: model_path.to_path_buf(),
            reason: e.to_string(),
        };

        if !model_path.is_file() {
            return Err(DetectionError::ModelLoad {
                path: model_path.to_path_buf(),
                reason: "model artifact not found".to_string(),
            });
        }

        let start = Instant::now();
        let input_shape = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS];
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| m.with_input_fact(0, f32::fact(input_shape).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(load_err)?;

        tracing::info!(
            model_path = %model_path.display(),
            channel_order = %channel_order,
            load_ms = start.elapsed().as_millis() as u64,
            "Forgery detection model loaded"
        );

        Ok(Self {
            model,
            channel_order,
        })
    }

    /// Forward pass; the first value of the first output is the confidence.
    fn score(&self, input: Tensor) -> Result<f64, DetectionError> {
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let first = outputs
            .first()
            .ok_or_else(|| DetectionError::Inference("model produced no outputs".to_string()))?;
        let value = first
            .to_array_view::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?
            .iter()
            .next()
            .copied()
            .ok_or_else(|| DetectionError::Inference("model output is empty".to_string()))?;

        validate_score(f64::from(value))
    }
}

impl ForgeryDetector for ImageDetector {
    fn detect(&self, image_path: &Path) -> Result<DetectionResult, DetectionError> {
        let image = preprocess::load_image(image_path)?;
        let input = preprocess::image_to_tensor(&image, self.channel_order);
        let confidence_score = self.score(input)?;
        let details = analysis::analyze(&image);

        tracing::debug!(
            image_path = %image_path.display(),
            confidence = confidence_score,
            "Detection complete"
        );

        Ok(DetectionResult::new(confidence_score, details))
    }
}

/// Reject model outputs that cannot be a probability.
pub fn validate_score(value: f64) -> Result<f64, DetectionError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DetectionError::InvalidOutput(value))
    }
}

/// Shared handle to the loaded detector.
pub struct ModelHandle {
    model_path: PathBuf,
    channel_order: ChannelOrder,
    current: RwLock<Arc<ImageDetector>>,
}

impl ModelHandle {
    pub fn load(model_path: impl Into<PathBuf>, channel_order: ChannelOrder) -> Result<Self, DetectionError> {
        let model_path = model_path.into();
        let detector = ImageDetector::load(&model_path, channel_order)?;
        Ok(Self {
            model_path,
            channel_order,
            current: RwLock::new(Arc::new(detector)),
        })
    }

    /// The detector in service right now.
    pub fn current(&self) -> Arc<ImageDetector> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Reload the artifact from disk. On failure the previous model stays in
    /// service.
    pub fn reload(&self) -> Result<(), DetectionError> {
        let detector = ImageDetector::load(&self.model_path, self.channel_order)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(detector);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode document image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model returned an invalid confidence score: {0}")]
    InvalidOutput(f64),
}
