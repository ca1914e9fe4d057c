//! Disease classifier loading.
//!
//! The classifier is an opaque pretrained artifact: a feature vector goes in,
//! an integer class code comes out. It is loaded once at startup. A missing or
//! broken artifact does not stop the process; it produces
//! [`ClassifierState::Unavailable`] and every prediction degrades to
//! "prediction unavailable".

pub mod linear;
pub mod onnx;

pub use linear::LinearClassifier;
pub use onnx::OnnxClassifier;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{expand_tilde, ModelConfig};
use crate::inference::encoder::FeatureVector;

/// Maps a symptom feature vector to a class code.
///
/// Implementations must be deterministic for a given artifact and safe to
/// share across threads. `predict` is synchronous; async callers should use
/// `tokio::task::spawn_blocking`.
pub trait DiseaseClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<i64>;

    /// Expected input width, when the artifact declares one.
    fn feature_count(&self) -> Option<usize> {
        None
    }
}

#[derive(Clone)]
pub enum ClassifierState {
    Ready(Arc<dyn DiseaseClassifier>),
    Unavailable { reason: String },
}

impl ClassifierState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Short status for health reports.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

impl std::fmt::Debug for ClassifierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Load the configured classifier, degrading to `Unavailable` on any failure.
///
/// `feature_count` is the vocabulary size; an artifact that declares a
/// different input width is rejected up front.
pub fn load_classifier(config: &ModelConfig, feature_count: usize) -> ClassifierState {
    match try_load(config, feature_count) {
        Ok(classifier) => {
            tracing::info!(format = %config.format, "classifier ready");
            ClassifierState::Ready(Arc::from(classifier))
        }
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "classifier unavailable, predictions disabled");
            ClassifierState::Unavailable {
                reason: format!("{e:#}"),
            }
        }
    }
}

fn try_load(config: &ModelConfig, feature_count: usize) -> Result<Box<dyn DiseaseClassifier>> {
    let path = expand_tilde(&config.path);
    let classifier: Box<dyn DiseaseClassifier> = match config.format.as_str() {
        "onnx" => Box::new(onnx::OnnxClassifier::new(&path, &config.input_name)?),
        "linear" => Box::new(linear::LinearClassifier::load(&path)?),
        other => anyhow::bail!("unknown model format: {other}. Supported: onnx, linear"),
    };

    if let Some(expected) = classifier.feature_count() {
        anyhow::ensure!(
            expected == feature_count,
            "model expects {expected} features but the symptom vocabulary has {feature_count}"
        );
    }

    Ok(classifier)
}
