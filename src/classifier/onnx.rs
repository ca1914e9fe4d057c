//! ONNX Runtime classifier.
//!
//! Runs a classifier exported to ONNX (skl2onnx layout: one `[1, N]` f32
//! input, an `i64` `label` output).

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;

use super::DiseaseClassifier;
use crate::inference::encoder::FeatureVector;

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    /// Last dimension of the input tensor; `None` when the graph leaves it symbolic.
    width: Option<usize>,
}

// Safety: Session is only reached through the Mutex, which serializes run().
unsafe impl Send for OnnxClassifier {}
unsafe impl Sync for OnnxClassifier {}

impl OnnxClassifier {
    pub fn new(model_path: &Path, input_name: &str) -> Result<Self> {
        anyhow::ensure!(
            model_path.exists(),
            "classifier model not found at {}",
            model_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(model_path)
            .context("failed to load ONNX classifier")?;

        let width = input_width(&session, input_name)?;
        tracing::info!(
            model = %model_path.display(),
            input = input_name,
            width = ?width,
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name: input_name.to_string(),
            width,
        })
    }
}

/// Declared feature width of the named input. Errors if the graph has no such input.
fn input_width(session: &Session, input_name: &str) -> Result<Option<usize>> {
    let Some(input) = session.inputs().iter().find(|i| i.name() == input_name) else {
        let names: Vec<&str> = session.inputs().iter().map(|i| i.name()).collect();
        anyhow::bail!("model has no input named `{input_name}` (inputs: {names:?})");
    };
    Ok(input
        .dtype()
        .tensor_shape()
        .and_then(|shape| shape.last().copied())
        .and_then(|dim| usize::try_from(dim).ok()))
}

impl DiseaseClassifier for OnnxClassifier {
    fn feature_count(&self) -> Option<usize> {
        self.width
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, features.as_slice().to_vec().into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            self.input_name.as_str() => input,
        })?;

        // skl2onnx names the class output "label"; fall back to the first output.
        let label = outputs.get("label").unwrap_or_else(|| &outputs[0]);
        let (_, data) = label
            .try_extract_tensor::<i64>()
            .context("failed to extract label tensor")?;

        data.first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("classifier returned an empty label tensor"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = OnnxClassifier::new(&tmp.path().join("svc.onnx"), "float_input")
            .err()
            .expect("load should fail");
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    #[ignore] // Requires an exported model: MEDWISE_TEST_ONNX=/path/svc.onnx cargo test -- --ignored
    fn predicts_a_label() {
        let path = std::env::var("MEDWISE_TEST_ONNX").expect("MEDWISE_TEST_ONNX");
        let classifier = OnnxClassifier::new(Path::new(&path), "float_input").unwrap();
        let width: usize = std::env::var("MEDWISE_TEST_WIDTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(132);
        let first = classifier.predict(&FeatureVector::zeros(width)).unwrap();
        let second = classifier.predict(&FeatureVector::zeros(width)).unwrap();
        assert_eq!(first, second, "same input must produce the same label");
    }

    #[test]
    #[ignore] // Requires an exported model: MEDWISE_TEST_ONNX=/path/svc.onnx cargo test -- --ignored
    fn width_mismatch_leaves_classifier_unavailable() {
        use crate::classifier::load_classifier;
        use crate::config::ModelConfig;

        let path = std::env::var("MEDWISE_TEST_ONNX").expect("MEDWISE_TEST_ONNX");
        let classifier = OnnxClassifier::new(Path::new(&path), "float_input").unwrap();
        let width = classifier.feature_count().expect("model declares its input width");

        let config = ModelConfig {
            format: "onnx".into(),
            path: path.clone(),
            input_name: "float_input".into(),
        };
        assert!(load_classifier(&config, width).is_ready());
        assert!(!load_classifier(&config, width + 1).is_ready());
        assert!(!load_classifier(&config, 0).is_ready());

        let wrong_input = ModelConfig {
            input_name: "no_such_input".into(),
            ..config
        };
        assert!(!load_classifier(&wrong_input, width).is_ready());
    }
}
