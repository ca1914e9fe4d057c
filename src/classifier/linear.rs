//! Linear one-vs-rest classifier read from JSON.
//!
//! The file holds the fitted parameters of a linear model:
//!
//! ```json
//! { "classes": [0, 1, 2], "coef": [[...], [...], [...]], "intercept": [0.1, -0.2, 0.0] }
//! ```
//!
//! With two classes a single coefficient row is a binary decision function
//! (positive score → `classes[1]`), matching the scikit-learn layout.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::DiseaseClassifier;
use crate::inference::encoder::FeatureVector;

#[derive(Debug, Clone, Deserialize)]
pub struct LinearClassifier {
    classes: Vec<i64>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

impl LinearClassifier {
    pub fn new(classes: Vec<i64>, coef: Vec<Vec<f32>>, intercept: Vec<f32>) -> Result<Self> {
        let classifier = Self {
            classes,
            coef,
            intercept,
        };
        classifier.validate()?;
        Ok(classifier)
    }

    pub fn load(path: &Path) -> Result<Self> {
        anyhow::ensure!(path.exists(), "classifier model not found at {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let classifier: Self =
            serde_json::from_str(&contents).context("failed to parse linear model JSON")?;
        classifier.validate()?;
        tracing::info!(
            model = %path.display(),
            classes = classifier.classes.len(),
            features = classifier.width(),
            "linear classifier loaded"
        );
        Ok(classifier)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.classes.is_empty(), "model has no classes");
        anyhow::ensure!(!self.coef.is_empty(), "model has no coefficients");
        anyhow::ensure!(
            self.is_binary() || self.coef.len() == self.classes.len(),
            "{} coefficient rows for {} classes",
            self.coef.len(),
            self.classes.len()
        );
        anyhow::ensure!(
            self.intercept.len() == self.coef.len(),
            "{} intercepts for {} coefficient rows",
            self.intercept.len(),
            self.coef.len()
        );
        let width = self.width();
        anyhow::ensure!(
            self.coef.iter().all(|row| row.len() == width),
            "coefficient rows have different lengths"
        );
        Ok(())
    }

    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coef.len() == 1
    }

    fn width(&self) -> usize {
        self.coef.first().map(Vec::len).unwrap_or(0)
    }

    fn scores(&self, x: &[f32]) -> Vec<f32> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect()
    }
}

impl DiseaseClassifier for LinearClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        anyhow::ensure!(
            features.len() == self.width(),
            "expected {} features, got {}",
            self.width(),
            features.len()
        );

        let scores = self.scores(features.as_slice());

        if self.is_binary() {
            let class = if scores[0] > 0.0 { 1 } else { 0 };
            return Ok(self.classes[class]);
        }

        // First maximum wins ties.
        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }

    fn feature_count(&self) -> Option<usize> {
        Some(self.width())
    }
}
