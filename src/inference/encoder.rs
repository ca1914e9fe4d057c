//! Binary symptom feature encoding.
//!
//! Unknown tokens are dropped instead of rejecting the request. The cost of
//! that policy is that input made entirely of unknown symptoms encodes to an
//! all-zero vector and the classifier still returns *some* label; callers
//! should check [`FeatureVector::is_zero`] and warn.

use super::vocabulary::SymptomVocabulary;

/// Presence vector over the symptom vocabulary. Values are 0.0 or 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    /// Wrap raw values, e.g. a vector produced outside the encoder.
    pub fn from_values(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// `true` if no vocabulary symptom is set.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Indices set to 1, ascending.
    pub fn active_indices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    fn set(&mut self, index: usize) {
        self.values[index] = 1.0;
    }
}

/// Encoder output: the vector plus the tokens that matched nothing.
#[derive(Debug, Clone)]
pub struct Encoding {
    pub vector: FeatureVector,
    pub ignored: Vec<String>,
}

/// Encode normalized tokens against the vocabulary.
pub fn encode(tokens: &[String], vocabulary: &SymptomVocabulary) -> Encoding {
    let mut vector = FeatureVector::zeros(vocabulary.len());
    let mut ignored = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        match vocabulary.index_of(token) {
            Some(index) => vector.set(index),
            None => {
                tracing::debug!(symptom = %token, "unknown symptom ignored");
                ignored.push(token.clone());
            }
        }
    }

    Encoding { vector, ignored }
}
