//! Symptom-based disease inference.
//!
//! [`diagnose`] runs the whole pipeline against a shared [`ReferenceContext`]:
//! normalize → encode → classify → resolve label → build advisory bundle.
//! Each call is a pure function of its input and the loaded context, so one
//! context can serve any number of concurrent requests without locking.
//!
//! Only empty input is an error. A missing model, an unmapped class code,
//! unknown symptoms, and missing reference rows all degrade into a
//! well-defined [`Diagnosis`].

pub mod bundle;
pub mod encoder;
pub mod normalize;
pub mod vocabulary;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::classifier::{self, ClassifierState};
use crate::config::MedwiseConfig;
use crate::reference::ReferenceTables;
use bundle::{build_bundle, AdvisoryBundle};
use vocabulary::{DiseaseLabels, SymptomVocabulary};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("no symptoms supplied")]
    EmptyInput,

    #[error("classifier failed: {0}")]
    Classifier(String),
}

/// Everything inference reads, loaded once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ReferenceContext {
    pub vocabulary: SymptomVocabulary,
    pub labels: DiseaseLabels,
    pub classifier: ClassifierState,
    pub tables: ReferenceTables,
}

impl ReferenceContext {
    pub fn new(
        vocabulary: SymptomVocabulary,
        labels: DiseaseLabels,
        classifier: ClassifierState,
        tables: ReferenceTables,
    ) -> Self {
        Self {
            vocabulary,
            labels,
            classifier,
            tables,
        }
    }

    /// Load vocabulary, labels, tables, and the classifier from config.
    ///
    /// Missing files degrade (empty vocabulary/labels/tables, unavailable
    /// model); files that exist but are malformed are errors.
    pub fn load(config: &MedwiseConfig) -> Result<Self> {
        let vocabulary_path = config.data_file(&config.data.vocabulary);
        let vocabulary = if vocabulary_path.exists() {
            SymptomVocabulary::load(&vocabulary_path)?
        } else {
            tracing::warn!(path = %vocabulary_path.display(), "symptom vocabulary not found, using empty vocabulary");
            SymptomVocabulary::default()
        };

        let labels_path = config.data_file(&config.data.labels);
        let labels = if labels_path.exists() {
            DiseaseLabels::load(&labels_path)?
        } else {
            tracing::warn!(path = %labels_path.display(), "disease labels not found, every code will be unknown");
            DiseaseLabels::default()
        };

        let tables = ReferenceTables::load(config)?;
        let classifier = classifier::load_classifier(&config.model, vocabulary.len());

        tracing::info!(
            symptoms = vocabulary.len(),
            diseases = labels.len(),
            model = classifier.status(),
            "reference context ready"
        );

        Ok(Self::new(vocabulary, labels, classifier, tables))
    }
}

/// Outcome of one inference request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Diagnosis {
    Predicted {
        disease: String,
        code: i64,
        advisory: AdvisoryBundle,
        ignored_symptoms: Vec<String>,
    },
    /// The classifier produced a code with no label.
    UnknownDisease {
        code: i64,
        ignored_symptoms: Vec<String>,
    },
    /// No classifier is loaded. `reason` stays server-side.
    Unavailable {
        #[serde(skip)]
        reason: String,
        ignored_symptoms: Vec<String>,
    },
}

impl Diagnosis {
    /// Display text for the predicted disease.
    pub fn headline(&self) -> &str {
        match self {
            Self::Predicted { disease, .. } => disease,
            Self::UnknownDisease { .. } => "Unknown Disease",
            Self::Unavailable { .. } => "Model not loaded",
        }
    }
}

/// Run the full pipeline for a raw comma-separated symptom string.
pub fn diagnose(ctx: &ReferenceContext, raw_symptoms: &str) -> Result<Diagnosis, InferenceError> {
    let tokens = normalize::normalize_symptoms(raw_symptoms)?;
    let encoding = encoder::encode(&tokens, &ctx.vocabulary);

    let model = match &ctx.classifier {
        ClassifierState::Ready(model) => model,
        ClassifierState::Unavailable { reason } => {
            return Ok(Diagnosis::Unavailable {
                reason: reason.clone(),
                ignored_symptoms: encoding.ignored,
            })
        }
    };

    if encoding.vector.is_zero() {
        tracing::warn!(
            ignored = encoding.ignored.len(),
            "no known symptoms in input, prediction is not meaningful"
        );
    }

    let code = model
        .predict(&encoding.vector)
        .map_err(|e| InferenceError::Classifier(format!("{e:#}")))?;

    let Some(disease) = ctx.labels.name(code) else {
        tracing::warn!(code, "classifier returned a code with no disease label");
        return Ok(Diagnosis::UnknownDisease {
            code,
            ignored_symptoms: encoding.ignored,
        });
    };

    let advisory = build_bundle(disease, &ctx.tables);
    tracing::debug!(disease, code, empty = advisory.is_empty(), "diagnosis resolved");

    Ok(Diagnosis::Predicted {
        disease: disease.to_string(),
        code,
        advisory,
        ignored_symptoms: encoding.ignored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DiseaseClassifier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a fixed code and counts calls.
    struct FixedClassifier {
        code: i64,
        calls: AtomicUsize,
    }

    impl DiseaseClassifier for FixedClassifier {
        fn predict(&self, _features: &encoder::FeatureVector) -> Result<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.code)
        }
    }

    fn context(code: i64) -> (ReferenceContext, Arc<FixedClassifier>) {
        let model = Arc::new(FixedClassifier {
            code,
            calls: AtomicUsize::new(0),
        });
        let ctx = ReferenceContext::new(
            SymptomVocabulary::from_names(["itching"]).unwrap(),
            DiseaseLabels::new(vec![(0, "Fungal infection".to_string())]).unwrap(),
            ClassifierState::Ready(model.clone()),
            ReferenceTables::default(),
        );
        (ctx, model)
    }

    #[test]
    fn empty_input_never_reaches_the_classifier() {
        let (ctx, model) = context(0);
        assert!(matches!(diagnose(&ctx, "  "), Err(InferenceError::EmptyInput)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn known_code_resolves_to_disease() {
        let (ctx, _) = context(0);
        match diagnose(&ctx, "itching, mystery").unwrap() {
            Diagnosis::Predicted {
                disease,
                code,
                advisory,
                ignored_symptoms,
            } => {
                assert_eq!(disease, "Fungal infection");
                assert_eq!(code, 0);
                assert!(advisory.is_empty());
                assert_eq!(ignored_symptoms, vec!["mystery"]);
            }
            other => panic!("unexpected diagnosis: {other:?}"),
        }
    }

    #[test]
    fn unmapped_code_is_unknown_disease() {
        let (ctx, _) = context(41);
        let diagnosis = diagnose(&ctx, "itching").unwrap();
        assert!(matches!(diagnosis, Diagnosis::UnknownDisease { code: 41, .. }));
        assert_eq!(diagnosis.headline(), "Unknown Disease");
    }

    #[test]
    fn unavailable_model_degrades() {
        let (mut ctx, _) = context(0);
        ctx.classifier = ClassifierState::Unavailable {
            reason: "missing".into(),
        };
        let diagnosis = diagnose(&ctx, "itching, mystery").unwrap();
        assert_eq!(diagnosis.headline(), "Model not loaded");
        match &diagnosis {
            Diagnosis::Unavailable {
                reason,
                ignored_symptoms,
            } => {
                assert_eq!(reason, "missing");
                assert_eq!(ignored_symptoms, &vec!["mystery".to_string()]);
            }
            other => panic!("unexpected diagnosis: {other:?}"),
        }

        let json = serde_json::to_value(&diagnosis).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert!(json.get("reason").is_none());
        assert_eq!(json["ignored_symptoms"], serde_json::json!(["mystery"]));
    }

    #[test]
    fn diagnosis_serializes_with_status_tag() {
        let (ctx, _) = context(0);
        let json = serde_json::to_value(diagnose(&ctx, "itching").unwrap()).unwrap();
        assert_eq!(json["status"], "predicted");
        assert_eq!(json["disease"], "Fungal infection");
        assert_eq!(json["advisory"]["precautions"], serde_json::json!([]));
    }
}
