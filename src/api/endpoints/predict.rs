//! Symptom-based disease prediction.

use std::sync::Arc;

use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::inference::{self, Diagnosis};

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    #[serde(default)]
    pub symptoms: String,
}

#[derive(Serialize)]
pub struct PredictResponse {
    /// Disease name, or the fallback text for degraded outcomes.
    pub headline: String,
    #[serde(flatten)]
    pub diagnosis: Diagnosis,
}

/// `POST /predict` with form field `symptoms` (comma-separated).
pub async fn predict(
    State(state): State<AppState>,
    Form(form): Form<PredictForm>,
) -> Result<Json<PredictResponse>, ApiError> {
    let reference = Arc::clone(&state.reference);
    let diagnosis =
        tokio::task::spawn_blocking(move || inference::diagnose(&reference, &form.symptoms))
            .await??;

    Ok(Json(PredictResponse {
        headline: diagnosis.headline().to_string(),
        diagnosis,
    }))
}
