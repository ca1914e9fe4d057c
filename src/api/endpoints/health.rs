//! Liveness and component status.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::AppState;

#[derive(Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: &'static str,
    pub vocabulary_size: usize,
    pub diseases: usize,
    pub medicine_search: &'static str,
    pub sms: bool,
    pub tables: Vec<TableSummary>,
}

/// `GET /health`
pub async fn check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let reference = &state.reference;
    let tables = reference
        .tables
        .summary()
        .into_iter()
        .map(|(name, rows)| TableSummary {
            name: name.to_string(),
            rows,
        })
        .collect();

    Ok(Json(HealthResponse {
        status: "ok",
        model: reference.classifier.status(),
        vocabulary_size: reference.vocabulary.len(),
        diseases: reference.labels.len(),
        medicine_search: state.search.status(),
        sms: state.sms.is_some(),
        tables,
    }))
}
