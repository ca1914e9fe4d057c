//! Medicine search with stockists and, when a location is given, nearby
//! pharmacy details.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::inventory;
use crate::locator::Coordinates;
use crate::medicines::{self, locate_stockists, SearchState, StockistLocation};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Free-text place, geocoded when `lat`/`lon` are absent.
    pub place: Option<String>,
}

#[derive(Serialize)]
pub struct MedicineResult {
    pub medicine: String,
    pub score: f32,
    pub stockists: Vec<StockistLocation>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub origin: Option<Coordinates>,
    pub results: Vec<MedicineResult>,
}

/// `GET /medicines/search?q=&lat=&lon=&place=`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let index = match &state.search {
        SearchState::Ready(index) => Arc::clone(index),
        SearchState::Unavailable { reason } => {
            tracing::debug!(reason, "medicine search requested while unavailable");
            return Err(ApiError::Unavailable(
                "Medicine search is unavailable".into(),
            ));
        }
    };

    let query = params.q.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Please enter a medicine name.".into()));
    }

    let matches = medicines::search_blocking(index, &query, state.top_n).await?;

    let origin = resolve_origin(&state, &params).await;
    let nearby = match origin {
        Some(origin) => state
            .locator
            .nearby_pharmacies(origin)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %format!("{e:#}"), "nearby pharmacy lookup failed");
                Vec::new()
            }),
        None => Vec::new(),
    };

    let names: Vec<String> = matches.iter().map(|m| m.name.clone()).collect();
    let stockists = state
        .with_db(move |conn| {
            names
                .iter()
                .map(|name| Ok(inventory::stockist_names(conn, name)?))
                .collect::<Result<Vec<_>, ApiError>>()
        })
        .await?;

    let cutoff = state.locator.match_cutoff();
    let results = matches
        .into_iter()
        .zip(stockists)
        .map(|(m, names)| MedicineResult {
            stockists: locate_stockists(&names, &nearby, origin, cutoff),
            medicine: m.name,
            score: m.score,
        })
        .collect();

    tracing::info!(query = %query, located = origin.is_some(), "medicine search");
    Ok(Json(SearchResponse {
        query,
        origin,
        results,
    }))
}

/// Explicit coordinates win; otherwise geocode `place`. Lookup failures leave
/// the search unlocated rather than failing it.
async fn resolve_origin(state: &AppState, params: &SearchQuery) -> Option<Coordinates> {
    if let (Some(lat), Some(lon)) = (params.lat, params.lon) {
        return Some(Coordinates::new(lat, lon));
    }
    let place = params.place.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
    match state.locator.geocode(place).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(place, error = %format!("{e:#}"), "geocoding failed");
            None
        }
    }
}
