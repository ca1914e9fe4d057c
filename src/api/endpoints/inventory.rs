//! Pharmacy stock lists.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::accounts::{self, AccountKind};
use crate::api::error::ApiError;
use crate::api::AppState;
use crate::inventory::{self, InventoryRow, StockItem};

#[derive(Serialize)]
pub struct InventoryResponse {
    pub pharmacy: String,
    pub items: Vec<InventoryRow>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceRequest {
    pub password: String,
    #[serde(default)]
    pub items: Vec<StockItem>,
}

#[derive(Serialize)]
pub struct ReplaceResponse {
    pub status: &'static str,
    pub pharmacy: String,
    pub count: usize,
}

/// `GET /inventory/{pharmacy}`
pub async fn list(
    State(state): State<AppState>,
    Path(pharmacy): Path<String>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let response = state
        .with_db(move |conn| {
            match accounts::get_account(conn, &pharmacy)? {
                Some(account) if account.kind == AccountKind::Pharmacy => {}
                _ => return Err(ApiError::NotFound(format!("pharmacy '{pharmacy}'"))),
            }
            let items = inventory::inventory_for(conn, &pharmacy)?;
            Ok(InventoryResponse { pharmacy, items })
        })
        .await?;
    Ok(Json(response))
}

/// `PUT /inventory/{pharmacy}`: replace the whole stock list. The body carries
/// the pharmacy's password.
pub async fn replace(
    State(state): State<AppState>,
    Path(pharmacy): Path<String>,
    Json(request): Json<ReplaceRequest>,
) -> Result<Json<ReplaceResponse>, ApiError> {
    if request
        .items
        .iter()
        .any(|item| item.medicine_name.trim().is_empty())
    {
        return Err(ApiError::BadRequest(
            "every stock item needs a medicine name".into(),
        ));
    }

    let response = state
        .with_db(move |conn| {
            let account = accounts::verify(conn, &pharmacy, &request.password)?
                .ok_or(ApiError::Unauthorized)?;
            if account.kind != AccountKind::Pharmacy {
                return Err(ApiError::Forbidden(
                    "only pharmacy accounts can publish stock".into(),
                ));
            }
            let count = inventory::replace_inventory(conn, &account.username, &request.items)?;
            Ok(ReplaceResponse {
                status: "updated",
                pharmacy: account.username,
                count,
            })
        })
        .await?;
    Ok(Json(response))
}
