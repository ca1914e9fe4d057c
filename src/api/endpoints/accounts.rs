//! Registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::accounts::{self, Account, AccountKind};
use crate::api::error::ApiError;
use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub kind: Option<AccountKind>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub status: &'static str,
    pub account: Account,
}

/// `POST /register`. Accounts are patients unless `kind=pharmacy`.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let kind = form.kind.unwrap_or(AccountKind::Patient);
    let display_name = form
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let account = state
        .with_db(move |conn| {
            Ok(accounts::register(
                conn,
                &form.username,
                &form.password,
                kind,
                display_name.as_deref(),
            )?)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            status: "registered",
            account,
        }),
    ))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .with_db(move |conn| Ok(accounts::verify(conn, &form.username, &form.password)?))
        .await?;

    match account {
        Some(account) => {
            tracing::info!(username = %account.username, "login succeeded");
            Ok(Json(AccountResponse {
                status: "ok",
                account,
            }))
        }
        None => Err(ApiError::Unauthorized),
    }
}
