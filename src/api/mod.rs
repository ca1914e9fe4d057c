//! HTTP API.
//!
//! [`router`] returns a composable `Router` over a shared [`AppState`].
//! Blocking work (SQLite, ONNX inference) runs on the blocking pool.

pub mod endpoints;
pub mod error;

use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;

use crate::inference::ReferenceContext;
use crate::locator::LocatorClient;
use crate::medicines::SearchState;
use crate::reminder::TwilioSender;
use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub reference: Arc<ReferenceContext>,
    pub db: Arc<Mutex<Connection>>,
    pub search: SearchState,
    pub locator: LocatorClient,
    /// `None` when SMS credentials are not configured.
    pub sms: Option<Arc<TwilioSender>>,
    pub top_n: usize,
}

impl AppState {
    /// Run `f` against the database on the blocking pool.
    pub(crate) async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| ApiError::Internal(format!("db lock poisoned: {e}")))?;
            f(&mut conn)
        })
        .await?
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/predict", post(endpoints::predict::predict))
        .route("/register", post(endpoints::accounts::register))
        .route("/login", post(endpoints::accounts::login))
        .route("/medicines/search", get(endpoints::medicines::search))
        .route(
            "/inventory/{pharmacy}",
            get(endpoints::inventory::list).put(endpoints::inventory::replace),
        )
        .route("/reminders", post(endpoints::reminders::send))
        .with_state(state)
}
