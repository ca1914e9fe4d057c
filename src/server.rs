//! HTTP server startup.
//!
//! [`build_state`] loads everything the handlers share; [`serve`] binds the
//! router and runs until ctrl-c.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use crate::api::{self, AppState};
use crate::config::MedwiseConfig;
use crate::db;
use crate::inference::ReferenceContext;
use crate::locator::LocatorClient;
use crate::medicines;
use crate::reminder::TwilioSender;

/// Load reference data, open the database, index the medicine catalog, and
/// set up the outbound clients.
pub fn build_state(config: &MedwiseConfig) -> Result<AppState> {
    let reference = ReferenceContext::load(config).context("failed to load reference data")?;

    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let search = medicines::load_search(config);
    let locator = LocatorClient::new(config.locator.clone())?;

    let sms = if config.sms.is_configured() {
        Some(Arc::new(TwilioSender::new(config.sms.clone())?))
    } else {
        tracing::info!("SMS credentials not set, reminders disabled");
        None
    };

    Ok(AppState {
        reference: Arc::new(reference),
        db: Arc::new(Mutex::new(conn)),
        search,
        locator,
        sms,
        top_n: config.matcher.top_n,
    })
}

pub async fn serve(config: MedwiseConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || build_state(&config)).await??
    };
    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "medwise listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}
