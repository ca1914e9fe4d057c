//! CLI `doctor` command: report what loaded and what is missing.

use anyhow::{Context, Result};

use crate::classifier::ClassifierState;
use crate::config::MedwiseConfig;
use crate::db;
use crate::embedding::local::model_dir;
use crate::inference::ReferenceContext;
use crate::medicines::MedicineCatalog;

pub fn doctor(config: &MedwiseConfig) -> Result<()> {
    println!("Medwise Health Report");
    println!("=====================");
    println!();

    let ctx = ReferenceContext::load(config).context("failed to load reference data")?;

    println!("Data directory:    {}", config.resolved_data_dir().display());
    println!("Symptoms:          {}", ctx.vocabulary.len());
    println!("Diseases:          {}", ctx.labels.len());
    println!("Reference tables:");
    for (name, rows) in ctx.tables.summary() {
        let note = if rows == 0 { "  (empty or missing)" } else { "" };
        println!("  {name:<16} {rows} rows{note}");
    }
    println!();

    println!("Classifier:        {} ({})", config.resolved_model_path().display(), config.model.format);
    match &ctx.classifier {
        ClassifierState::Ready(_) => println!("  Status:          ready"),
        ClassifierState::Unavailable { reason } => {
            println!("  Status:          UNAVAILABLE ({reason})");
            println!("  Predictions will report \"Model not loaded\".");
        }
    }
    println!();

    let catalog = MedicineCatalog::load(&config.data_file(&config.data.medicines))?;
    let encoder = model_dir(&config.matcher).join("model.onnx");
    println!("Medicine catalog:  {} names", catalog.len());
    println!(
        "Search model:      {} ({})",
        config.matcher.model,
        if encoder.exists() { "present" } else { "missing, run `medwise model download`" }
    );
    println!();

    let db_path = config.resolved_db_path();
    if db_path.exists() {
        let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
        let report = db::check_database_health(&conn).context("failed to run health check")?;
        println!("Database:          {}", db_path.display());
        println!("Schema version:    {}", report.schema_version);
        println!("  Accounts:        {} ({} pharmacies)", report.account_count, report.pharmacy_count);
        println!("  Stock lines:     {}", report.inventory_count);
        if report.integrity_ok {
            println!("Integrity check:   PASSED");
        } else {
            println!("Integrity check:   FAILED ({})", report.integrity_details);
        }
    } else {
        println!("Database:          not found at {} (created on first `medwise serve`)", db_path.display());
    }
    println!();

    println!(
        "Places API key:    {}",
        if config.locator.places_api_key.is_empty() { "not set" } else { "set" }
    );
    println!(
        "SMS:               {}",
        if config.sms.is_configured() { "configured" } else { "not configured" }
    );

    Ok(())
}
