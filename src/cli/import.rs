//! CLI import commands for pharmacy accounts and stock lists.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::accounts::{self, AccountError, AccountKind};
use crate::config::MedwiseConfig;
use crate::inventory::{self, StockItem};

/// One entry of a pharmacies JSON file.
#[derive(Debug, Deserialize)]
pub struct PharmacyRecord {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One row of an inventory CSV file.
#[derive(Debug, Deserialize)]
pub struct InventoryRecord {
    pub medicine_name: String,
    pub quantity: u32,
    pub added_by: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: u64,
    pub skipped: u64,
}

/// Register every pharmacy in a JSON array. Existing usernames are skipped.
pub fn import_pharmacies(config: &MedwiseConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;
    let records: Vec<PharmacyRecord> =
        serde_json::from_str(&json).context("failed to parse pharmacies JSON")?;

    let mut conn = crate::db::open_database(config.resolved_db_path())?;
    let summary = register_pharmacies(&mut conn, &records)?;

    println!("Import complete:");
    println!("  Pharmacies imported: {}", summary.imported);
    println!("  Pharmacies skipped:  {} (already exist)", summary.skipped);
    Ok(())
}

pub fn register_pharmacies(
    conn: &mut rusqlite::Connection,
    records: &[PharmacyRecord],
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for record in records {
        match accounts::register(
            conn,
            &record.username,
            &record.password,
            AccountKind::Pharmacy,
            record.name.as_deref(),
        ) {
            Ok(_) => summary.imported += 1,
            Err(AccountError::UsernameTaken(_)) => summary.skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(summary)
}

/// Load stock lines from CSV. Each listed pharmacy's stock is replaced by its
/// rows in the file; rows for unknown pharmacies are skipped.
pub fn import_inventory(config: &MedwiseConfig, file: &Path) -> Result<()> {
    let reader = std::fs::File::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?;
    let mut conn = crate::db::open_database(config.resolved_db_path())?;
    let summary = load_inventory(&mut conn, reader)?;

    println!("Import complete:");
    println!("  Stock lines imported: {}", summary.imported);
    if summary.skipped > 0 {
        println!("  Stock lines skipped:  {} (unknown pharmacy)", summary.skipped);
    }
    Ok(())
}

pub fn load_inventory<R: std::io::Read>(
    conn: &mut rusqlite::Connection,
    reader: R,
) -> Result<ImportSummary> {
    let mut by_pharmacy: BTreeMap<String, Vec<StockItem>> = BTreeMap::new();
    let mut csv = csv::Reader::from_reader(reader);
    for (line, record) in csv.deserialize::<InventoryRecord>().enumerate() {
        let record = record.with_context(|| format!("malformed inventory row {}", line + 1))?;
        by_pharmacy
            .entry(record.added_by.trim().to_string())
            .or_default()
            .push(StockItem {
                medicine_name: record.medicine_name,
                quantity: record.quantity,
            });
    }

    let mut summary = ImportSummary::default();
    for (pharmacy, items) in by_pharmacy {
        let known = matches!(
            accounts::get_account(conn, &pharmacy)?,
            Some(account) if account.kind == AccountKind::Pharmacy
        );
        if !known {
            tracing::warn!(pharmacy, rows = items.len(), "skipping stock for unknown pharmacy");
            summary.skipped += items.len() as u64;
            continue;
        }
        summary.imported += inventory::replace_inventory(conn, &pharmacy, &items)? as u64;
    }
    Ok(summary)
}
