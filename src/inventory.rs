//! Pharmacy stock.
//!
//! Each pharmacy owns its rows outright: an update replaces the pharmacy's
//! whole stock list in one transaction, so readers never see a half-written
//! list and other pharmacies' rows are never touched.

use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// A stock line as submitted by a pharmacy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub medicine_name: String,
    pub quantity: u32,
}

/// A stored stock line.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRow {
    pub medicine_name: String,
    pub quantity: u32,
    pub added_by: String,
    pub updated_at: String,
}

/// Stock lines of one pharmacy, in insertion order.
pub fn inventory_for(conn: &Connection, pharmacy: &str) -> Result<Vec<InventoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT medicine_name, quantity, added_by, updated_at FROM inventory \
         WHERE added_by = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![pharmacy], |row| {
            Ok(InventoryRow {
                medicine_name: row.get(0)?,
                quantity: row.get(1)?,
                added_by: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replace a pharmacy's stock with `items`. Returns the number of rows written.
///
/// Medicine names are trimmed; a blank name rejects the whole update.
pub fn replace_inventory(conn: &mut Connection, pharmacy: &str, items: &[StockItem]) -> Result<usize> {
    if let Some(pos) = items.iter().position(|i| i.medicine_name.trim().is_empty()) {
        bail!("stock item {} has no medicine name", pos + 1);
    }

    let tx = conn.transaction()?;
    let removed = tx.execute("DELETE FROM inventory WHERE added_by = ?1", params![pharmacy])?;

    let now = chrono::Utc::now().to_rfc3339();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO inventory (medicine_name, quantity, added_by, updated_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for item in items {
            stmt.execute(params![item.medicine_name.trim(), item.quantity, pharmacy, now])?;
        }
    }
    tx.commit()?;

    tracing::info!(pharmacy, removed, written = items.len(), "inventory replaced");
    Ok(items.len())
}

/// Pharmacies listing `medicine` (case-insensitive, any quantity), in the
/// order they first listed it.
pub fn stockists(conn: &Connection, medicine: &str) -> Result<Vec<String>> {
    matching_pharmacies(
        conn,
        "SELECT medicine_name, added_by FROM inventory ORDER BY id",
        medicine,
    )
}

/// Like [`stockists`], but each pharmacy is named by its display name when it
/// has one. These are the names matched against map listings.
pub fn stockist_names(conn: &Connection, medicine: &str) -> Result<Vec<String>> {
    matching_pharmacies(
        conn,
        "SELECT i.medicine_name, COALESCE(NULLIF(TRIM(a.display_name), ''), i.added_by) \
         FROM inventory i JOIN accounts a ON a.username = i.added_by \
         ORDER BY i.id",
        medicine,
    )
}

/// Runs `sql` (rows of `medicine_name, pharmacy`) and keeps the distinct
/// pharmacies whose medicine name equals `medicine` under Unicode lowercasing.
/// SQLite's NOCASE only folds ASCII.
fn matching_pharmacies(conn: &Connection, sql: &str, medicine: &str) -> Result<Vec<String>> {
    let wanted = medicine.trim().to_lowercase();
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut names: Vec<String> = Vec::new();
    while let Some(row) = rows.next()? {
        let listed: String = row.get(0)?;
        if listed.trim().to_lowercase() != wanted {
            continue;
        }
        let pharmacy: String = row.get(1)?;
        if !names.contains(&pharmacy) {
            names.push(pharmacy);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{register, AccountKind};

    fn test_db() -> Connection {
        let mut conn = crate::db::open_memory_database().unwrap();
        for name in ["cityrx", "northrx"] {
            register(&mut conn, name, "pw", AccountKind::Pharmacy, None).unwrap();
        }
        conn
    }

    fn item(name: &str, quantity: u32) -> StockItem {
        StockItem {
            medicine_name: name.into(),
            quantity,
        }
    }

    #[test]
    fn replace_only_touches_own_rows() {
        let mut conn = test_db();
        replace_inventory(&mut conn, "cityrx", &[item("Paracetamol", 10), item("Cetirizine", 3)]).unwrap();
        replace_inventory(&mut conn, "northrx", &[item("Paracetamol", 5)]).unwrap();

        replace_inventory(&mut conn, "cityrx", &[item("Ibuprofen", 7)]).unwrap();

        let city = inventory_for(&conn, "cityrx").unwrap();
        assert_eq!(city.len(), 1);
        assert_eq!(city[0].medicine_name, "Ibuprofen");
        assert_eq!(inventory_for(&conn, "northrx").unwrap().len(), 1);
    }

    #[test]
    fn blank_name_rejects_whole_update() {
        let mut conn = test_db();
        replace_inventory(&mut conn, "cityrx", &[item("Paracetamol", 10)]).unwrap();
        assert!(replace_inventory(&mut conn, "cityrx", &[item("Ibuprofen", 1), item(" ", 2)]).is_err());
        // previous stock survives
        assert_eq!(inventory_for(&conn, "cityrx").unwrap()[0].medicine_name, "Paracetamol");
    }

    #[test]
    fn stockists_match_case_insensitively_in_first_seen_order() {
        let mut conn = test_db();
        replace_inventory(&mut conn, "northrx", &[item("paracetamol", 2)]).unwrap();
        replace_inventory(&mut conn, "cityrx", &[item("Paracetamol", 1), item("PARACETAMOL", 4)]).unwrap();

        assert_eq!(stockists(&conn, "Paracetamol").unwrap(), vec!["northrx", "cityrx"]);
        assert!(stockists(&conn, "Aspirin").unwrap().is_empty());
    }

    #[test]
    fn stockist_names_prefer_display_name() {
        let mut conn = test_db();
        register(&mut conn, "apollo", "pw", AccountKind::Pharmacy, Some("Apollo Pharmacy")).unwrap();
        replace_inventory(&mut conn, "apollo", &[item("Cetirizine", 3)]).unwrap();
        replace_inventory(&mut conn, "cityrx", &[item("cetirizine", 1)]).unwrap();

        assert_eq!(
            stockist_names(&conn, "Cetirizine").unwrap(),
            vec!["Apollo Pharmacy", "cityrx"]
        );
    }

    #[test]
    fn zero_quantity_listing_still_names_the_pharmacy() {
        let mut conn = test_db();
        replace_inventory(&mut conn, "cityrx", &[item("Paracetamol", 0)]).unwrap();
        assert_eq!(stockists(&conn, "paracetamol").unwrap(), vec!["cityrx"]);
        assert_eq!(stockist_names(&conn, "PARACETAMOL").unwrap(), vec!["cityrx"]);
    }

    #[test]
    fn non_ascii_names_match_across_case() {
        let mut conn = test_db();
        replace_inventory(&mut conn, "cityrx", &[item("ÉPHÉDRINE", 2)]).unwrap();
        replace_inventory(&mut conn, "northrx", &[item("Ёрш сироп", 1)]).unwrap();

        assert_eq!(stockists(&conn, "éphédrine").unwrap(), vec!["cityrx"]);
        assert_eq!(stockist_names(&conn, " ёрш СИРОП ").unwrap(), vec!["northrx"]);
    }

    #[test]
    fn unknown_pharmacy_cannot_hold_stock() {
        let mut conn = test_db();
        assert!(replace_inventory(&mut conn, "ghost", &[item("Paracetamol", 1)]).is_err());
    }
}
