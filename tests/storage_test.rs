mod helpers;

use medwise::accounts::{self, AccountKind};
use medwise::db;
use medwise::inventory::{self, StockItem};
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("medwise.db");
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();
    assert!(db_path.exists());

    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.schema_version, db::schema::CURRENT_SCHEMA_VERSION);
    assert_eq!(report.account_count, 0);
}

#[test]
fn accounts_and_stock_survive_reopen() {
    let (config, _tmp) = helpers::fixture_config();
    let path = config.resolved_db_path();

    {
        let mut conn = db::open_database(&path).unwrap();
        accounts::register(&mut conn, "cityrx", "pw", AccountKind::Pharmacy, Some("City Pharmacy"))
            .unwrap();
        accounts::register(&mut conn, "asha", "secret", AccountKind::Patient, None).unwrap();
        inventory::replace_inventory(
            &mut conn,
            "cityrx",
            &[StockItem {
                medicine_name: "Paracetamol".into(),
                quantity: 10,
            }],
        )
        .unwrap();
    }

    let conn = db::open_database(&path).unwrap();
    assert!(accounts::verify(&conn, "asha", "secret").unwrap().is_some());
    assert!(accounts::verify(&conn, "asha", "wrong").unwrap().is_none());
    assert_eq!(inventory::stockist_names(&conn, "paracetamol").unwrap(), vec!["City Pharmacy"]);

    let report = db::check_database_health(&conn).unwrap();
    assert_eq!(report.account_count, 2);
    assert_eq!(report.pharmacy_count, 1);
    assert_eq!(report.inventory_count, 1);
}

#[test]
fn reopening_keeps_schema_version() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("medwise.db");
    drop(db::open_database(&path).unwrap());
    let conn = db::open_database(&path).unwrap();
    assert_eq!(
        db::schema::get_schema_version(&conn).unwrap(),
        db::schema::CURRENT_SCHEMA_VERSION
    );
}

#[test]
fn deleting_a_pharmacy_removes_its_stock() {
    let mut conn = db::open_memory_database().unwrap();
    accounts::register(&mut conn, "cityrx", "pw", AccountKind::Pharmacy, None).unwrap();
    inventory::replace_inventory(
        &mut conn,
        "cityrx",
        &[StockItem {
            medicine_name: "Cetirizine".into(),
            quantity: 2,
        }],
    )
    .unwrap();

    conn.execute("DELETE FROM accounts WHERE username = 'cityrx'", [])
        .unwrap();
    assert!(inventory::inventory_for(&conn, "cityrx").unwrap().is_empty());
}
