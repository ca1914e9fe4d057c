//! Patient and pharmacy accounts.
//!
//! Usernames and passwords are trimmed before use. Passwords are stored as a
//! salted SHA-256 digest; the salt is per account.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username and password are required")]
    MissingCredentials,

    #[error("username '{0}' already exists")]
    UsernameTaken(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Patient,
    /// Can publish stock to the inventory.
    Pharmacy,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Pharmacy => "pharmacy",
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Self::Patient),
            "pharmacy" => Ok(Self::Pharmacy),
            _ => Err(format!("unknown account kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub username: String,
    pub kind: AccountKind,
    pub display_name: Option<String>,
    pub created_at: String,
}

/// Create an account. Fails if either credential is blank after trimming or
/// the username is already registered.
pub fn register(
    conn: &mut Connection,
    username: &str,
    password: &str,
    kind: AccountKind,
    display_name: Option<&str>,
) -> Result<Account, AccountError> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AccountError::MissingCredentials);
    }

    let tx = conn.transaction()?;

    let exists: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM accounts WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    if exists {
        return Err(AccountError::UsernameTaken(username.to_string()));
    }

    let salt = uuid::Uuid::now_v7().simple().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO accounts (username, kind, display_name, password_hash, salt, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            username,
            kind.as_str(),
            display_name,
            hash_password(&salt, password),
            salt,
            now
        ],
    )?;
    tx.commit()?;

    tracing::info!(username, kind = %kind, "account registered");

    Ok(Account {
        username: username.to_string(),
        kind,
        display_name: display_name.map(str::to_string),
        created_at: now,
    })
}

/// Check credentials. Returns the account when they match, `None` otherwise.
pub fn verify(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<Account>, AccountError> {
    let username = username.trim();
    let password = password.trim();

    let row: Option<(String, String, Account)> = conn
        .query_row(
            "SELECT password_hash, salt, username, kind, display_name, created_at \
             FROM accounts WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?, account_from_row(row, 2)?)),
        )
        .optional()?;

    Ok(row.and_then(|(stored, salt, account)| {
        (hash_password(&salt, password) == stored).then_some(account)
    }))
}

pub fn get_account(conn: &Connection, username: &str) -> Result<Option<Account>, AccountError> {
    let account = conn
        .query_row(
            "SELECT username, kind, display_name, created_at FROM accounts WHERE username = ?1",
            params![username.trim()],
            |row| account_from_row(row, 0),
        )
        .optional()?;
    Ok(account)
}

/// All pharmacy accounts, by username.
pub fn list_pharmacies(conn: &Connection) -> Result<Vec<Account>, AccountError> {
    let mut stmt = conn.prepare(
        "SELECT username, kind, display_name, created_at FROM accounts \
         WHERE kind = 'pharmacy' ORDER BY username",
    )?;
    let accounts = stmt
        .query_map([], |row| account_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

fn account_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Account> {
    let kind: String = row.get(offset + 1)?;
    Ok(Account {
        username: row.get(offset)?,
        kind: kind.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        display_name: row.get(offset + 2)?,
        created_at: row.get(offset + 3)?,
    })
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
