//! Persisted admin login sessions, one per notice service.

use chrono::{DateTime, NaiveDateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::db::Database;

/// A stored login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub server_url: String,
  pub username: String,
  pub token: String,
  pub created_at: DateTime<Utc>,
}

/// Session storage backed by the local state database
pub struct SessionStore {
  db: Database,
}

impl SessionStore {
  pub fn new(db: Database) -> Self {
    Self { db }
  }

  /// Open the store at the default location
  pub fn open() -> Result<Self> {
    Ok(Self::new(Database::open()?))
  }

  /// Remember a login for `server_url`, replacing any previous one
  pub fn save(&self, server_url: &str, username: &str, token: &str) -> Result<()> {
    self
      .db
      .conn()
      .execute(
        "INSERT OR REPLACE INTO sessions (server_key, server_url, username, token, created_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![server_key(server_url), server_url, username, token],
      )
      .map_err(|e| eyre!("Failed to save session: {}", e))?;
    Ok(())
  }

  /// The login stored for `server_url`, if any
  pub fn load(&self, server_url: &str) -> Result<Option<Session>> {
    let row: Option<(String, String, String, String)> = self
      .db
      .conn()
      .query_row(
        "SELECT server_url, username, token, created_at FROM sessions WHERE server_key = ?",
        params![server_key(server_url)],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to load session: {}", e))?;

    row
      .map(|(server_url, username, token, created_at)| {
        Ok(Session {
          server_url,
          username,
          token,
          created_at: parse_datetime(&created_at)?,
        })
      })
      .transpose()
  }

  /// Forget the login for `server_url`. Returns whether one existed.
  pub fn clear(&self, server_url: &str) -> Result<bool> {
    let removed = self
      .db
      .conn()
      .execute(
        "DELETE FROM sessions WHERE server_key = ?",
        params![server_key(server_url)],
      )
      .map_err(|e| eyre!("Failed to clear session: {}", e))?;
    Ok(removed > 0)
  }
}

/// Stable key for a server url; trailing slashes and case don't matter
fn server_key(server_url: &str) -> String {
  let normalized = server_url.trim().trim_end_matches('/').to_lowercase();
  let mut hasher = Sha256::new();
  hasher.update(normalized.as_bytes());
  hex::encode(hasher.finalize())
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
