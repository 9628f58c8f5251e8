//! SQLite-backed offline store for raw league payloads.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::traits::{LocalStore, WritableLocalStore};
use crate::error::{FetchError, FetchResult};

const GAMES: &str = "games";
const PLAYERS: &str = "players";
const TEAMS: &str = "teams";
const BOX_SCORE: &str = "box_score";

/// Schema for persisted payloads. Collections use an empty key; box scores
/// are keyed by game id.
const PAYLOAD_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS payloads (
    kind TEXT NOT NULL,
    key TEXT NOT NULL,
    data BLOB NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (kind, key)
);
"#;

pub struct SqliteLocalStore {
  conn: Mutex<Connection>,
}

impl SqliteLocalStore {
  /// Open the store at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create offline store directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open offline store at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(PAYLOAD_SCHEMA)
      .map_err(|e| eyre!("Failed to run offline store migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("courtside").join("offline.db"))
  }

  fn conn(&self) -> FetchResult<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| FetchError::LocalStore(format!("Lock poisoned: {}", e)))
  }

  fn load(&self, kind: &str, key: &str) -> FetchResult<Option<Vec<u8>>> {
    let conn = self.conn()?;
    let data = conn
      .query_row(
        "SELECT data FROM payloads WHERE kind = ? AND key = ?",
        params![kind, key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(data)
  }

  fn save(&self, kind: &str, key: &str, data: &[u8]) -> FetchResult<()> {
    let conn = self.conn()?;
    conn.execute(
      "INSERT OR REPLACE INTO payloads (kind, key, data, saved_at)
       VALUES (?, ?, ?, datetime('now'))",
      params![kind, key, data],
    )?;
    Ok(())
  }
}

impl LocalStore for SqliteLocalStore {
  fn load_games(&self) -> FetchResult<Option<Vec<u8>>> {
    self.load(GAMES, "")
  }

  fn load_players(&self) -> FetchResult<Option<Vec<u8>>> {
    self.load(PLAYERS, "")
  }

  fn load_teams(&self) -> FetchResult<Option<Vec<u8>>> {
    self.load(TEAMS, "")
  }

  fn load_box_score(&self, game_id: &str) -> FetchResult<Option<Vec<u8>>> {
    self.load(BOX_SCORE, game_id)
  }
}

impl WritableLocalStore for SqliteLocalStore {
  fn save_games(&self, data: &[u8]) -> FetchResult<()> {
    self.save(GAMES, "", data)
  }

  fn save_players(&self, data: &[u8]) -> FetchResult<()> {
    self.save(PLAYERS, "", data)
  }

  fn save_teams(&self, data: &[u8]) -> FetchResult<()> {
    self.save(TEAMS, "", data)
  }

  fn save_box_score(&self, data: &[u8], game_id: &str) -> FetchResult<()> {
    self.save(BOX_SCORE, game_id, data)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_store_loads_nothing() {
    let store = SqliteLocalStore::open_in_memory().unwrap();
    assert_eq!(store.load_games().unwrap(), None);
    assert_eq!(store.load_box_score("g1").unwrap(), None);
  }

  #[test]
  fn test_save_replaces_previous_payload() {
    let store = SqliteLocalStore::open_in_memory().unwrap();
    store.save_teams(b"[1]").unwrap();
    store.save_teams(b"[2]").unwrap();
    assert_eq!(store.load_teams().unwrap(), Some(b"[2]".to_vec()));
  }

  #[test]
  fn test_kinds_are_independent() {
    let store = SqliteLocalStore::open_in_memory().unwrap();
    store.save_players(b"players").unwrap();
    store.save_games(b"games").unwrap();

    assert_eq!(store.load_players().unwrap(), Some(b"players".to_vec()));
    assert_eq!(store.load_games().unwrap(), Some(b"games".to_vec()));
    assert_eq!(store.load_teams().unwrap(), None);
  }

  #[test]
  fn test_box_scores_keyed_by_game() {
    let store = SqliteLocalStore::open_in_memory().unwrap();
    store.save_box_score(b"a", "g1").unwrap();
    store.save_box_score(b"b", "g2").unwrap();

    assert_eq!(store.load_box_score("g1").unwrap(), Some(b"a".to_vec()));
    assert_eq!(store.load_box_score("g2").unwrap(), Some(b"b".to_vec()));
  }

  #[test]
  fn test_open_on_disk() {
    let dir = std::env::temp_dir().join(format!("courtside-test-{}", std::process::id()));
    let path = dir.join("offline.db");
    {
      let store = SqliteLocalStore::open(Some(&path)).unwrap();
      store.save_games(b"[]").unwrap();
    }

    let reopened = SqliteLocalStore::open(Some(&path)).unwrap();
    assert_eq!(reopened.load_games().unwrap(), Some(b"[]".to_vec()));
    let _ = std::fs::remove_dir_all(&dir);
  }
}
