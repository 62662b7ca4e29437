//! SQLite-backed record and cursor storage.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::traits::{fold_name, CursorStore, RecordStore};
use crate::api::types::{Category, Record, RecordDetails, StatEntry};
use crate::db::Database;
use crate::error::StorageError;

const CURSOR_KEY: &str = "background_offset";

const RECORD_COLUMNS: &str =
  "id, name, source_url, categories, height, weight, abilities, stats, audio_url";

/// SQLite-based storage for records and the background cursor.
///
/// Both live in the same database file but are committed separately.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
  initial_offset: u32,
}

impl SqliteStorage {
  /// Open (or create) the cache database at `path`.
  pub fn open(path: &Path, initial_offset: u32) -> Result<Self, StorageError> {
    let db = Database::open(path)?;
    debug!(path = %path.display(), "opened cache database");
    Ok(Self::from_database(db, initial_offset))
  }

  /// Open a private in-memory database.
  #[cfg(test)]
  pub fn open_in_memory(initial_offset: u32) -> Result<Self, StorageError> {
    Ok(Self::from_database(Database::open_in_memory()?, initial_offset))
  }

  fn from_database(db: Database, initial_offset: u32) -> Self {
    Self {
      conn: Mutex::new(db.into_connection()),
      initial_offset,
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
    self
      .conn
      .lock()
      .map_err(|e| StorageError::Unavailable(format!("Lock poisoned: {}", e)))
  }

  /// When the cursor was last written, if ever.
  pub fn cursor_updated_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
    let conn = self.lock()?;
    let raw: Option<String> = conn
      .query_row(
        "SELECT updated_at FROM sync_state WHERE key = ?",
        params![CURSOR_KEY],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| StorageError::FetchFailed(format!("Failed to read cursor: {}", e)))?;

    raw.as_deref().map(parse_datetime).transpose()
  }

  fn query_records(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Record>, StorageError> {
    let mut stmt = conn
      .prepare(sql)
      .map_err(|e| StorageError::FetchFailed(format!("Failed to prepare query: {}", e)))?;

    let records = stmt
      .query_map(params, row_to_record)
      .map_err(|e| StorageError::FetchFailed(format!("Failed to query records: {}", e)))?
      .collect::<Result<Vec<_>, _>>()
      .map_err(|e| StorageError::FetchFailed(format!("Failed to read record: {}", e)))?;

    Ok(records)
  }
}

impl RecordStore for SqliteStorage {
  fn replace_all(&self, records: &[Record]) -> Result<(), StorageError> {
    let mut conn = self.lock()?;
    let save_err = |e: rusqlite::Error| StorageError::SaveFailed(e.to_string());

    // Rolled back on drop unless committed
    let tx = conn.transaction().map_err(save_err)?;
    tx.execute("DELETE FROM records", []).map_err(save_err)?;

    {
      let mut stmt = tx
        .prepare(
          "INSERT OR REPLACE INTO records
             (id, name, search_name, source_url, categories, height, weight, abilities, stats,
              audio_url, cached_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))",
        )
        .map_err(save_err)?;

      for record in records {
        let columns = RecordColumns::from_record(record)?;
        stmt
          .execute(params![
            record.id,
            record.name,
            fold_name(&record.name),
            record.source_url,
            columns.categories,
            columns.height,
            columns.weight,
            columns.abilities,
            columns.stats,
            columns.audio_url,
          ])
          .map_err(save_err)?;
      }
    }

    tx.commit().map_err(save_err)?;
    debug!(count = records.len(), "replaced cached records");
    Ok(())
  }

  fn fetch_all(&self) -> Result<Vec<Record>, StorageError> {
    let conn = self.lock()?;
    Self::query_records(
      &conn,
      &format!("SELECT {} FROM records ORDER BY id", RECORD_COLUMNS),
      [],
    )
  }

  fn fetch_one(&self, id: u32) -> Result<Option<Record>, StorageError> {
    let conn = self.lock()?;
    let mut records = Self::query_records(
      &conn,
      &format!("SELECT {} FROM records WHERE id = ?", RECORD_COLUMNS),
      params![id],
    )?;
    Ok(records.pop())
  }

  fn search(&self, query: &str) -> Result<Vec<Record>, StorageError> {
    let query = query.trim();
    if query.is_empty() {
      return self.fetch_all();
    }

    let conn = self.lock()?;
    let id: Option<u32> = query.parse().ok();
    Self::query_records(
      &conn,
      &format!(
        "SELECT {} FROM records
         WHERE instr(search_name, ?1) > 0 OR (?2 IS NOT NULL AND id = ?2)
         ORDER BY id",
        RECORD_COLUMNS
      ),
      params![fold_name(query), id],
    )
  }

  fn delete_all(&self) -> Result<(), StorageError> {
    let conn = self.lock()?;
    conn
      .execute("DELETE FROM records", [])
      .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
    Ok(())
  }

  fn count(&self) -> Result<usize, StorageError> {
    let conn = self.lock()?;
    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
      .map_err(|e| StorageError::FetchFailed(format!("Failed to count records: {}", e)))?;
    Ok(count as usize)
  }
}

impl CursorStore for SqliteStorage {
  fn get(&self) -> Result<u32, StorageError> {
    let conn = self.lock()?;
    let value: Option<u32> = conn
      .query_row(
        "SELECT value FROM sync_state WHERE key = ?",
        params![CURSOR_KEY],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| StorageError::FetchFailed(format!("Failed to read cursor: {}", e)))?;

    Ok(value.unwrap_or(self.initial_offset))
  }

  fn set(&self, offset: u32) -> Result<(), StorageError> {
    let conn = self.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO sync_state (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![CURSOR_KEY, offset],
      )
      .map_err(|e| StorageError::SaveFailed(format!("Failed to save cursor: {}", e)))?;
    Ok(())
  }

  fn initial(&self) -> u32 {
    self.initial_offset
  }
}

/// Auxiliary columns of a record row.
struct RecordColumns {
  categories: Option<String>,
  height: Option<u32>,
  weight: Option<u32>,
  abilities: Option<String>,
  stats: Option<String>,
  audio_url: Option<String>,
}

impl RecordColumns {
  fn from_record(record: &Record) -> Result<Self, StorageError> {
    let Some(details) = &record.details else {
      return Ok(Self {
        categories: None,
        height: None,
        weight: None,
        abilities: None,
        stats: None,
        audio_url: None,
      });
    };

    let stats = serde_json::to_string(&details.stats)
      .map_err(|e| StorageError::SaveFailed(format!("Failed to encode stats: {}", e)))?;

    Ok(Self {
      categories: Some(
        details
          .categories
          .iter()
          .map(Category::as_str)
          .collect::<Vec<_>>()
          .join(","),
      ),
      height: Some(details.height),
      weight: Some(details.weight),
      abilities: Some(details.abilities.join(",")),
      stats: Some(stats),
      audio_url: details.audio_url.clone(),
    })
  }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
  let id: u32 = row.get(0)?;
  let name: String = row.get(1)?;
  let source_url: String = row.get(2)?;
  let height: Option<u32> = row.get(4)?;
  let weight: Option<u32> = row.get(5)?;

  let details = match (height, weight) {
    (Some(height), Some(weight)) => {
      let categories: Option<String> = row.get(3)?;
      let abilities: Option<String> = row.get(6)?;
      let stats: Option<String> = row.get(7)?;

      let stats: Vec<StatEntry> = match stats {
        Some(json) => serde_json::from_str(&json).map_err(|e| {
          rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
        })?,
        None => Vec::new(),
      };

      Some(RecordDetails {
        categories: split_list(categories.as_deref())
          .filter_map(Category::parse)
          .collect(),
        height,
        weight,
        abilities: split_list(abilities.as_deref()).map(String::from).collect(),
        stats,
        audio_url: row.get(8)?,
      })
    }
    _ => None,
  };

  Ok(Record {
    id,
    name,
    source_url,
    details,
  })
}

fn split_list(joined: Option<&str>) -> impl Iterator<Item = &str> {
  joined
    .unwrap_or_default()
    .split(',')
    .filter(|s| !s.is_empty())
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| StorageError::FetchFailed(format!("Failed to parse datetime '{}': {}", s, e)))
}
