pub mod schema;

use rusqlite::Connection;
use std::path::Path;

use crate::error::StorageError;

/// Database connection wrapper for caching
pub struct Database {
  conn: Connection,
}

impl Database {
  /// Open or create the database at `path`, creating parent directories.
  pub fn open(path: &Path) -> Result<Self, StorageError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        StorageError::Unavailable(format!("Failed to create database directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      StorageError::Unavailable(format!(
        "Failed to open database at {}: {}",
        path.display(),
        e
      ))
    })?;

    let db = Self { conn };
    db.run_migrations()?;

    Ok(db)
  }

  /// Open a private in-memory database.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, StorageError> {
    let conn = Connection::open_in_memory()
      .map_err(|e| StorageError::Unavailable(format!("Failed to open in-memory database: {}", e)))?;

    let db = Self { conn };
    db.run_migrations()?;

    Ok(db)
  }

  /// Run database migrations
  fn run_migrations(&self) -> Result<(), StorageError> {
    self
      .conn
      .execute_batch(schema::SCHEMA)
      .map_err(|e| StorageError::Unavailable(format!("Failed to run migrations: {}", e)))?;
    Ok(())
  }

  pub fn into_connection(self) -> Connection {
    self.conn
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_creates_parent_directories_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    let conn = Database::open(&path).unwrap().into_connection();

    assert!(path.exists());
    let tables: i64 = conn
      .query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('records', 'sync_state')",
        [],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(tables, 2);
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    Database::open(&path).unwrap();
    Database::open(&path).unwrap();
  }
}
