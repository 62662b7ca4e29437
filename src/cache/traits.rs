//! Core traits and types for the caching system.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::api::types::Record;
use crate::error::StorageError;

/// Durable cache of full records keyed by id.
///
/// Every read returns records in ascending id order. Each mutation commits
/// as a unit; readers never see a half-written set.
pub trait RecordStore: Send + Sync {
  /// Discard prior contents and store `records`.
  fn replace_all(&self, records: &[Record]) -> Result<(), StorageError>;

  fn fetch_all(&self) -> Result<Vec<Record>, StorageError>;

  fn fetch_one(&self, id: u32) -> Result<Option<Record>, StorageError>;

  /// Case-insensitive name substring, or exact id when `query` is numeric.
  /// An empty query is the same as `fetch_all`.
  fn search(&self, query: &str) -> Result<Vec<Record>, StorageError>;

  fn delete_all(&self) -> Result<(), StorageError>;

  fn count(&self) -> Result<usize, StorageError>;

  fn has_data(&self) -> Result<bool, StorageError> {
    Ok(self.count()? > 0)
  }
}

/// Case folding used for name search.
pub fn fold_name(name: &str) -> String {
  name.to_lowercase()
}

/// Durable offset of the next page the background refresh will fetch.
///
/// Not transactionally coupled to [`RecordStore`]: callers advance it only
/// after the records it covers are persisted.
pub trait CursorStore: Send + Sync {
  /// Current offset, or the initial value if never set.
  fn get(&self) -> Result<u32, StorageError>;

  fn set(&self, offset: u32) -> Result<(), StorageError>;

  /// Value used on first use and by [`CursorStore::reset`].
  fn initial(&self) -> u32;

  fn reset(&self) -> Result<(), StorageError> {
    self.set(self.initial())
  }
}

/// Serializes store mutations between the foreground loader and the
/// background refresh engine.
#[derive(Clone, Default)]
pub struct WriteGate {
  lock: Arc<Mutex<()>>,
}

impl WriteGate {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn acquire(&self) -> MutexGuard<'_, ()> {
    self.lock.lock().await
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the remote API and written to the cache
  Network,
  /// Served from the local cache without network access
  Cache,
}
