//! Offset-tracked incremental refresh.
//!
//! Each run fetches the page at the stored cursor, expands it to detailed
//! records, merges them into the cache by id and only then advances the
//! cursor. A crash between persisting and advancing makes the next run refetch
//! and re-merge the same page, which is harmless because overwrite-by-id is
//! idempotent. A failure anywhere before persisting leaves durable state as it
//! was.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::{CursorStore, RecordStore, WriteGate};
use crate::api::client::RemoteSource;
use crate::api::details::DetailFetchCoordinator;
use crate::api::types::Record;
use crate::error::{DomainError, Error, Result};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
  /// Only the newly fetched batch, not the merged set
  pub fetched: Vec<Record>,
  /// Offset this run fetched from
  pub offset: u32,
  /// Cursor after the run
  pub next_offset: u32,
  /// Cache size after the merge
  pub total_cached: usize,
}

pub struct RefreshEngine<R: RemoteSource, S: RecordStore, C: CursorStore> {
  remote: Arc<R>,
  details: DetailFetchCoordinator<R>,
  store: Arc<S>,
  cursor: Arc<C>,
  gate: WriteGate,
  batch_size: u32,
}

impl<R: RemoteSource, S: RecordStore, C: CursorStore> RefreshEngine<R, S, C> {
  pub fn new(
    remote: Arc<R>,
    store: Arc<S>,
    cursor: Arc<C>,
    gate: WriteGate,
    batch_size: u32,
  ) -> Self {
    Self {
      details: DetailFetchCoordinator::new(Arc::clone(&remote)),
      remote,
      store,
      cursor,
      gate,
      batch_size,
    }
  }

  pub fn batch_size(&self) -> u32 {
    self.batch_size
  }

  pub fn current_offset(&self) -> Result<u32> {
    Ok(self.cursor.get()?)
  }

  /// Restart the cursor at its initial value.
  pub fn reset(&self) -> Result<()> {
    self.cursor.reset()?;
    info!(offset = self.cursor.initial(), "cursor reset");
    Ok(())
  }

  /// Run one refresh.
  pub async fn run(&self) -> Result<RefreshReport> {
    let offset = self.cursor.get()?;
    info!(offset, batch_size = self.batch_size, "refresh starting");

    let stubs = self.remote.fetch_page(offset, self.batch_size).await?;
    debug!(count = stubs.len(), "fetched basic records");

    let fetched = self.details.fetch_details(&stubs).await?;

    let _guard = self.gate.acquire().await;

    // No await from here on: cancellation cannot separate persisting the
    // merge from advancing the cursor.
    let found = self.cursor.get()?;
    if found != offset {
      warn!(expected = offset, found, "cursor moved during refresh, discarding batch");
      return Err(DomainError::CursorMoved {
        expected: offset,
        found,
      }
      .into());
    }

    let existing = self.store.fetch_all()?;
    debug!(existing = existing.len(), "merging into cache");

    let merged = merge_by_id(existing, &fetched);
    self.store.replace_all(&merged)?;

    let next_offset = offset + self.batch_size;
    self.cursor.set(next_offset)?;

    info!(
      fetched = fetched.len(),
      total = merged.len(),
      next_offset,
      "refresh complete"
    );

    Ok(RefreshReport {
      fetched,
      offset,
      next_offset,
      total_cached: merged.len(),
    })
  }

  /// Run one refresh within an execution window.
  ///
  /// On expiry the run is dropped at its current await point and reported as
  /// [`Error::Expired`]; the cursor is never advanced for an expired run.
  pub async fn run_with_budget(&self, budget: Duration) -> Result<RefreshReport> {
    match tokio::time::timeout(budget, self.run()).await {
      Ok(result) => result,
      Err(_) => {
        warn!(?budget, "refresh expired");
        Err(Error::Expired(budget))
      }
    }
  }
}

/// Union by id where `incoming` wins, in ascending id order.
pub fn merge_by_id(existing: Vec<Record>, incoming: &[Record]) -> Vec<Record> {
  let mut by_id: BTreeMap<u32, Record> = existing.into_iter().map(|r| (r.id, r)).collect();
  for record in incoming {
    by_id.insert(record.id, record.clone());
  }
  by_id.into_values().collect()
}
