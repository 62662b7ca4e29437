//! Foreground cache-first list loading.

use std::sync::Arc;
use tracing::{debug, info};

use super::traits::{CacheResult, CursorStore, RecordStore, WriteGate};
use crate::api::client::RemoteSource;
use crate::api::details::DetailFetchCoordinator;
use crate::api::types::Record;
use crate::error::Result;

/// Serves the cached record set, going to the network only on a cold cache
/// or an explicit refresh.
///
/// A forced refresh is a full resync: the fetched page *replaces* the cache,
/// discarding whatever background runs had accumulated, and the background
/// cursor restarts from its initial value.
pub struct CacheFirstListLoader<R: RemoteSource, S: RecordStore, C: CursorStore> {
  remote: Arc<R>,
  details: DetailFetchCoordinator<R>,
  store: Arc<S>,
  cursor: Arc<C>,
  gate: WriteGate,
}

impl<R: RemoteSource, S: RecordStore, C: CursorStore> CacheFirstListLoader<R, S, C> {
  pub fn new(remote: Arc<R>, store: Arc<S>, cursor: Arc<C>, gate: WriteGate) -> Self {
    Self {
      details: DetailFetchCoordinator::new(Arc::clone(&remote)),
      remote,
      store,
      cursor,
      gate,
    }
  }

  /// Load the record list.
  ///
  /// 1. Unless `force_refresh`, return the cache when it has data
  /// 2. On a forced refresh, reset the background cursor
  /// 3. Fetch the page, fetch details, replace the cache
  pub async fn load(
    &self,
    offset: u32,
    limit: u32,
    force_refresh: bool,
  ) -> Result<CacheResult<Vec<Record>>> {
    if !force_refresh && self.store.has_data()? {
      debug!("serving records from cache");
      return Ok(CacheResult::from_cache(self.store.fetch_all()?));
    }

    // Held across the network calls so a background merge cannot land
    // between the reset and the replace.
    let _guard = self.gate.acquire().await;

    // Another loader may have filled the cache while we waited
    if !force_refresh && self.store.has_data()? {
      return Ok(CacheResult::from_cache(self.store.fetch_all()?));
    }

    if force_refresh {
      self.cursor.reset()?;
      info!(offset = self.cursor.initial(), "forced refresh, cursor reset");
    }

    let stubs = self.remote.fetch_page(offset, limit).await?;
    let detailed = self.details.fetch_details(&stubs).await?;
    self.store.replace_all(&detailed)?;

    info!(count = detailed.len(), offset, limit, "loaded records from network");
    Ok(CacheResult::from_network(detailed))
  }
}
