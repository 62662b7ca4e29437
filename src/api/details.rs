//! Concurrent per-id detail fetching.

use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

use crate::api::client::RemoteSource;
use crate::api::types::Record;
use crate::error::NetworkError;

/// Expands basic records into detailed ones, one request per record.
pub struct DetailFetchCoordinator<R: RemoteSource> {
  remote: Arc<R>,
}

impl<R: RemoteSource> DetailFetchCoordinator<R> {
  pub fn new(remote: Arc<R>) -> Self {
    Self { remote }
  }

  /// Fetch details for every stub concurrently.
  ///
  /// All-or-nothing: the first failure is returned, the outstanding fetches
  /// are dropped, and no partial result escapes. On success the records are
  /// sorted by ascending id.
  pub async fn fetch_details(&self, stubs: &[Record]) -> Result<Vec<Record>, NetworkError> {
    let fetches = stubs.iter().map(|stub| self.remote.fetch_detail(stub.id));
    let mut detailed = try_join_all(fetches).await?;
    detailed.sort_by_key(|r| r.id);

    debug!(count = detailed.len(), "fetched details");
    Ok(detailed)
  }
}
