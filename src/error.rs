//! Error taxonomy shared by the remote, storage and refresh layers.
//!
//! Lower layers return their own typed error; orchestration code works with
//! the crate-level [`Error`] sum and the binary converts to `color_eyre` at
//! the edge.

use std::time::Duration;
use thiserror::Error;

/// Failures talking to the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
  #[error("invalid request: {0}")]
  InvalidRequest(String),
  #[error("no internet connection")]
  NoConnectivity,
  #[error("the request timed out")]
  Timeout,
  #[error("server error (status {0})")]
  ServerStatus(u16),
  #[error("failed to decode response: {0}")]
  Decode(String),
  #[error("no data received from server")]
  Empty,
  #[error("transport error: {0}")]
  Transport(String),
}

impl NetworkError {
  /// Short suggestion shown next to the error message.
  pub fn recovery_hint(&self) -> &'static str {
    match self {
      NetworkError::NoConnectivity => "Connect to a network and try again.",
      NetworkError::ServerStatus(_) => "The server might be having issues. Try again in a few moments.",
      NetworkError::Timeout => "Check your internet connection and try again.",
      _ => "Run the command again with --refresh to retry.",
    }
  }
}

impl From<reqwest::Error> for NetworkError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      NetworkError::Timeout
    } else if err.is_connect() {
      NetworkError::NoConnectivity
    } else if err.is_builder() {
      NetworkError::InvalidRequest(err.to_string())
    } else if err.is_decode() {
      NetworkError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
      NetworkError::ServerStatus(status.as_u16())
    } else {
      NetworkError::Transport(err.to_string())
    }
  }
}

/// Failures of the local record or cursor store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
  #[error("failed to retrieve local data: {0}")]
  FetchFailed(String),
  #[error("failed to save data locally: {0}")]
  SaveFailed(String),
  #[error("failed to delete local data: {0}")]
  DeleteFailed(String),
  #[error("local store unavailable: {0}")]
  Unavailable(String),
}

/// Invalid or missing data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
  #[error("invalid record data: {0}")]
  InvalidRecord(String),
  #[error("record {0} not found")]
  RecordNotFound(u32),
  #[error("cursor moved from {expected} to {found} while the run was in flight")]
  CursorMoved { expected: u32, found: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error(transparent)]
  Network(#[from] NetworkError),
  #[error(transparent)]
  Storage(#[from] StorageError),
  #[error(transparent)]
  Domain(#[from] DomainError),
  #[error("run exceeded its {0:?} budget")]
  Expired(Duration),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
