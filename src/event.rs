use tokio::sync::mpsc;

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  /// A background run merged a new batch; readers should re-read the cache
  RefreshCompleted {
    fetched: usize,
    next_offset: u32,
    total_cached: usize,
  },
  /// A background run failed and will be retried on the next tick
  RefreshFailed { message: String },
}

/// Channel carrying events from background tasks to the foreground
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Sender handed to background tasks
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

impl Default for EventHandler {
  fn default() -> Self {
    Self::new()
  }
}
