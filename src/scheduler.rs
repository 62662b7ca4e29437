//! Recurring background refresh.
//!
//! The trigger is any stream of ticks, so tests drive runs explicitly and the
//! binary uses a timer.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::api::client::RemoteSource;
use crate::cache::{CursorStore, RecordStore, RefreshEngine};
use crate::event::Event;

pub struct Scheduler<R: RemoteSource, S: RecordStore, C: CursorStore> {
  engine: Arc<RefreshEngine<R, S, C>>,
  budget: Duration,
}

impl<R, S, C> Scheduler<R, S, C>
where
  R: RemoteSource + 'static,
  S: RecordStore + 'static,
  C: CursorStore + 'static,
{
  pub fn new(engine: Arc<RefreshEngine<R, S, C>>, budget: Duration) -> Self {
    Self { engine, budget }
  }

  /// Run one refresh and describe the outcome.
  ///
  /// Failures are reported, not retried; the next tick is the retry.
  pub async fn tick(&self) -> Event {
    match self.engine.run_with_budget(self.budget).await {
      Ok(report) => {
        info!(
          fetched = report.fetched.len(),
          next_offset = report.next_offset,
          "background refresh completed"
        );
        Event::RefreshCompleted {
          fetched: report.fetched.len(),
          next_offset: report.next_offset,
          total_cached: report.total_cached,
        }
      }
      Err(e) => {
        error!(error = %e, "background refresh failed");
        Event::RefreshFailed {
          message: e.to_string(),
        }
      }
    }
  }

  /// Run a refresh for every tick until the stream ends or the receiver is
  /// dropped. Runs never overlap.
  pub fn spawn<T>(self, ticks: T, tx: mpsc::UnboundedSender<Event>) -> JoinHandle<()>
  where
    T: Stream<Item = ()> + Send + 'static,
  {
    tokio::spawn(async move {
      let mut ticks = Box::pin(ticks);
      while ticks.next().await.is_some() {
        let event = self.tick().await;
        if tx.send(event).is_err() {
          break;
        }
      }
    })
  }
}

/// Ticks every `period`, the first one immediately.
pub fn interval_ticks(period: Duration) -> impl Stream<Item = ()> + Send {
  let mut interval = tokio::time::interval(period);
  interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

  futures::stream::unfold(interval, |mut interval| async move {
    interval.tick().await;
    Some(((), interval))
  })
}
