use color_eyre::{Report, Result, Section};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{PokeApiClient, Record, RemoteSource};
use crate::cache::{
  CacheFirstListLoader, CacheSource, CursorStore, RecordStore, RefreshEngine, SqliteStorage,
  WriteGate,
};
use crate::config::Config;
use crate::error::{DomainError, Error, NetworkError};
use crate::event::{Event, EventHandler};
use crate::scheduler::{interval_ticks, Scheduler};
use crate::Command;

type Loader = CacheFirstListLoader<PokeApiClient, SqliteStorage, SqliteStorage>;
type Engine = RefreshEngine<PokeApiClient, SqliteStorage, SqliteStorage>;

/// Wires the components together and executes CLI commands.
pub struct App {
  config: Config,
  db_path: PathBuf,
  remote: Arc<PokeApiClient>,
  storage: Arc<SqliteStorage>,
  gate: WriteGate,
  loader: Loader,
  engine: Arc<Engine>,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let db_path = config.database_path()?;
    let remote = Arc::new(PokeApiClient::new(&config.api).map_err(|e| report(e.into()))?);
    let storage = SqliteStorage::open(&db_path, config.sync.initial_offset)
      .map_err(|e| report(e.into()))?;
    let storage = Arc::new(storage);
    let gate = WriteGate::new();

    let loader = CacheFirstListLoader::new(
      Arc::clone(&remote),
      Arc::clone(&storage),
      Arc::clone(&storage),
      gate.clone(),
    );
    let engine = Arc::new(RefreshEngine::new(
      Arc::clone(&remote),
      Arc::clone(&storage),
      Arc::clone(&storage),
      gate.clone(),
      config.sync.batch_size,
    ));

    Ok(Self {
      config,
      db_path,
      remote,
      storage,
      gate,
      loader,
      engine,
    })
  }

  pub async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::List {
        refresh,
        offset,
        limit,
        json,
      } => {
        let limit = limit.unwrap_or(self.config.sync.page_limit);
        self.list(offset, limit, refresh, json).await
      }
      Command::Search { query, json } => self.search(&query, json),
      Command::Show { id } => self.show(id).await,
      Command::Refresh => self.refresh().await,
      Command::Watch { interval } => {
        let interval = interval
          .map(Duration::from_secs)
          .unwrap_or_else(|| self.config.sync.interval());
        self.watch(interval).await
      }
      Command::Status => self.status(),
      Command::Reset => self.reset().await,
      Command::Clear => self.clear().await,
    }
  }

  async fn list(&self, offset: u32, limit: u32, refresh: bool, json: bool) -> Result<()> {
    let result = self
      .loader
      .load(offset, limit, refresh)
      .await
      .map_err(report)?;

    if json {
      return print_json(&result.data);
    }

    print_rows(&result.data);
    let source = match result.source {
      CacheSource::Cache => "cache",
      CacheSource::Network => "network",
    };
    println!("{} records ({})", result.data.len(), source);
    Ok(())
  }

  fn search(&self, query: &str, json: bool) -> Result<()> {
    let records = self.storage.search(query).map_err(|e| report(e.into()))?;

    if json {
      return print_json(&records);
    }

    if records.is_empty() {
      println!("No records match '{}'", query);
    } else {
      print_rows(&records);
    }
    Ok(())
  }

  /// Show one record from the cache, falling back to the API for ids that
  /// are not cached yet.
  async fn show(&self, id: u32) -> Result<()> {
    if id == 0 {
      let err = DomainError::InvalidRecord("ids start at 1".to_string());
      return Err(report(err.into()));
    }

    let cached = self
      .storage
      .fetch_one(id)
      .map_err(|e| report(e.into()))?;

    let record = match cached {
      Some(record) => record,
      None => match self.remote.fetch_detail(id).await {
        Ok(record) => record,
        Err(NetworkError::ServerStatus(404)) => {
          return Err(report(DomainError::RecordNotFound(id).into()))
        }
        Err(e) => return Err(report(e.into())),
      },
    };

    print_detail(&record);
    Ok(())
  }

  async fn refresh(&self) -> Result<()> {
    let summary = self
      .engine
      .run_with_budget(self.config.sync.run_budget())
      .await
      .map_err(report)?;

    println!(
      "Fetched {} new records (offset {} -> {}), {} cached",
      summary.fetched.len(),
      summary.offset,
      summary.next_offset,
      summary.total_cached
    );
    print_rows(&summary.fetched);
    Ok(())
  }

  /// Run background refreshes until Ctrl-C.
  async fn watch(&self, interval: Duration) -> Result<()> {
    let mut events = EventHandler::new();
    let scheduler = Scheduler::new(Arc::clone(&self.engine), self.config.sync.run_budget());
    let handle = scheduler.spawn(interval_ticks(interval), events.sender());

    info!(?interval, "watching for new records");
    println!("Refreshing every {}s, Ctrl-C to stop", interval.as_secs());

    loop {
      tokio::select! {
        event = events.next() => match event {
          Some(Event::RefreshCompleted { fetched, next_offset, .. }) => {
            // Re-read the cache the way a foreground view would
            let cached = self.storage.count().map_err(|e| report(e.into()))?;
            println!(
              "{} new records available, {} cached (next offset {})",
              fetched, cached, next_offset
            );
          }
          Some(Event::RefreshFailed { message }) => {
            eprintln!("Refresh failed: {} (will retry next tick)", message);
          }
          None => break,
        },
        _ = tokio::signal::ctrl_c() => {
          info!("stopping watch");
          break;
        }
      }
    }

    handle.abort();
    Ok(())
  }

  fn status(&self) -> Result<()> {
    let count = self.storage.count().map_err(|e| report(e.into()))?;
    let offset = self.engine.current_offset().map_err(report)?;
    let updated = self
      .storage
      .cursor_updated_at()
      .map_err(|e| report(e.into()))?;

    println!("database:    {}", self.db_path.display());
    println!("records:     {}", count);
    println!("next offset: {}", offset);
    println!("batch size:  {}", self.engine.batch_size());
    match updated {
      Some(at) => println!("cursor set:  {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
      None => println!("cursor set:  never"),
    }
    Ok(())
  }

  async fn reset(&self) -> Result<()> {
    let _guard = self.gate.acquire().await;
    self.engine.reset().map_err(report)?;
    println!("Cursor reset to {}", self.storage.initial());
    Ok(())
  }

  /// Drop every cached record and restart the cursor.
  async fn clear(&self) -> Result<()> {
    let _guard = self.gate.acquire().await;
    self.storage.delete_all().map_err(|e| report(e.into()))?;
    self.engine.reset().map_err(report)?;
    println!("Cache cleared");
    Ok(())
  }
}

/// Convert a typed error into a report with a recovery suggestion.
fn report(err: Error) -> Report {
  let hint = match &err {
    Error::Network(e) => Some(e.recovery_hint()),
    Error::Storage(_) => Some("Run `pokecache clear` or remove the cache database."),
    Error::Expired(_) => Some("Increase sync.run_budget_secs or try again."),
    Error::Domain(_) => None,
  };

  let report = Report::new(err);
  match hint {
    Some(hint) => report.suggestion(hint),
    None => report,
  }
}

fn print_json(records: &[Record]) -> Result<()> {
  let out = serde_json::to_string_pretty(records)?;
  println!("{}", out);
  Ok(())
}

fn print_rows(records: &[Record]) {
  for record in records {
    let categories = record
      .details
      .as_ref()
      .map(|d| {
        d.categories
          .iter()
          .map(|c| c.as_str())
          .collect::<Vec<_>>()
          .join("/")
      })
      .unwrap_or_default();

    println!(
      "#{:04}  {:<14} {:<16} {:>4}",
      record.id,
      record.display_name(),
      categories,
      record.total_stats()
    );
  }
}

fn print_detail(record: &Record) {
  println!("#{:04} {}", record.id, record.display_name());
  println!("  url:    {}", record.source_url);
  println!("  image:  {}", record.image_url());

  let Some(details) = &record.details else {
    return;
  };

  let categories: Vec<&str> = details.categories.iter().map(|c| c.as_str()).collect();
  println!("  types:  {}", categories.join(", "));
  println!(
    "  height: {:.1} m   weight: {:.1} kg",
    details.height as f64 / 10.0,
    details.weight as f64 / 10.0
  );
  println!("  abilities: {}", details.abilities.join(", "));
  for stat in &details.stats {
    println!(
      "  {:<8} {:>3}  (EV {})",
      stat.display_name(),
      stat.base_value,
      stat.effort_value
    );
  }
  println!("  total:  {}", record.total_stats());
  if let Some(audio) = &details.audio_url {
    println!("  cry:    {}", audio);
  }
}
