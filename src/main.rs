mod api;
mod app;
mod cache;
mod config;
mod db;
mod error;
mod event;
mod logging;
mod scheduler;
#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pokecache")]
#[command(about = "A cache-first Pokemon browser with incremental background refresh")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pokecache/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Path to the cache database
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  /// Mirror logs to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List a page of records, from the cache when it has any
  List {
    /// Ignore the cache and replace it with a fresh page
    #[arg(short, long)]
    refresh: bool,

    /// Remote offset of the first record
    #[arg(long, default_value_t = 0)]
    offset: u32,

    /// Page size (default: sync.page_limit)
    #[arg(long)]
    limit: Option<u32>,

    /// Print records as JSON
    #[arg(long)]
    json: bool,
  },
  /// Search cached records by name or id
  Search {
    query: String,

    /// Print records as JSON
    #[arg(long)]
    json: bool,
  },
  /// Show one record in detail
  Show { id: u32 },
  /// Fetch and merge the next batch of records
  Refresh,
  /// Refresh periodically until interrupted
  Watch {
    /// Seconds between runs (default: sync.interval_secs)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,
  },
  /// Show cache size and cursor position
  Status,
  /// Move the cursor back to its initial offset
  Reset,
  /// Delete all cached records and reset the cursor
  Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(db) = args.db {
    config.storage.path = Some(db);
  }

  let _log_guard = logging::init(&config::data_dir()?.join("logs"), args.verbose)?;

  let app = app::App::new(config)?;
  app.run(args.command).await?;

  Ok(())
}
