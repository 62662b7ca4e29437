use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub sync: SyncConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Per-request timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// Page size of the foreground first load (always at offset 0)
  #[serde(default = "default_page_limit")]
  pub page_limit: u32,
  /// Records fetched per background run
  #[serde(default = "default_batch_size")]
  pub batch_size: u32,
  /// Cursor value on first use and after a reset. Past the first foreground
  /// page so the background runs continue where it stopped.
  #[serde(default = "default_initial_offset")]
  pub initial_offset: u32,
  /// Seconds between background runs
  #[serde(default = "default_interval_secs")]
  pub interval_secs: u64,
  /// Execution window of a single background run
  #[serde(default = "default_run_budget_secs")]
  pub run_budget_secs: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      page_limit: default_page_limit(),
      batch_size: default_batch_size(),
      initial_offset: default_initial_offset(),
      interval_secs: default_interval_secs(),
      run_budget_secs: default_run_budget_secs(),
    }
  }
}

impl SyncConfig {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_secs)
  }

  pub fn run_budget(&self) -> Duration {
    Duration::from_secs(self.run_budget_secs)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// Cache database path (default: $XDG_DATA_HOME/pokecache/cache.db)
  pub path: Option<PathBuf>,
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_page_limit() -> u32 {
  5
}

fn default_batch_size() -> u32 {
  5
}

fn default_initial_offset() -> u32 {
  5
}

fn default_interval_secs() -> u64 {
  15 * 60
}

fn default_run_budget_secs() -> u64 {
  30
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pokecache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pokecache/config.yaml
  ///
  /// Without a file the built-in defaults are used. `POKECACHE_API_URL`
  /// overrides the API base URL in every case.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("POKECACHE_API_URL") {
      config.api.base_url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("pokecache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pokecache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  fn validate(&self) -> Result<()> {
    if self.sync.batch_size == 0 {
      return Err(eyre!("sync.batch_size must be at least 1"));
    }
    if self.sync.page_limit == 0 {
      return Err(eyre!("sync.page_limit must be at least 1"));
    }
    if self.sync.interval_secs == 0 {
      return Err(eyre!("sync.interval_secs must be at least 1"));
    }
    if self.sync.run_budget_secs == 0 {
      return Err(eyre!("sync.run_budget_secs must be at least 1"));
    }
    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be at least 1"));
    }
    Ok(())
  }

  /// Cache database path, from config or the platform data directory.
  pub fn database_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.storage.path {
      return Ok(path.clone());
    }
    Ok(data_dir()?.join("cache.db"))
  }
}

/// Per-user data directory for the cache database and log files.
pub fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("pokecache"))
}
