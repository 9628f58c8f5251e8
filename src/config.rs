use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::FreshnessPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub realtime: RealtimeConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL that endpoint paths are resolved against
  pub base_url: String,
  /// Header carrying the API key (key itself comes from the environment)
  #[serde(default = "default_api_key_header")]
  pub api_key_header: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_api_key_header() -> String {
  "x-api-key".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
  /// WebSocket endpoint for pushed updates
  pub push_url: Option<String>,
  /// HTTP endpoint polled when the socket is unavailable
  pub pull_url: Option<String>,
  #[serde(default = "default_pull_interval_secs")]
  pub pull_interval_secs: u64,
  /// How often `live` checks the socket and retries it while polling
  #[serde(default = "default_reconnect_interval_secs")]
  pub reconnect_interval_secs: u64,
}

fn default_pull_interval_secs() -> u64 {
  5
}

fn default_reconnect_interval_secs() -> u64 {
  30
}

impl Default for RealtimeConfig {
  fn default() -> Self {
    Self {
      push_url: None,
      pull_url: None,
      pull_interval_secs: default_pull_interval_secs(),
      reconnect_interval_secs: default_reconnect_interval_secs(),
    }
  }
}

/// Staleness thresholds per entity family, in minutes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub games_stale_minutes: i64,
  pub players_stale_minutes: i64,
  pub teams_stale_minutes: i64,
  pub leaders_stale_minutes: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      games_stale_minutes: 15,
      players_stale_minutes: 15,
      teams_stale_minutes: 30,
      leaders_stale_minutes: 15,
    }
  }
}

impl CacheConfig {
  pub fn games(&self) -> FreshnessPolicy {
    FreshnessPolicy::new(minutes(self.games_stale_minutes), Duration::minutes(5))
  }

  pub fn players(&self) -> FreshnessPolicy {
    FreshnessPolicy::new(minutes(self.players_stale_minutes), Duration::minutes(10))
  }

  pub fn teams(&self) -> FreshnessPolicy {
    FreshnessPolicy::new(minutes(self.teams_stale_minutes), Duration::minutes(30))
  }

  pub fn leaders(&self) -> FreshnessPolicy {
    FreshnessPolicy::new(minutes(self.leaders_stale_minutes), Duration::minutes(10))
  }

  fn validate(&self) -> Result<()> {
    let thresholds = [
      ("games_stale_minutes", self.games_stale_minutes),
      ("players_stale_minutes", self.players_stale_minutes),
      ("teams_stale_minutes", self.teams_stale_minutes),
      ("leaders_stale_minutes", self.leaders_stale_minutes),
    ];

    for (name, value) in thresholds {
      if value < 0 || Duration::try_minutes(value).is_none() {
        return Err(eyre!("cache.{} out of range: {}", name, value));
      }
    }
    Ok(())
  }
}

/// Minutes as a duration, saturating instead of overflowing.
fn minutes(value: i64) -> Duration {
  Duration::try_minutes(value).unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// SQLite file for offline data (defaults to the platform data directory)
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./courtside.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/courtside/config.yaml
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/courtside/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("courtside.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("courtside").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.cache.validate()?;
    Ok(config)
  }

  /// Get the upstream API key from the environment, if set.
  pub fn api_key() -> Option<String> {
    std::env::var("COURTSIDE_API_KEY").ok().filter(|k| !k.is_empty())
  }

  pub fn pull_interval(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.realtime.pull_interval_secs)
  }

  /// Never zero: `tokio::time::interval` panics on a zero period.
  pub fn reconnect_interval(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.realtime.reconnect_interval_secs.max(1))
  }
}
