mod cache;
mod config;
mod domain;
mod error;
mod logging;
mod realtime;
mod repository;
mod source;
#[cfg(test)]
mod testing;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cache::{CacheLayer, CacheResult, CacheSource, MemoryCache};
use crate::config::Config;
use crate::domain::StatCategory;
use crate::realtime::{ConnectionCoordinator, ConnectionMode, PollingChannel, WebSocketChannel};
use crate::repository::Repositories;
use crate::source::{
  HttpClient, HttpRemoteSource, MemoryLocalStore, SqliteLocalStore, Sources, WritableLocalStore,
};

#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(about = "Basketball league data with offline fallback and live updates")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/courtside/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List games, optionally only those on one day
  Games {
    /// Day in YYYY-MM-DD form
    #[arg(short, long)]
    date: Option<NaiveDate>,
  },
  /// Show one game with its box score
  Game { id: String },
  Players,
  Player { id: String },
  Teams,
  Team { id: String },
  /// League leaders for a statistical category
  Leaders {
    category: StatCategory,
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
  },
  /// Stream live updates until interrupted
  Live,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init();

  match args.command {
    Command::Live => live(&config).await,
    command => query(&config, command).await,
  }
}

async fn query(config: &Config, command: Command) -> Result<()> {
  let http = HttpClient::new(&config.api, Config::api_key())?;
  let remote = Arc::new(HttpRemoteSource::new(http));
  let sources = match SqliteLocalStore::open(config.storage.path.as_deref()) {
    Ok(store) => wire_sources(remote, Arc::new(store)),
    Err(e) => {
      warn!(error = %e, "Local store unavailable, offline data will not survive this run");
      wire_sources(remote, Arc::new(MemoryLocalStore::new()))
    }
  };
  let repos = Repositories::new(sources, CacheLayer::new(MemoryCache::new()), &config.cache);

  match command {
    Command::Games { date } => print_result(&repos.games.fetch_games(date).await?),
    Command::Game { id } => print_json(&repos.games.get_game(&id).await?),
    Command::Players => print_result(&repos.players.fetch_players().await?),
    Command::Player { id } => print_json(&repos.players.get_player(&id).await?),
    Command::Teams => print_result(&repos.teams.fetch_teams().await?),
    Command::Team { id } => print_json(&repos.teams.get_team(&id).await?),
    Command::Leaders { category, limit } => {
      print_json(&repos.leaders.get_league_leaders(category, limit).await?)
    }
    Command::Live => Err(eyre!("live is not a query")),
  }
}

fn wire_sources<L: WritableLocalStore + 'static>(remote: Arc<HttpRemoteSource>, local: Arc<L>) -> Sources {
  Sources::new(remote.clone(), local.clone())
    .with_writable(local)
    .with_player_profiles(remote.clone())
    .with_team_profiles(remote)
}

async fn live(config: &Config) -> Result<()> {
  let realtime = &config.realtime;
  if realtime.push_url.is_none() && realtime.pull_url.is_none() {
    return Err(eyre!("Set realtime.push_url or realtime.pull_url to stream live updates"));
  }

  let http = Arc::new(HttpClient::new(&config.api, Config::api_key())?);
  let coordinator = ConnectionCoordinator::new(
    Arc::new(WebSocketChannel::new()),
    Arc::new(PollingChannel::new(http)),
  );

  let mut updates = coordinator.subscribe_updates();
  let mut modes = coordinator.subscribe_mode();

  coordinator
    .start(
      realtime.push_url.clone(),
      realtime.pull_url.clone(),
      config.pull_interval(),
    )
    .await;
  info!(mode = %coordinator.mode(), "Live updates started");

  let shutdown = tokio::signal::ctrl_c();
  tokio::pin!(shutdown);

  let mut health = tokio::time::interval(config.reconnect_interval());
  // The first tick completes immediately
  health.tick().await;

  loop {
    tokio::select! {
      update = updates.recv() => match update {
        Ok(payload) => println!("{}", String::from_utf8_lossy(&payload)),
        Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dropped live updates"),
        Err(RecvError::Closed) => break,
      },
      changed = modes.changed() => {
        if changed.is_err() {
          break;
        }
        let mode = *modes.borrow_and_update();
        info!(%mode, "Connection mode");
        if mode == ConnectionMode::Disconnected {
          warn!("No live transport available");
        }
      },
      _ = health.tick() => match coordinator.mode() {
        ConnectionMode::Pull => coordinator.reconnect_web_socket().await,
        ConnectionMode::Push if !coordinator.is_push_connected() => {
          warn!("Push connection dropped");
          coordinator.switch_to_polling().await;
        }
        _ => {}
      },
      _ = &mut shutdown => {
        info!("Interrupted, shutting down");
        break;
      }
    }
  }

  coordinator.stop().await;
  Ok(())
}

fn print_result<T: Serialize>(result: &CacheResult<T>) -> Result<()> {
  if result.source == CacheSource::LocalStore {
    warn!("Network unavailable, showing offline data");
  }
  print_json(&result.data)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
