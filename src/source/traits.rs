//! Collaborator contracts consumed by the repositories and realtime layer.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchResult;

/// Fetches raw serialized league data over the network.
///
/// Payloads are opaque bytes; decoding is the repository's job.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Games on `date`, or every game when `date` is None
  async fn fetch_games(&self, date: Option<NaiveDate>) -> FetchResult<Vec<u8>>;

  async fn fetch_players(&self) -> FetchResult<Vec<u8>>;

  async fn fetch_teams(&self) -> FetchResult<Vec<u8>>;

  /// Full game details, box score included when the upstream has one
  async fn fetch_game(&self, id: &str) -> FetchResult<Vec<u8>>;

  async fn fetch_box_score(&self, game_id: &str) -> FetchResult<Vec<u8>>;

  /// Leader entries (`[{category, player}]`) for a season
  async fn fetch_league_leaders(
    &self,
    season_year: Option<&str>,
    season_type: &str,
  ) -> FetchResult<Vec<u8>>;
}

/// Optional remote capability: fetch one player's profile directly.
#[async_trait]
pub trait PlayerProfileSource: Send + Sync {
  async fn fetch_player_profile(&self, player_id: &str) -> FetchResult<Vec<u8>>;
}

/// Optional remote capability: fetch one team's profile directly.
#[async_trait]
pub trait TeamProfileSource: Send + Sync {
  async fn fetch_team_profile(&self, team_id: &str) -> FetchResult<Vec<u8>>;
}

/// Previously persisted payloads for offline use.
///
/// `Ok(None)` means nothing has been stored yet.
pub trait LocalStore: Send + Sync {
  fn load_games(&self) -> FetchResult<Option<Vec<u8>>>;

  fn load_players(&self) -> FetchResult<Option<Vec<u8>>>;

  fn load_teams(&self) -> FetchResult<Option<Vec<u8>>>;

  fn load_box_score(&self, game_id: &str) -> FetchResult<Option<Vec<u8>>>;
}

/// Write side of a local store. Injected separately so that a read-only
/// store is a valid configuration.
pub trait WritableLocalStore: LocalStore {
  fn save_games(&self, data: &[u8]) -> FetchResult<()>;

  fn save_players(&self, data: &[u8]) -> FetchResult<()>;

  fn save_teams(&self, data: &[u8]) -> FetchResult<()>;

  fn save_box_score(&self, data: &[u8], game_id: &str) -> FetchResult<()>;
}

/// Fetches an arbitrary endpoint. Used by the polling channel.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn request(&self, endpoint: &str) -> FetchResult<Vec<u8>>;
}
