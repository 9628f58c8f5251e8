use chrono::{Datelike, Utc};

use crate::cache::{CacheKey, CacheLayer, CacheResult, CacheStore, FreshnessPolicy, Remote};
use crate::domain::{LeaderEntry, Player, StatCategory};
use crate::error::{decode_json, FetchResult};
use crate::source::Sources;

/// Regular season
const SEASON_TYPE: &str = "REG";

/// League leaders per statistical category.
///
/// Leaders are never written to the local store; offline they are
/// recomputed from the stored player list.
pub struct LeaderRepository<S: CacheStore> {
  sources: Sources,
  cache: CacheLayer<S>,
  policy: FreshnessPolicy,
}

impl<S: CacheStore> LeaderRepository<S> {
  pub fn new(sources: Sources, cache: CacheLayer<S>, policy: FreshnessPolicy) -> Self {
    Self {
      sources,
      cache,
      policy,
    }
  }

  pub async fn get_league_leaders(
    &self,
    category: StatCategory,
    limit: usize,
  ) -> FetchResult<Vec<Player>> {
    Ok(self.fetch_league_leaders(category, limit).await?.data)
  }

  pub async fn fetch_league_leaders(
    &self,
    category: StatCategory,
    limit: usize,
  ) -> FetchResult<CacheResult<Vec<Player>>> {
    let key = CacheKey::LeagueLeaders { category, limit };
    let season_year = Utc::now().year().to_string();

    self
      .cache
      .fetch(
        &key,
        &self.policy,
        || async {
          let raw = self
            .sources
            .remote
            .fetch_league_leaders(Some(season_year.as_str()), SEASON_TYPE)
            .await?;
          let entries: Vec<LeaderEntry> = decode_json("league leaders", &raw)?;
          let leaders = entries
            .into_iter()
            .filter(|e| category.matches_api_category(&e.category))
            .map(|e| e.player)
            .take(limit)
            .collect();
          Ok(Remote {
            value: leaders,
            raw,
          })
        },
        |_| Ok(()),
        || self.rank_local_players(category, limit),
      )
      .await
  }

  fn rank_local_players(
    &self,
    category: StatCategory,
    limit: usize,
  ) -> FetchResult<Option<Vec<Player>>> {
    let Some(raw) = self.sources.local.load_players()? else {
      return Ok(None);
    };
    let players: Vec<Player> = decode_json("stored players", &raw)?;

    let mut ranked: Vec<(f64, Player)> = players
      .into_iter()
      .filter_map(|p| Some((p.statistic(category)?.value, p)))
      .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    Ok(Some(
      ranked.into_iter().take(limit).map(|(_, p)| p).collect(),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryCache};
  use crate::source::{LocalStore, MemoryLocalStore, WritableLocalStore};
  use crate::testing::{player, FakeRemote};
  use chrono::Duration;
  use serde_json::json;
  use std::sync::Arc;

  fn repo(remote: &Arc<FakeRemote>, local: &Arc<MemoryLocalStore>) -> LeaderRepository<MemoryCache> {
    LeaderRepository::new(
      Sources::new(remote.clone(), local.clone()).with_writable(local.clone()),
      CacheLayer::new(MemoryCache::new()),
      FreshnessPolicy::new(Duration::minutes(15), Duration::minutes(10)),
    )
  }

  fn entry(category: &str, id: &str) -> serde_json::Value {
    json!({ "category": category, "player": player(id, &[]) })
  }

  #[tokio::test]
  async fn test_remote_entries_filtered_by_category() {
    let remote = Arc::new(FakeRemote::new());
    remote.respond(
      "leaders",
      vec![
        entry("points", "a"),
        entry("total_rebounds", "b"),
        entry("steals", "c"),
        entry("blocks", "d"),
        entry("blocked_att", "e"),
        entry("point", "f"),
      ],
    );
    let repo = repo(&remote, &Arc::new(MemoryLocalStore::new()));

    let scoring = repo
      .get_league_leaders(StatCategory::Scoring, 10)
      .await
      .unwrap();
    let defense = repo
      .get_league_leaders(StatCategory::Defense, 10)
      .await
      .unwrap();

    let ids = |players: &[Player]| players.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&scoring), vec!["a", "f"]);
    assert_eq!(ids(&defense), vec!["c", "d"]);
  }

  #[tokio::test]
  async fn test_limit_truncates_and_keys_cache() {
    let remote = Arc::new(FakeRemote::new());
    remote.respond(
      "leaders",
      vec![entry("assists", "a"), entry("assists", "b"), entry("assists", "c")],
    );
    let repo = repo(&remote, &Arc::new(MemoryLocalStore::new()));

    let leaders = repo
      .get_league_leaders(StatCategory::Assists, 2)
      .await
      .unwrap();

    assert_eq!(leaders.len(), 2);
    assert!(repo
      .cache
      .store()
      .get::<Vec<Player>>("league_leaders_assists_2")
      .is_some());
  }

  #[tokio::test]
  async fn test_offline_ranks_stored_players() {
    let remote = Arc::new(FakeRemote::new());
    let local = Arc::new(MemoryLocalStore::new());
    let stored = vec![
      player("low", &[(StatCategory::Scoring, 8.5)]),
      player("high", &[(StatCategory::Scoring, 31.2)]),
      player("none", &[(StatCategory::Assists, 12.0)]),
      player("mid", &[(StatCategory::Scoring, 19.0)]),
    ];
    local
      .save_players(&serde_json::to_vec(&stored).unwrap())
      .unwrap();

    let result = repo(&remote, &local)
      .fetch_league_leaders(StatCategory::Scoring, 2)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::LocalStore);
    let ids: Vec<&str> = result.data.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["high", "mid"]);
  }

  #[tokio::test]
  async fn test_leaders_are_not_persisted() {
    let remote = Arc::new(FakeRemote::new());
    remote.respond("leaders", vec![entry("points", "a")]);
    let local = Arc::new(MemoryLocalStore::new());

    repo(&remote, &local)
      .get_league_leaders(StatCategory::Scoring, 5)
      .await
      .unwrap();

    assert_eq!(local.load_players().unwrap(), None);
  }
}
