use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::lookup::LookupChain;
use crate::cache::{CacheKey, CacheLayer, CacheResult, CacheStore, FreshnessPolicy, Lookup, Remote};
use crate::domain::{BoxScore, Game};
use crate::error::{decode_json, FetchResult};
use crate::source::Sources;

/// Games with cache-backed fallback and box score enrichment.
pub struct GameRepository<S: CacheStore> {
  sources: Sources,
  cache: CacheLayer<S>,
  policy: FreshnessPolicy,
}

impl<S: CacheStore> GameRepository<S> {
  pub fn new(sources: Sources, cache: CacheLayer<S>, policy: FreshnessPolicy) -> Self {
    Self {
      sources,
      cache,
      policy,
    }
  }

  /// Games on `date`, or every game when `date` is None.
  pub async fn get_games(&self, date: Option<NaiveDate>) -> FetchResult<Vec<Game>> {
    Ok(self.fetch_games(date).await?.data)
  }

  pub async fn fetch_games(&self, date: Option<NaiveDate>) -> FetchResult<CacheResult<Vec<Game>>> {
    let key = CacheKey::games(date);

    self
      .cache
      .fetch(
        &key,
        &self.policy,
        || async {
          let raw = self.sources.remote.fetch_games(date).await?;
          let games: Vec<Game> = decode_json("games", &raw)?;
          let games = self.enrich_with_box_scores(games).await;
          Ok(Remote { value: games, raw })
        },
        |raw| match date {
          // The local store keeps one games payload: the full collection
          Some(_) => Ok(()),
          None => self.sources.persist(|store| store.save_games(raw)),
        },
        || self.load_local_games(date),
      )
      .await
  }

  /// Get a single game by id.
  ///
  /// A cached live or finished game without a box score is discarded and
  /// refetched directly by id before the usual lookup chain runs.
  pub async fn get_game(&self, id: &str) -> FetchResult<Game> {
    let key = CacheKey::game(id);

    let forced = match self.cache.lookup::<Game>(&key, &self.policy) {
      Lookup::Fresh(game) => return Ok(game),
      Lookup::Incomplete(_) => {
        debug!(game_id = id, "Cached game has no box score, forcing refresh");
        self.cache.invalidate(&key);

        match self.fetch_game_direct(id).await {
          Ok(game) => {
            self.cache.put(&key, &game, &self.policy);
            return Ok(game);
          }
          Err(e) => warn!(game_id = id, error = %e, "Direct game fetch failed"),
        }
        true
      }
      Lookup::Miss => false,
    };

    let game = LookupChain::new("game", id)
      .step("collection", self.find_in_collection(id))
      .step("local store", async { self.find_in_local_store(id) })
      .step_if(!forced, "direct fetch", async {
        self.fetch_game_direct(id).await.map(Some)
      })
      .step("remote collection", self.find_in_remote_collection(id))
      .resolve()
      .await?;

    self.cache.put(&key, &game, &self.policy);
    Ok(game)
  }

  /// Fetch a game by id, topping up a missing box score with a separate fetch.
  async fn fetch_game_direct(&self, id: &str) -> FetchResult<Game> {
    let raw = self.sources.remote.fetch_game(id).await?;
    let game: Game = decode_json("game", &raw)?;
    Ok(self.attach_box_score(game).await)
  }

  /// Fill in the box score of a live or finished game that lacks one.
  ///
  /// Tries the remote first, then the local store. The game is returned
  /// unchanged when both come up empty.
  async fn attach_box_score(&self, mut game: Game) -> Game {
    if !game.needs_box_score() {
      return game;
    }

    match self.fetch_box_score(&game.id).await {
      Ok((box_score, raw)) => {
        if let Err(e) = self
          .sources
          .persist(|store| store.save_box_score(&raw, &game.id))
        {
          warn!(game_id = %game.id, error = %e, "Failed to persist box score");
        }
        game.box_score = Some(box_score);
        return game;
      }
      Err(e) => warn!(game_id = %game.id, error = %e, "Failed to fetch box score"),
    }

    match self.sources.local.load_box_score(&game.id) {
      Ok(Some(raw)) => match decode_json::<BoxScore>("box score", &raw) {
        Ok(box_score) => game.box_score = Some(box_score),
        Err(e) => warn!(game_id = %game.id, error = %e, "Stored box score is unreadable"),
      },
      Ok(None) => {}
      Err(e) => warn!(game_id = %game.id, error = %e, "Failed to load stored box score"),
    }

    game
  }

  async fn fetch_box_score(&self, game_id: &str) -> FetchResult<(BoxScore, Vec<u8>)> {
    let raw = self.sources.remote.fetch_box_score(game_id).await?;
    let box_score = decode_json("box score", &raw)?;
    Ok((box_score, raw))
  }

  async fn find_in_collection(&self, id: &str) -> FetchResult<Option<Game>> {
    let games = self.get_games(None).await?;
    match games.into_iter().find(|g| g.id == id) {
      Some(game) => Ok(Some(self.attach_box_score(game).await)),
      None => Ok(None),
    }
  }

  fn find_in_local_store(&self, id: &str) -> FetchResult<Option<Game>> {
    Ok(
      self
        .load_local_games(None)?
        .and_then(|games| games.into_iter().find(|g| g.id == id)),
    )
  }

  async fn find_in_remote_collection(&self, id: &str) -> FetchResult<Option<Game>> {
    let raw = self.sources.remote.fetch_games(None).await?;
    let games: Vec<Game> = decode_json("games", &raw)?;
    Ok(games.into_iter().find(|g| g.id == id))
  }

  fn load_local_games(&self, date: Option<NaiveDate>) -> FetchResult<Option<Vec<Game>>> {
    let Some(raw) = self.sources.local.load_games()? else {
      return Ok(None);
    };

    let mut games: Vec<Game> = decode_json("stored games", &raw)?;
    if let Some(date) = date {
      games.retain(|g| g.is_on(date));
    }
    Ok(Some(games))
  }

  /// Fetch box scores for every live or finished game missing one.
  ///
  /// One task per game, all joined before returning. A failed task leaves
  /// its game without a box score and never affects the others.
  // TODO: cap the fan-out once upstream rate limits are known; today a full
  // season of finished games spawns one request each.
  async fn enrich_with_box_scores(&self, games: Vec<Game>) -> Vec<Game> {
    let pending: Vec<Game> = games
      .iter()
      .filter(|g| g.needs_box_score())
      .cloned()
      .collect();

    if pending.is_empty() {
      return games;
    }

    debug!(count = pending.len(), "Enriching games with box scores");

    let mut tasks = JoinSet::new();
    for game in pending {
      let remote = Arc::clone(&self.sources.remote);
      tasks.spawn(async move {
        let fetched: FetchResult<BoxScore> = async {
          let raw = remote.fetch_box_score(&game.id).await?;
          decode_json("box score", &raw)
        }
        .await;

        match fetched {
          Ok(box_score) => (game.id, Some(box_score)),
          Err(e) => {
            warn!(game_id = %game.id, status = %game.status, error = %e, "Failed to fetch box score");
            (game.id, None)
          }
        }
      });
    }

    let mut box_scores = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((id, Some(box_score))) => {
          box_scores.insert(id, box_score);
        }
        Ok((_, None)) => {}
        Err(e) => warn!(error = %e, "Box score task aborted"),
      }
    }

    games
      .into_iter()
      .map(|mut game| {
        if game.box_score.is_none() {
          game.box_score = box_scores.remove(&game.id);
        }
        game
      })
      .collect()
  }
}
