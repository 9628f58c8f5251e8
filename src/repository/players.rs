use super::lookup::LookupChain;
use crate::cache::{CacheKey, CacheLayer, CacheResult, CacheStore, FreshnessPolicy, Lookup, Remote};
use crate::domain::Player;
use crate::error::{decode_json, FetchResult};
use crate::source::Sources;

pub struct PlayerRepository<S: CacheStore> {
  sources: Sources,
  cache: CacheLayer<S>,
  policy: FreshnessPolicy,
}

impl<S: CacheStore> PlayerRepository<S> {
  pub fn new(sources: Sources, cache: CacheLayer<S>, policy: FreshnessPolicy) -> Self {
    Self {
      sources,
      cache,
      policy,
    }
  }

  pub async fn get_players(&self) -> FetchResult<Vec<Player>> {
    Ok(self.fetch_players().await?.data)
  }

  pub async fn fetch_players(&self) -> FetchResult<CacheResult<Vec<Player>>> {
    self
      .cache
      .fetch(
        &CacheKey::Players,
        &self.policy,
        || async {
          let raw = self.sources.remote.fetch_players().await?;
          let players = decode_json("players", &raw)?;
          Ok(Remote {
            value: players,
            raw,
          })
        },
        |raw| self.sources.persist(|store| store.save_players(raw)),
        || self.load_local_players(),
      )
      .await
  }

  /// Get a single player, trying the profile endpoint before the collection.
  pub async fn get_player(&self, id: &str) -> FetchResult<Player> {
    let key = CacheKey::player(id);
    if let Lookup::Fresh(player) = self.cache.lookup::<Player>(&key, &self.policy) {
      return Ok(player);
    }

    let player = LookupChain::new("player", id)
      .step_if(
        self.sources.player_profiles.is_some(),
        "profile",
        self.fetch_profile(id),
      )
      .step("collection", async {
        Ok(self.get_players().await?.into_iter().find(|p| p.id == id))
      })
      .step("local store", async {
        Ok(
          self
            .load_local_players()?
            .and_then(|players| players.into_iter().find(|p| p.id == id)),
        )
      })
      .step("remote collection", async {
        let raw = self.sources.remote.fetch_players().await?;
        let players: Vec<Player> = decode_json("players", &raw)?;
        Ok(players.into_iter().find(|p| p.id == id))
      })
      .resolve()
      .await?;

    self.cache.put(&key, &player, &self.policy);
    Ok(player)
  }

  async fn fetch_profile(&self, id: &str) -> FetchResult<Option<Player>> {
    let Some(profiles) = &self.sources.player_profiles else {
      return Ok(None);
    };
    let raw = profiles.fetch_player_profile(id).await?;
    decode_json("player profile", &raw).map(Some)
  }

  fn load_local_players(&self) -> FetchResult<Option<Vec<Player>>> {
    match self.sources.local.load_players()? {
      Some(raw) => decode_json("stored players", &raw).map(Some),
      None => Ok(None),
    }
  }
}
