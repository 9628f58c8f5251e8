use super::lookup::LookupChain;
use crate::cache::{CacheKey, CacheLayer, CacheResult, CacheStore, FreshnessPolicy, Lookup, Remote};
use crate::domain::Team;
use crate::error::{decode_json, FetchResult};
use crate::source::Sources;

pub struct TeamRepository<S: CacheStore> {
  sources: Sources,
  cache: CacheLayer<S>,
  policy: FreshnessPolicy,
}

impl<S: CacheStore> TeamRepository<S> {
  pub fn new(sources: Sources, cache: CacheLayer<S>, policy: FreshnessPolicy) -> Self {
    Self {
      sources,
      cache,
      policy,
    }
  }

  pub async fn get_teams(&self) -> FetchResult<Vec<Team>> {
    Ok(self.fetch_teams().await?.data)
  }

  pub async fn fetch_teams(&self) -> FetchResult<CacheResult<Vec<Team>>> {
    self
      .cache
      .fetch(
        &CacheKey::Teams,
        &self.policy,
        || async {
          let raw = self.sources.remote.fetch_teams().await?;
          let teams = decode_json("teams", &raw)?;
          Ok(Remote { value: teams, raw })
        },
        |raw| self.sources.persist(|store| store.save_teams(raw)),
        || self.load_local_teams(),
      )
      .await
  }

  /// Get a single team. A profile fetch is cached but never persisted.
  pub async fn get_team(&self, id: &str) -> FetchResult<Team> {
    let key = CacheKey::team(id);
    if let Lookup::Fresh(team) = self.cache.lookup::<Team>(&key, &self.policy) {
      return Ok(team);
    }

    let team = LookupChain::new("team", id)
      .step_if(
        self.sources.team_profiles.is_some(),
        "profile",
        self.fetch_profile(id),
      )
      .step("collection", async {
        Ok(self.get_teams().await?.into_iter().find(|t| t.id == id))
      })
      .step("local store", async {
        Ok(
          self
            .load_local_teams()?
            .and_then(|teams| teams.into_iter().find(|t| t.id == id)),
        )
      })
      .step("remote collection", async {
        let raw = self.sources.remote.fetch_teams().await?;
        let teams: Vec<Team> = decode_json("teams", &raw)?;
        Ok(teams.into_iter().find(|t| t.id == id))
      })
      .resolve()
      .await?;

    self.cache.put(&key, &team, &self.policy);
    Ok(team)
  }

  async fn fetch_profile(&self, id: &str) -> FetchResult<Option<Team>> {
    let Some(profiles) = &self.sources.team_profiles else {
      return Ok(None);
    };
    let raw = profiles.fetch_team_profile(id).await?;
    decode_json("team profile", &raw).map(Some)
  }

  fn load_local_teams(&self) -> FetchResult<Option<Vec<Team>>> {
    match self.sources.local.load_teams()? {
      Some(raw) => decode_json("stored teams", &raw).map(Some),
      None => Ok(None),
    }
  }
}
