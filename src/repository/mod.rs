//! Repositories: one per entity family, each backed by the shared cache layer.

mod games;
mod leaders;
mod lookup;
mod players;
mod teams;

pub use games::GameRepository;
pub use leaders::LeaderRepository;
pub use players::PlayerRepository;
pub use teams::TeamRepository;

use crate::cache::{CacheLayer, CacheStore, Cacheable};
use crate::config::CacheConfig;
use crate::domain::{Game, Player, Team};
use crate::source::Sources;

impl Cacheable for Game {
  fn requires_refresh(&self) -> bool {
    self.needs_box_score()
  }
}

impl Cacheable for Player {}

impl Cacheable for Team {}

/// Every repository, sharing one set of sources and one cache.
pub struct Repositories<S: CacheStore> {
  pub games: GameRepository<S>,
  pub players: PlayerRepository<S>,
  pub teams: TeamRepository<S>,
  pub leaders: LeaderRepository<S>,
}

impl<S: CacheStore> Repositories<S> {
  pub fn new(sources: Sources, cache: CacheLayer<S>, config: &CacheConfig) -> Self {
    Self {
      games: GameRepository::new(sources.clone(), cache.clone(), config.games()),
      players: PlayerRepository::new(sources.clone(), cache.clone(), config.players()),
      teams: TeamRepository::new(sources.clone(), cache.clone(), config.teams()),
      leaders: LeaderRepository::new(sources, cache, config.leaders()),
    }
  }
}
