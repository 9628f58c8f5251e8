use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::traits::{LocalStore, WritableLocalStore};
use crate::error::FetchResult;

#[derive(Default)]
struct Payloads {
  games: Option<Vec<u8>>,
  players: Option<Vec<u8>>,
  teams: Option<Vec<u8>>,
  box_scores: HashMap<String, Vec<u8>>,
}

/// Local store kept in process memory. Survives network loss, not restarts.
#[derive(Default)]
pub struct MemoryLocalStore {
  payloads: RwLock<Payloads>,
}

impl MemoryLocalStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn read<T>(&self, f: impl FnOnce(&Payloads) -> T) -> T {
    f(&self.payloads.read().unwrap_or_else(PoisonError::into_inner))
  }

  fn write(&self, f: impl FnOnce(&mut Payloads)) {
    f(&mut self.payloads.write().unwrap_or_else(PoisonError::into_inner))
  }
}

impl LocalStore for MemoryLocalStore {
  fn load_games(&self) -> FetchResult<Option<Vec<u8>>> {
    Ok(self.read(|p| p.games.clone()))
  }

  fn load_players(&self) -> FetchResult<Option<Vec<u8>>> {
    Ok(self.read(|p| p.players.clone()))
  }

  fn load_teams(&self) -> FetchResult<Option<Vec<u8>>> {
    Ok(self.read(|p| p.teams.clone()))
  }

  fn load_box_score(&self, game_id: &str) -> FetchResult<Option<Vec<u8>>> {
    Ok(self.read(|p| p.box_scores.get(game_id).cloned()))
  }
}

impl WritableLocalStore for MemoryLocalStore {
  fn save_games(&self, data: &[u8]) -> FetchResult<()> {
    self.write(|p| p.games = Some(data.to_vec()));
    Ok(())
  }

  fn save_players(&self, data: &[u8]) -> FetchResult<()> {
    self.write(|p| p.players = Some(data.to_vec()));
    Ok(())
  }

  fn save_teams(&self, data: &[u8]) -> FetchResult<()> {
    self.write(|p| p.teams = Some(data.to_vec()));
    Ok(())
  }

  fn save_box_score(&self, data: &[u8], game_id: &str) -> FetchResult<()> {
    self.write(|p| {
      p.box_scores.insert(game_id.to_string(), data.to_vec());
    });
    Ok(())
  }
}
