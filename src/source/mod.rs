//! Data sources: remote API, local offline stores, and the bundle repositories hold.

mod http;
mod memory;
mod sqlite;
mod traits;

pub use http::{HttpClient, HttpRemoteSource};
pub use memory::MemoryLocalStore;
pub use sqlite::SqliteLocalStore;
pub use traits::{
  LocalStore, PlayerProfileSource, RemoteSource, TeamProfileSource, Transport, WritableLocalStore,
};

use std::sync::Arc;

use crate::error::FetchResult;

/// Collaborators injected into every repository.
///
/// Optional capabilities are explicit fields rather than runtime probes.
#[derive(Clone)]
pub struct Sources {
  pub remote: Arc<dyn RemoteSource>,
  pub local: Arc<dyn LocalStore>,
  pub writable: Option<Arc<dyn WritableLocalStore>>,
  pub player_profiles: Option<Arc<dyn PlayerProfileSource>>,
  pub team_profiles: Option<Arc<dyn TeamProfileSource>>,
}

impl Sources {
  pub fn new(remote: Arc<dyn RemoteSource>, local: Arc<dyn LocalStore>) -> Self {
    Self {
      remote,
      local,
      writable: None,
      player_profiles: None,
      team_profiles: None,
    }
  }

  pub fn with_writable(mut self, store: Arc<dyn WritableLocalStore>) -> Self {
    self.writable = Some(store);
    self
  }

  pub fn with_player_profiles(mut self, source: Arc<dyn PlayerProfileSource>) -> Self {
    self.player_profiles = Some(source);
    self
  }

  pub fn with_team_profiles(mut self, source: Arc<dyn TeamProfileSource>) -> Self {
    self.team_profiles = Some(source);
    self
  }

  /// Run `save` against the writable store, or do nothing if there is none.
  pub fn persist<F>(&self, save: F) -> FetchResult<()>
  where
    F: FnOnce(&dyn WritableLocalStore) -> FetchResult<()>,
  {
    match &self.writable {
      Some(store) => save(store.as_ref()),
      None => Ok(()),
    }
  }
}
