//! Ordered by-id lookup across several sources.

use futures::future::BoxFuture;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};

/// A fixed sequence of lookup steps tried in order until one finds the entity.
///
/// A step that errors or comes back empty moves on to the next one without
/// retry. Errors are logged, never returned; exhausting every step yields
/// `FetchError::NotFound`.
pub struct LookupChain<'a, T> {
  entity: &'static str,
  id: &'a str,
  steps: Vec<(&'static str, BoxFuture<'a, FetchResult<Option<T>>>)>,
}

impl<'a, T> LookupChain<'a, T> {
  pub fn new(entity: &'static str, id: &'a str) -> Self {
    Self {
      entity,
      id,
      steps: Vec::new(),
    }
  }

  pub fn step<F>(mut self, name: &'static str, step: F) -> Self
  where
    F: Future<Output = FetchResult<Option<T>>> + Send + 'a,
  {
    self.steps.push((name, Box::pin(step)));
    self
  }

  /// Add `step` only when `enabled`.
  pub fn step_if<F>(self, enabled: bool, name: &'static str, step: F) -> Self
  where
    F: Future<Output = FetchResult<Option<T>>> + Send + 'a,
  {
    if enabled {
      self.step(name, step)
    } else {
      self
    }
  }

  pub async fn resolve(self) -> FetchResult<T> {
    let entity = self.entity;
    let id = self.id;

    for (name, step) in self.steps {
      match step.await {
        Ok(Some(value)) => {
          debug!(entity, id, step = name, "Lookup resolved");
          return Ok(value);
        }
        Ok(None) => debug!(entity, id, step = name, "Not found in lookup step"),
        Err(e) => warn!(entity, id, step = name, error = %e, "Lookup step failed"),
      }
    }

    Err(FetchError::not_found(entity, id))
  }
}
