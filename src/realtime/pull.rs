//! Pull transport: fetch an endpoint on a fixed interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::FetchResult;
use crate::source::Transport;

const DATA_BUFFER: usize = 64;

/// A timer-driven fetch loop. The data stream carries errors without closing.
pub trait PullChannel: Send + Sync + 'static {
  /// Start fetching `endpoint` every `interval`, replacing any running loop.
  fn start_polling(&self, interval: Duration, endpoint: &str);

  /// Stop the loop. Nothing is emitted once this returns. Idempotent.
  fn stop_polling(&self);

  fn data(&self) -> broadcast::Receiver<FetchResult<Vec<u8>>>;

  fn is_polling(&self) -> bool;
}

struct Running {
  generation: u64,
  handle: JoinHandle<()>,
}

/// Polls a `Transport` from a background task.
pub struct PollingChannel<T: Transport> {
  transport: Arc<T>,
  data: broadcast::Sender<FetchResult<Vec<u8>>>,
  running: Arc<Mutex<Option<Running>>>,
  generation: AtomicU64,
}

impl<T: Transport + 'static> PollingChannel<T> {
  pub fn new(transport: Arc<T>) -> Self {
    let (data, _) = broadcast::channel(DATA_BUFFER);
    Self {
      transport,
      data,
      running: Arc::new(Mutex::new(None)),
      generation: AtomicU64::new(0),
    }
  }

  fn running(&self) -> MutexGuard<'_, Option<Running>> {
    self.running.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// One fetch at a time; the next starts `interval` after the previous ends.
///
/// Results are only published while holding the `running` lock and while
/// this loop's generation is still current, so a stopped or replaced loop
/// can never emit.
async fn poll_loop<T: Transport>(
  generation: u64,
  transport: Arc<T>,
  endpoint: String,
  interval: Duration,
  data: broadcast::Sender<FetchResult<Vec<u8>>>,
  running: Arc<Mutex<Option<Running>>>,
) {
  loop {
    let result = transport.request(&endpoint).await;
    if let Err(e) = &result {
      warn!(%endpoint, error = %e, "Poll failed");
    }

    {
      let current = running.lock().unwrap_or_else(PoisonError::into_inner);
      if current.as_ref().map(|r| r.generation) != Some(generation) {
        return;
      }
      let _ = data.send(result);
    }

    tokio::time::sleep(interval).await;
  }
}

impl<T: Transport + 'static> PullChannel for PollingChannel<T> {
  fn start_polling(&self, interval: Duration, endpoint: &str) {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let mut running = self.running();
    if let Some(previous) = running.take() {
      previous.handle.abort();
    }

    info!(endpoint, ?interval, "Starting poll loop");
    let handle = tokio::spawn(poll_loop(
      generation,
      Arc::clone(&self.transport),
      endpoint.to_string(),
      interval,
      self.data.clone(),
      Arc::clone(&self.running),
    ));
    *running = Some(Running { generation, handle });
  }

  fn stop_polling(&self) {
    if let Some(previous) = self.running().take() {
      previous.handle.abort();
      info!("Stopped poll loop");
    }
  }

  fn data(&self) -> broadcast::Receiver<FetchResult<Vec<u8>>> {
    self.data.subscribe()
  }

  fn is_polling(&self) -> bool {
    self.running().is_some()
  }
}

impl<T: Transport> Drop for PollingChannel<T> {
  fn drop(&mut self) {
    let running = self.running.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(running) = running {
      running.handle.abort();
    }
  }
}
