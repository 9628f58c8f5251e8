//! Chooses between the push and pull transports for live updates.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::pull::PullChannel;
use super::push::PushChannel;

const UPDATE_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
  Disconnected,
  Push,
  Pull,
}

impl fmt::Display for ConnectionMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Disconnected => "disconnected",
      Self::Push => "push",
      Self::Pull => "pull",
    };
    f.write_str(name)
  }
}

struct CoordinatorState {
  mode: ConnectionMode,
  push_url: Option<String>,
  pull_url: Option<String>,
  pull_interval: Duration,
}

/// Live-update transport state machine.
///
/// Every transition holds the state lock for its whole duration, including
/// the push connect attempt, so transitions never interleave and at most one
/// transport is active at a time.
pub struct ConnectionCoordinator<P: PushChannel, Q: PullChannel> {
  push: Arc<P>,
  pull: Arc<Q>,
  state: Mutex<CoordinatorState>,
  mode: watch::Sender<ConnectionMode>,
  updates: broadcast::Sender<Vec<u8>>,
  forwarders: Vec<JoinHandle<()>>,
}

impl<P: PushChannel, Q: PullChannel> ConnectionCoordinator<P, Q> {
  pub fn new(push: Arc<P>, pull: Arc<Q>) -> Self {
    let (mode, _) = watch::channel(ConnectionMode::Disconnected);
    let (updates, _) = broadcast::channel(UPDATE_BUFFER);

    let forwarders = vec![
      tokio::spawn(forward_push(push.messages(), updates.clone())),
      tokio::spawn(forward_pull(pull.data(), updates.clone())),
    ];

    Self {
      push,
      pull,
      state: Mutex::new(CoordinatorState {
        mode: ConnectionMode::Disconnected,
        push_url: None,
        pull_url: None,
        pull_interval: Duration::from_secs(5),
      }),
      mode,
      updates,
      forwarders,
    }
  }

  /// Tear down whatever is running, then try push and fall back to pull.
  ///
  /// A failed push connect is never an error here: it only changes the mode.
  pub async fn start(&self, push_url: Option<String>, pull_url: Option<String>, interval: Duration) {
    let mut state = self.state.lock().await;
    self.push.disconnect().await;
    self.pull.stop_polling();

    state.push_url = push_url;
    state.pull_url = pull_url;
    state.pull_interval = interval;

    self.connect_or_fall_back(&mut state).await;
  }

  pub async fn stop(&self) {
    let mut state = self.state.lock().await;
    self.push.disconnect().await;
    self.pull.stop_polling();
    self.set_mode(&mut state, ConnectionMode::Disconnected);
  }

  /// Drop the push connection in favor of polling. No-op without a pull endpoint
  /// or when the poll loop is already running.
  pub async fn switch_to_polling(&self) {
    let mut state = self.state.lock().await;
    let Some(pull_url) = state.pull_url.clone() else {
      debug!("No pull endpoint configured, staying in {}", state.mode);
      return;
    };
    if state.mode == ConnectionMode::Pull && self.pull.is_polling() {
      return;
    }

    self.push.disconnect().await;
    self.pull.start_polling(state.pull_interval, &pull_url);
    self.set_mode(&mut state, ConnectionMode::Pull);
  }

  /// Retry the push transport. No-op without a push endpoint.
  pub async fn reconnect_web_socket(&self) {
    let mut state = self.state.lock().await;
    if state.push_url.is_none() {
      debug!("No push endpoint configured, nothing to reconnect");
      return;
    }

    self.pull.stop_polling();
    self.connect_or_fall_back(&mut state).await;
  }

  pub fn mode(&self) -> ConnectionMode {
    *self.mode.borrow()
  }

  /// False once the push connection has dropped, even while the mode still says push.
  pub fn is_push_connected(&self) -> bool {
    self.push.is_connected()
  }

  /// Payloads from whichever transport is active, untagged.
  pub fn subscribe_updates(&self) -> broadcast::Receiver<Vec<u8>> {
    self.updates.subscribe()
  }

  /// Current mode, then every transition. Rapid transitions may coalesce.
  pub fn subscribe_mode(&self) -> watch::Receiver<ConnectionMode> {
    self.mode.subscribe()
  }

  async fn connect_or_fall_back(&self, state: &mut CoordinatorState) {
    if let Some(push_url) = state.push_url.clone() {
      match self.push.connect(&push_url).await {
        Ok(()) => {
          self.pull.stop_polling();
          self.set_mode(state, ConnectionMode::Push);
          return;
        }
        Err(e) => warn!(url = %push_url, error = %e, "Push connect failed"),
      }
    }

    match state.pull_url.clone() {
      Some(pull_url) => {
        self.pull.start_polling(state.pull_interval, &pull_url);
        self.set_mode(state, ConnectionMode::Pull);
      }
      None => self.set_mode(state, ConnectionMode::Disconnected),
    }
  }

  fn set_mode(&self, state: &mut CoordinatorState, mode: ConnectionMode) {
    if state.mode != mode {
      info!(from = %state.mode, to = %mode, "Connection mode changed");
    }
    state.mode = mode;
    self.mode.send_replace(mode);
  }
}

impl<P: PushChannel, Q: PullChannel> Drop for ConnectionCoordinator<P, Q> {
  fn drop(&mut self) {
    for forwarder in &self.forwarders {
      forwarder.abort();
    }
  }
}

async fn forward_push(mut messages: broadcast::Receiver<String>, updates: broadcast::Sender<Vec<u8>>) {
  loop {
    match messages.recv().await {
      Ok(message) => {
        let _ = updates.send(message.into_bytes());
      }
      Err(RecvError::Lagged(skipped)) => warn!(skipped, "Push forwarder lagged"),
      Err(RecvError::Closed) => return,
    }
  }
}

async fn forward_pull(
  mut data: broadcast::Receiver<crate::error::FetchResult<Vec<u8>>>,
  updates: broadcast::Sender<Vec<u8>>,
) {
  loop {
    match data.recv().await {
      Ok(Ok(payload)) => {
        let _ = updates.send(payload);
      }
      // Pull errors never reach subscribers
      Ok(Err(_)) => {}
      Err(RecvError::Lagged(skipped)) => warn!(skipped, "Pull forwarder lagged"),
      Err(RecvError::Closed) => return,
    }
  }
}
