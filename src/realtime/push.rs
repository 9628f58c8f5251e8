//! Push transport: a server-initiated message stream.

use async_trait::async_trait;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::sync::{Arc, PoisonError};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchResult};

const MESSAGE_BUFFER: usize = 256;

/// A bidirectional channel the server pushes messages over.
#[async_trait]
pub trait PushChannel: Send + Sync + 'static {
  /// Open the connection. Replaces any existing one.
  async fn connect(&self, url: &str) -> FetchResult<()>;

  async fn disconnect(&self);

  #[allow(dead_code)]
  async fn send(&self, message: &str) -> FetchResult<()>;

  /// Inbound messages for as long as a connection is open.
  fn messages(&self) -> broadcast::Receiver<String>;

  fn is_connected(&self) -> bool;
}

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// WebSocket push channel.
pub struct WebSocketChannel {
  messages: broadcast::Sender<String>,
  writer: Arc<Mutex<Option<WsWriter>>>,
  reader: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketChannel {
  pub fn new() -> Self {
    let (messages, _) = broadcast::channel(MESSAGE_BUFFER);
    Self {
      messages,
      writer: Arc::new(Mutex::new(None)),
      reader: std::sync::Mutex::new(None),
    }
  }

  fn take_reader(&self) -> Option<JoinHandle<()>> {
    self
      .reader
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take()
  }
}

impl Default for WebSocketChannel {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl PushChannel for WebSocketChannel {
  async fn connect(&self, url: &str) -> FetchResult<()> {
    self.disconnect().await;

    info!(url, "Connecting push channel");
    let (stream, _) = connect_async(url).await?;
    let (write, mut read) = stream.split();
    *self.writer.lock().await = Some(write);

    let messages = self.messages.clone();
    let writer = Arc::clone(&self.writer);
    let reader = tokio::spawn(async move {
      while let Some(msg) = read.next().await {
        match msg {
          Ok(Message::Text(text)) => {
            let _ = messages.send(text);
          }
          Ok(Message::Binary(data)) => {
            let _ = messages.send(String::from_utf8_lossy(&data).into_owned());
          }
          Ok(Message::Ping(data)) => {
            if let Some(w) = writer.lock().await.as_mut() {
              if let Err(e) = w.send(Message::Pong(data)).await {
                warn!(error = %e, "Failed to send pong");
              }
            }
          }
          Ok(Message::Close(_)) => {
            info!("Push channel closed by server");
            break;
          }
          Ok(_) => {}
          Err(e) => {
            warn!(error = %e, "Push channel read failed");
            break;
          }
        }
      }
      debug!("Push channel reader finished");
    });

    *self.reader.lock().unwrap_or_else(PoisonError::into_inner) = Some(reader);
    info!("Push channel connected");
    Ok(())
  }

  async fn disconnect(&self) {
    if let Some(reader) = self.take_reader() {
      reader.abort();
    }

    if let Some(mut writer) = self.writer.lock().await.take() {
      if let Err(e) = writer.close().await {
        debug!(error = %e, "Push channel close failed");
      }
      info!("Push channel disconnected");
    }
  }

  async fn send(&self, message: &str) -> FetchResult<()> {
    let mut guard = self.writer.lock().await;
    let writer = guard
      .as_mut()
      .ok_or_else(|| FetchError::Transport("push channel is not connected".to_string()))?;
    writer.send(Message::Text(message.to_string())).await?;
    Ok(())
  }

  fn messages(&self) -> broadcast::Receiver<String> {
    self.messages.subscribe()
  }

  fn is_connected(&self) -> bool {
    self
      .reader
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .as_ref()
      .is_some_and(|r| !r.is_finished())
  }
}
