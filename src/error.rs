use thiserror::Error;

/// Errors surfaced by the data and realtime layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Failed to decode {payload}: {cause}")]
  Decoding { payload: &'static str, cause: String },

  #[error("Local store error: {0}")]
  LocalStore(String),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

impl FetchError {
  pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
    Self::NotFound {
      entity,
      id: id.into(),
    }
  }

  pub fn decoding(payload: &'static str, cause: impl std::fmt::Display) -> Self {
    Self::Decoding {
      payload,
      cause: cause.to_string(),
    }
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(e: reqwest::Error) -> Self {
    Self::Transport(e.to_string())
  }
}

impl From<tokio_tungstenite::tungstenite::Error> for FetchError {
  fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
    Self::Transport(e.to_string())
  }
}

impl From<rusqlite::Error> for FetchError {
  fn from(e: rusqlite::Error) -> Self {
    Self::LocalStore(e.to_string())
  }
}

/// Decode a JSON payload, tagging failures with what was being decoded.
pub fn decode_json<T: serde::de::DeserializeOwned>(
  payload: &'static str,
  raw: &[u8],
) -> FetchResult<T> {
  serde_json::from_slice(raw).map_err(|e| FetchError::decoding(payload, e))
}
