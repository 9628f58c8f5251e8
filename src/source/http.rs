use async_trait::async_trait;
use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::traits::{PlayerProfileSource, RemoteSource, TeamProfileSource, Transport};
use crate::config::ApiConfig;
use crate::error::{FetchError, FetchResult};

/// HTTP client for the league API
#[derive(Clone)]
pub struct HttpClient {
  client: reqwest::Client,
  base_url: Url,
  api_key_header: String,
  api_key: Option<String>,
}

impl HttpClient {
  pub fn new(config: &ApiConfig, api_key: Option<String>) -> Result<Self> {
    let mut base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    // Url::join replaces the last segment unless the path ends with a slash
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url,
      api_key_header: config.api_key_header.clone(),
      api_key,
    })
  }

  /// Resolve an endpoint: absolute URLs are used as-is, anything else is
  /// relative to the base URL.
  pub fn resolve(&self, endpoint: &str) -> FetchResult<Url> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
      return Url::parse(endpoint)
        .map_err(|e| FetchError::Transport(format!("Invalid URL {}: {}", endpoint, e)));
    }

    self
      .base_url
      .join(endpoint.trim_start_matches('/'))
      .map_err(|e| FetchError::Transport(format!("Invalid endpoint {}: {}", endpoint, e)))
  }

  /// Build a URL from path segments (percent-encoded) and query pairs.
  fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> FetchResult<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| FetchError::Transport(format!("Base URL cannot have a path: {}", self.base_url)))?
      .pop_if_empty()
      .extend(segments);

    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
  }

  pub async fn get(&self, url: Url) -> FetchResult<Vec<u8>> {
    debug!(%url, "GET");

    let mut request = self.client.get(url.clone()).header(ACCEPT, "application/json");
    if let Some(key) = &self.api_key {
      request = request.header(self.api_key_header.as_str(), key);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(FetchError::Transport(format!(
        "HTTP {} from {}: {}",
        status, url, body
      )));
    }

    Ok(response.bytes().await?.to_vec())
  }
}

#[async_trait]
impl Transport for HttpClient {
  async fn request(&self, endpoint: &str) -> FetchResult<Vec<u8>> {
    let url = self.resolve(endpoint)?;
    self.get(url).await
  }
}

/// `RemoteSource` over the league REST API.
#[derive(Clone)]
pub struct HttpRemoteSource {
  http: HttpClient,
}

impl HttpRemoteSource {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
  async fn fetch_games(&self, date: Option<NaiveDate>) -> FetchResult<Vec<u8>> {
    let url = match date {
      Some(date) => {
        let date = date.format("%Y-%m-%d").to_string();
        self.http.url(&["games"], &[("date", date.as_str())])?
      }
      None => self.http.url(&["games"], &[])?,
    };
    self.http.get(url).await
  }

  async fn fetch_players(&self) -> FetchResult<Vec<u8>> {
    let url = self.http.url(&["players"], &[])?;
    self.http.get(url).await
  }

  async fn fetch_teams(&self) -> FetchResult<Vec<u8>> {
    let url = self.http.url(&["teams"], &[])?;
    self.http.get(url).await
  }

  async fn fetch_game(&self, id: &str) -> FetchResult<Vec<u8>> {
    let url = self.http.url(&["games", id], &[])?;
    self.http.get(url).await
  }

  async fn fetch_box_score(&self, game_id: &str) -> FetchResult<Vec<u8>> {
    let url = self.http.url(&["games", game_id, "boxscore"], &[])?;
    self.http.get(url).await
  }

  async fn fetch_league_leaders(
    &self,
    season_year: Option<&str>,
    season_type: &str,
  ) -> FetchResult<Vec<u8>> {
    let mut query = vec![("season_type", season_type)];
    if let Some(year) = season_year {
      query.push(("season_year", year));
    }
    let url = self.http.url(&["leaders"], &query)?;
    self.http.get(url).await
  }
}

#[async_trait]
impl PlayerProfileSource for HttpRemoteSource {
  async fn fetch_player_profile(&self, player_id: &str) -> FetchResult<Vec<u8>> {
    let url = self.http.url(&["players", player_id], &[])?;
    self.http.get(url).await
  }
}

#[async_trait]
impl TeamProfileSource for HttpRemoteSource {
  async fn fetch_team_profile(&self, team_id: &str) -> FetchResult<Vec<u8>> {
    let url = self.http.url(&["teams", team_id], &[])?;
    self.http.get(url).await
  }
}
