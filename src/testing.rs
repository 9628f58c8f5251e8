//! Scripted fakes and fixtures shared by unit tests.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::domain::{BoxScore, Game, GameStatus, Player, StatCategory, Statistic, Team, TeamStats};
use crate::error::{FetchError, FetchResult};
use crate::realtime::{PullChannel, PushChannel};
use crate::source::{PlayerProfileSource, RemoteSource, TeamProfileSource, Transport};

/// Remote source answering from a table of canned responses.
///
/// Requests are named `games:all`, `games:<date>`, `game:<id>`, `box:<id>`,
/// `players`, `teams`, `leaders`, `player_profile:<id>`, `team_profile:<id>`.
/// Unscripted requests fail with a transport error.
#[derive(Default)]
pub struct FakeRemote {
  responses: Mutex<HashMap<String, FetchResult<Vec<u8>>>>,
  calls: Mutex<Vec<String>>,
}

impl FakeRemote {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, request: &str, payload: impl serde::Serialize) -> &Self {
    let raw = serde_json::to_vec(&payload).unwrap();
    self
      .responses
      .lock()
      .unwrap()
      .insert(request.to_string(), Ok(raw));
    self
  }

  pub fn respond_raw(&self, request: &str, raw: &[u8]) -> &Self {
    self
      .responses
      .lock()
      .unwrap()
      .insert(request.to_string(), Ok(raw.to_vec()));
    self
  }

  pub fn fail(&self, request: &str) -> &Self {
    self.responses.lock().unwrap().insert(
      request.to_string(),
      Err(FetchError::Transport(format!("{} failed", request))),
    );
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self, request: &str) -> usize {
    self.calls().iter().filter(|c| *c == request).count()
  }

  fn answer(&self, request: String) -> FetchResult<Vec<u8>> {
    self.calls.lock().unwrap().push(request.clone());
    self
      .responses
      .lock()
      .unwrap()
      .get(&request)
      .cloned()
      .unwrap_or_else(|| Err(FetchError::Transport(format!("{} unavailable", request))))
  }
}

#[async_trait]
impl RemoteSource for FakeRemote {
  async fn fetch_games(&self, date: Option<NaiveDate>) -> FetchResult<Vec<u8>> {
    match date {
      Some(d) => self.answer(format!("games:{}", d.format("%Y-%m-%d"))),
      None => self.answer("games:all".to_string()),
    }
  }

  async fn fetch_players(&self) -> FetchResult<Vec<u8>> {
    self.answer("players".to_string())
  }

  async fn fetch_teams(&self) -> FetchResult<Vec<u8>> {
    self.answer("teams".to_string())
  }

  async fn fetch_game(&self, id: &str) -> FetchResult<Vec<u8>> {
    self.answer(format!("game:{}", id))
  }

  async fn fetch_box_score(&self, game_id: &str) -> FetchResult<Vec<u8>> {
    self.answer(format!("box:{}", game_id))
  }

  async fn fetch_league_leaders(
    &self,
    _season_year: Option<&str>,
    _season_type: &str,
  ) -> FetchResult<Vec<u8>> {
    self.answer("leaders".to_string())
  }
}

#[async_trait]
impl PlayerProfileSource for FakeRemote {
  async fn fetch_player_profile(&self, player_id: &str) -> FetchResult<Vec<u8>> {
    self.answer(format!("player_profile:{}", player_id))
  }
}

#[async_trait]
impl TeamProfileSource for FakeRemote {
  async fn fetch_team_profile(&self, team_id: &str) -> FetchResult<Vec<u8>> {
    self.answer(format!("team_profile:{}", team_id))
  }
}

/// Transport answering `<endpoint>#<n>` for the n-th request overall.
#[derive(Default)]
pub struct ScriptedTransport {
  requests: Mutex<Vec<String>>,
  failures_left: AtomicUsize,
}

impl ScriptedTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fail the first `count` requests.
  pub fn failing_first(count: usize) -> Self {
    Self {
      failures_left: AtomicUsize::new(count),
      ..Self::default()
    }
  }

  pub fn requests(&self) -> Vec<String> {
    self.requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn request(&self, endpoint: &str) -> FetchResult<Vec<u8>> {
    let n = {
      let mut requests = self.requests.lock().unwrap();
      requests.push(endpoint.to_string());
      requests.len()
    };

    let failing = self
      .failures_left
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
      .is_ok();
    if failing {
      return Err(FetchError::Transport(format!("{} unavailable", endpoint)));
    }
    Ok(format!("{}#{}", endpoint, n).into_bytes())
  }
}

/// Push channel whose connect outcome is set by the test.
pub struct FakePush {
  accept: AtomicBool,
  connected: AtomicBool,
  connects: Mutex<Vec<String>>,
  messages: broadcast::Sender<String>,
}

impl FakePush {
  pub fn new(accept: bool) -> Self {
    let (messages, _) = broadcast::channel(16);
    Self {
      accept: AtomicBool::new(accept),
      connected: AtomicBool::new(false),
      connects: Mutex::new(Vec::new()),
      messages,
    }
  }

  pub fn accept(&self, accept: bool) {
    self.accept.store(accept, Ordering::SeqCst);
  }

  pub fn connects(&self) -> Vec<String> {
    self.connects.lock().unwrap().clone()
  }

  pub fn emit(&self, message: &str) {
    let _ = self.messages.send(message.to_string());
  }
}

#[async_trait]
impl PushChannel for FakePush {
  async fn connect(&self, url: &str) -> FetchResult<()> {
    self.connects.lock().unwrap().push(url.to_string());
    if self.accept.load(Ordering::SeqCst) {
      self.connected.store(true, Ordering::SeqCst);
      Ok(())
    } else {
      self.connected.store(false, Ordering::SeqCst);
      Err(FetchError::Transport("connection refused".to_string()))
    }
  }

  async fn disconnect(&self) {
    self.connected.store(false, Ordering::SeqCst);
  }

  async fn send(&self, _message: &str) -> FetchResult<()> {
    Ok(())
  }

  fn messages(&self) -> broadcast::Receiver<String> {
    self.messages.subscribe()
  }

  fn is_connected(&self) -> bool {
    self.connected.load(Ordering::SeqCst)
  }
}

/// Pull channel that records its loop instead of running one.
pub struct FakePull {
  running: Mutex<Option<(String, Duration)>>,
  starts: Mutex<usize>,
  data: broadcast::Sender<FetchResult<Vec<u8>>>,
}

impl FakePull {
  pub fn new() -> Self {
    let (data, _) = broadcast::channel(16);
    Self {
      running: Mutex::new(None),
      starts: Mutex::new(0),
      data,
    }
  }

  /// How many times a loop has been started.
  pub fn starts(&self) -> usize {
    *self.starts.lock().unwrap()
  }

  /// Endpoint and interval of the active loop.
  pub fn active(&self) -> Option<(String, Duration)> {
    self.running.lock().unwrap().clone()
  }

  pub fn emit(&self, result: FetchResult<Vec<u8>>) {
    let _ = self.data.send(result);
  }
}

impl PullChannel for FakePull {
  fn start_polling(&self, interval: Duration, endpoint: &str) {
    *self.starts.lock().unwrap() += 1;
    *self.running.lock().unwrap() = Some((endpoint.to_string(), interval));
  }

  fn stop_polling(&self) {
    *self.running.lock().unwrap() = None;
  }

  fn data(&self) -> broadcast::Receiver<FetchResult<Vec<u8>>> {
    self.data.subscribe()
  }

  fn is_polling(&self) -> bool {
    self.running.lock().unwrap().is_some()
  }
}

pub fn team(id: &str) -> Team {
  Team {
    id: id.to_string(),
    name: format!("Team {}", id),
    abbreviation: id.to_uppercase(),
    logo_url: None,
    city: None,
    conference: None,
    division: None,
    wins: None,
    losses: None,
    win_percentage: None,
  }
}

pub fn game_on(id: &str, status: GameStatus, date: NaiveDate) -> Game {
  let tip_off = Utc.from_utc_datetime(&date.and_hms_opt(19, 30, 0).unwrap());
  Game {
    id: id.to_string(),
    home_team: team("home"),
    away_team: team("away"),
    date: tip_off,
    status,
    box_score: None,
    venue: None,
    league: None,
    broadcast_network: None,
    time_zone: None,
  }
}

pub fn game(id: &str, status: GameStatus) -> Game {
  game_on(id, status, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
}

pub fn box_score(home: u32, away: u32) -> BoxScore {
  let stats = |points| TeamStats {
    points,
    rebounds: 40,
    assists: 20,
    steals: None,
    blocks: None,
    turnovers: None,
    field_goal_percentage: None,
    three_point_percentage: None,
    free_throw_percentage: None,
    fouls: None,
  };
  BoxScore {
    home_score: home,
    away_score: away,
    home_stats: stats(home),
    away_stats: stats(away),
    quarters: None,
    last_updated: None,
  }
}

pub fn player(id: &str, stats: &[(StatCategory, f64)]) -> Player {
  Player {
    id: id.to_string(),
    name: format!("Player {}", id),
    team: team("t1"),
    position: "Guard".to_string(),
    statistics: stats
      .iter()
      .map(|(category, value)| Statistic {
        id: format!("{}-{}", id, category),
        name: category.to_string(),
        value: *value,
        category: *category,
        unit: None,
        season: None,
        games_played: None,
      })
      .collect(),
    jersey_number: None,
    height: None,
    weight: None,
    age: None,
    college: None,
    photo_url: None,
  }
}
