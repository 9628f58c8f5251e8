use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a scheduled game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum GameStatus {
  Scheduled,
  Live,
  Finished,
  Postponed,
  Cancelled,
}

impl TryFrom<String> for GameStatus {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    match value.to_lowercase().as_str() {
      "scheduled" => Ok(Self::Scheduled),
      "live" => Ok(Self::Live),
      "finished" => Ok(Self::Finished),
      "postponed" => Ok(Self::Postponed),
      "cancelled" => Ok(Self::Cancelled),
      other => Err(format!("unknown game status '{}'", other)),
    }
  }
}

impl fmt::Display for GameStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Scheduled => "scheduled",
      Self::Live => "live",
      Self::Finished => "finished",
      Self::Postponed => "postponed",
      Self::Cancelled => "cancelled",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
  pub points: u32,
  pub rebounds: u32,
  pub assists: u32,
  pub steals: Option<u32>,
  pub blocks: Option<u32>,
  pub turnovers: Option<u32>,
  pub field_goal_percentage: Option<f64>,
  pub three_point_percentage: Option<f64>,
  pub free_throw_percentage: Option<f64>,
  pub fouls: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterScore {
  pub id: String, // "Q1", "OT1", ...
  pub home_score: u32,
  pub away_score: u32,
  pub quarter_number: u32,
}

/// Per-game detailed statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxScore {
  pub home_score: u32,
  pub away_score: u32,
  pub home_stats: TeamStats,
  pub away_stats: TeamStats,
  pub quarters: Option<Vec<QuarterScore>>,
  pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conference {
  Eastern,
  Western,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
  pub id: String,
  pub name: String,
  pub abbreviation: String,
  pub logo_url: Option<String>,
  pub city: Option<String>,
  pub conference: Option<Conference>,
  pub division: Option<String>,
  pub wins: Option<u32>,
  pub losses: Option<u32>,
  pub win_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
  pub id: String,
  pub home_team: Team,
  pub away_team: Team,
  pub date: DateTime<Utc>,
  pub status: GameStatus,
  pub box_score: Option<BoxScore>,
  pub venue: Option<String>,
  pub league: Option<String>,
  pub broadcast_network: Option<String>,
  pub time_zone: Option<String>,
}

impl Game {
  pub fn is_live(&self) -> bool {
    self.status == GameStatus::Live
  }

  pub fn is_finished(&self) -> bool {
    self.status == GameStatus::Finished
  }

  /// A live or finished game without a box score is stale no matter how
  /// recently it was cached.
  pub fn needs_box_score(&self) -> bool {
    (self.is_live() || self.is_finished()) && self.box_score.is_none()
  }

  /// Whether tip-off falls on `date`, as a UTC calendar day.
  ///
  /// Upstream dates are UTC and `time_zone` is free text, so a late US
  /// evening game belongs to the following day here.
  pub fn is_on(&self, date: NaiveDate) -> bool {
    self.date.date_naive() == date
  }
}

/// Statistical leaderboard categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatCategory {
  Scoring,
  Rebounding,
  Assists,
  Defense,
  Efficiency,
  Shooting,
  Turnovers,
}

impl StatCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Scoring => "scoring",
      Self::Rebounding => "rebounding",
      Self::Assists => "assists",
      Self::Defense => "defense",
      Self::Efficiency => "efficiency",
      Self::Shooting => "shooting",
      Self::Turnovers => "turnovers",
    }
  }

  /// Category name used by the upstream leaders feed
  pub fn api_name(&self) -> &'static str {
    match self {
      Self::Scoring => "points",
      Self::Rebounding => "rebounds",
      Self::Assists => "assists",
      Self::Defense => "steals",
      Self::Efficiency => "efficiency",
      Self::Shooting => "field_goal_percentage",
      Self::Turnovers => "turnovers",
    }
  }

  /// Whether an upstream leader category belongs to this category.
  pub fn matches_api_category(&self, category: &str) -> bool {
    let category = category.to_lowercase();
    if category == self.api_name() {
      return true;
    }

    match self {
      Self::Scoring => category == "points" || category == "point",
      Self::Rebounding => category.contains("rebound"),
      Self::Assists => category.contains("assist"),
      Self::Defense => {
        category.contains("steal") || (category.contains("block") && !category.contains("blocked_att"))
      }
      Self::Shooting => category.contains("pct") || category.contains("percentage"),
      Self::Efficiency => category.contains("efficiency"),
      Self::Turnovers => category.contains("turnover"),
    }
  }
}

impl fmt::Display for StatCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StatCategory {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "scoring" | "points" => Ok(Self::Scoring),
      "rebounding" | "rebounds" => Ok(Self::Rebounding),
      "assists" => Ok(Self::Assists),
      "defense" | "steals" => Ok(Self::Defense),
      "efficiency" => Ok(Self::Efficiency),
      "shooting" => Ok(Self::Shooting),
      "turnovers" => Ok(Self::Turnovers),
      other => Err(format!("unknown stat category '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
  pub id: String,
  pub name: String,
  pub value: f64,
  pub category: StatCategory,
  pub unit: Option<String>,
  pub season: Option<String>,
  pub games_played: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
  pub id: String,
  pub name: String,
  pub team: Team,
  pub position: String,
  #[serde(default)]
  pub statistics: Vec<Statistic>,
  pub jersey_number: Option<u32>,
  pub height: Option<String>,
  pub weight: Option<u32>,
  pub age: Option<u32>,
  pub college: Option<String>,
  #[serde(rename = "photoURL")]
  pub photo_url: Option<String>,
}

impl Player {
  pub fn statistic(&self, category: StatCategory) -> Option<&Statistic> {
    self.statistics.iter().find(|s| s.category == category)
  }
}

/// One row of the upstream leaders feed
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderEntry {
  pub category: String,
  pub player: Player,
}
