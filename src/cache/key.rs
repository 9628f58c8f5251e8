//! Cache keys for league queries.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::StatCategory;

/// Query keys. The rendered strings are stable and must not change between
/// releases, otherwise previously cached results stop matching.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
  /// Games on a given day, or every game when `date` is None
  Games { date: Option<NaiveDate> },
  Game { id: String },
  Players,
  Player { id: String },
  Teams,
  Team { id: String },
  LeagueLeaders { category: StatCategory, limit: usize },
}

impl CacheKey {
  pub fn games(date: Option<NaiveDate>) -> Self {
    Self::Games { date }
  }

  pub fn game(id: &str) -> Self {
    Self::Game { id: id.to_string() }
  }

  pub fn player(id: &str) -> Self {
    Self::Player { id: id.to_string() }
  }

  pub fn team(id: &str) -> Self {
    Self::Team { id: id.to_string() }
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Games { date: Some(date) } => write!(f, "games_{}", date.format("%Y-%m-%d")),
      Self::Games { date: None } => f.write_str("games_all"),
      Self::Game { id } => write!(f, "game_{}", id),
      Self::Players => f.write_str("players_all"),
      Self::Player { id } => write!(f, "player_{}", id),
      Self::Teams => f.write_str("teams_all"),
      Self::Team { id } => write!(f, "team_{}", id),
      Self::LeagueLeaders { category, limit } => {
        write!(f, "league_leaders_{}_{}", category.as_str(), limit)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_games_key_by_date() {
    let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    assert_eq!(CacheKey::games(Some(date)).to_string(), "games_2025-01-15");
    assert_eq!(CacheKey::games(None).to_string(), "games_all");
  }

  #[test]
  fn test_entity_keys() {
    assert_eq!(CacheKey::game("abc").to_string(), "game_abc");
    assert_eq!(CacheKey::Players.to_string(), "players_all");
    assert_eq!(CacheKey::player("p1").to_string(), "player_p1");
    assert_eq!(CacheKey::Teams.to_string(), "teams_all");
    assert_eq!(CacheKey::team("t1").to_string(), "team_t1");
  }

  #[test]
  fn test_leaders_key() {
    let key = CacheKey::LeagueLeaders {
      category: StatCategory::Rebounding,
      limit: 10,
    };
    assert_eq!(key.to_string(), "league_leaders_rebounding_10");
  }

  #[test]
  fn test_keys_are_stable() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 1);
    assert_eq!(
      CacheKey::games(date).to_string(),
      CacheKey::games(date).to_string()
    );
  }
}
