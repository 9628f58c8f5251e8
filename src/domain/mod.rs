//! League domain types, deserialized straight from upstream JSON.

mod types;

pub use types::{BoxScore, Game, LeaderEntry, Player, StatCategory, Team};
#[cfg(test)]
pub use types::{GameStatus, Statistic, TeamStats};
