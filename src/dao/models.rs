use std::{collections::BTreeMap, time::SystemTime};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// Player entry persisted inside a game record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Identifier assigned when the player joined.
    pub id: u32,
    /// Display name chosen by the player.
    pub name: String,
    /// Whether the player holds the mafia word.
    #[serde(default)]
    pub is_mafia: bool,
}

/// Persisted lifecycle status of a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusEntity {
    Lobby,
    Playing,
    Ended,
}

/// Aggregate game entity persisted by the storage layer.
///
/// Vote maps are keyed by player id; keys go through [`DisplayFromStr`] so
/// document stores that only accept string keys can hold them.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Join code, also the primary key.
    pub code: String,
    /// Display name of the creator.
    pub host: String,
    /// Identifier of the creator.
    pub host_player_id: u32,
    /// Target lobby size.
    pub player_count: u8,
    /// Target mafia count.
    pub mafia_count: u8,
    /// Players in join order.
    pub players: Vec<PlayerEntity>,
    /// Majority word.
    pub normal_word: String,
    /// Minority word.
    pub mafia_word: String,
    /// Lifecycle status.
    pub status: GameStatusEntity,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Votes of the current round keyed by voter id.
    #[serde_as(as = "Option<BTreeMap<DisplayFromStr, _>>")]
    pub votes: Option<BTreeMap<u32, u32>>,
    /// Whether every player has voted.
    #[serde(default)]
    pub voting_complete: bool,
    /// Whether the mafia were revealed.
    #[serde(default)]
    pub mafia_revealed: bool,
    /// Next identifier handed to a joining player.
    #[serde(default)]
    pub next_player_id: u32,
    /// Revision used for compare-and-swap writes.
    #[serde(default)]
    pub version: u64,
}
