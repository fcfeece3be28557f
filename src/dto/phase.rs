use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{game::GameStatus, state_machine::GamePhase};

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for players in the lobby.
    Lobby,
    /// Roles dealt, players discuss.
    Discussion,
    /// Voting round open.
    Voting,
    /// Every player voted.
    VotingComplete,
    /// Mafia revealed.
    Revealed,
    /// Game over.
    Ended,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Lobby => VisibleGamePhase::Lobby,
            GamePhase::Discussion => VisibleGamePhase::Discussion,
            GamePhase::Voting => VisibleGamePhase::Voting,
            GamePhase::VotingComplete => VisibleGamePhase::VotingComplete,
            GamePhase::Revealed => VisibleGamePhase::Revealed,
            GamePhase::Ended => VisibleGamePhase::Ended,
        }
    }
}

/// Persisted lifecycle status as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGameStatus {
    Lobby,
    Playing,
    Ended,
}

impl From<GameStatus> for VisibleGameStatus {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::Lobby => VisibleGameStatus::Lobby,
            GameStatus::Playing => VisibleGameStatus::Playing,
            GameStatus::Ended => VisibleGameStatus::Ended,
        }
    }
}
