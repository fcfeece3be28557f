use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    dto::{
        format_system_time,
        phase::{VisibleGamePhase, VisibleGameStatus},
        validation::validate_display_name,
    },
    state::{
        game::{GameRecord, Player, PlayerId},
        state_machine::{GamePhase, tally_votes, vote_counts},
    },
};

/// Payload used to open a new lobby.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_mafia_share"))]
pub struct CreateGameRequest {
    /// Display name of the host, who joins as the first player.
    #[validate(custom(function = "validate_display_name"))]
    pub host_name: String,
    /// Target lobby size.
    #[validate(range(min = 3, max = 20))]
    pub player_count: u8,
    /// Target number of mafia, at most half the lobby.
    #[validate(range(min = 1))]
    pub mafia_count: u8,
}

fn validate_mafia_share(request: &CreateGameRequest) -> Result<(), ValidationError> {
    if request.mafia_count > request.player_count / 2 {
        let mut err = ValidationError::new("mafia_count_too_high");
        err.message = Some(
            format!(
                "Mafia count must be at most half the players (max {})",
                request.player_count / 2
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Payload used to join an existing lobby.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGameRequest {
    /// Requested display name, unique inside the game.
    #[validate(custom(function = "validate_display_name"))]
    pub player_name: String,
}

/// Payload used to cast or change a vote.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CastVoteRequest {
    pub voter_id: PlayerId,
    pub target_id: PlayerId,
}

/// Public projection of a player.
#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub is_mafia: bool,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            is_mafia: player.is_mafia,
        }
    }
}

/// Full game record as seen by clients and pushed on the change feed.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GameSnapshot {
    pub code: String,
    pub host: String,
    pub host_player_id: PlayerId,
    pub player_count: u8,
    pub mafia_count: u8,
    pub players: Vec<PlayerSummary>,
    pub normal_word: String,
    pub mafia_word: String,
    pub status: VisibleGameStatus,
    /// Phase derived from the status and voting fields.
    pub phase: VisibleGamePhase,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Voter id to accused id, absent outside a voting round.
    pub votes: Option<BTreeMap<PlayerId, PlayerId>>,
    pub voting_complete: bool,
    pub mafia_revealed: bool,
    /// Record revision; increases by one on every write.
    pub version: u64,
}

impl From<&GameRecord> for GameSnapshot {
    fn from(record: &GameRecord) -> Self {
        Self {
            code: record.code.clone(),
            host: record.host.clone(),
            host_player_id: record.host_player_id,
            player_count: record.player_count,
            mafia_count: record.mafia_count,
            players: record.players.iter().map(Into::into).collect(),
            normal_word: record.normal_word.clone(),
            mafia_word: record.mafia_word.clone(),
            status: record.status.into(),
            phase: GamePhase::of(record).into(),
            created_at: format_system_time(record.created_at),
            votes: record.votes.clone(),
            voting_complete: record.voting_complete,
            mafia_revealed: record.mafia_revealed,
            version: record.version,
        }
    }
}

/// Returned once a game has been created.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateGameResponse {
    pub game: GameSnapshot,
    /// The host's own player entry.
    pub player: PlayerSummary,
    /// Token to send back in the `x-session-token` header.
    pub session_token: String,
}

/// Returned once a player joined.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinGameResponse {
    pub game: GameSnapshot,
    pub player: PlayerSummary,
    /// Token to send back in the `x-session-token` header.
    pub session_token: String,
}

/// Lobby occupancy returned by the join precheck.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinableResponse {
    pub code: String,
    pub players_joined: usize,
    pub player_count: u8,
}

/// Votes received by one player.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct VoteCount {
    pub player_id: PlayerId,
    pub name: String,
    pub votes: usize,
}

/// Outcome of the current voting round.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResultsResponse {
    pub voting_complete: bool,
    pub votes_cast: usize,
    /// Every player with their vote count, in join order.
    pub counts: Vec<VoteCount>,
    /// Players sharing the highest count; more than one on a tie.
    pub most_voted: Vec<PlayerSummary>,
    pub mafia_revealed: bool,
    /// Mafia players, only present once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mafia: Option<Vec<PlayerSummary>>,
}

impl From<&GameRecord> for VoteResultsResponse {
    fn from(record: &GameRecord) -> Self {
        let votes = record.votes.clone().unwrap_or_default();
        let counts = vote_counts(&votes, &record.players);

        Self {
            voting_complete: record.voting_complete,
            votes_cast: votes.len(),
            counts: record
                .players
                .iter()
                .map(|player| VoteCount {
                    player_id: player.id,
                    name: player.name.clone(),
                    votes: counts.get(&player.id).copied().unwrap_or_default(),
                })
                .collect(),
            most_voted: tally_votes(&votes, &record.players)
                .iter()
                .map(Into::into)
                .collect(),
            mafia_revealed: record.mafia_revealed,
            mafia: record.mafia_revealed.then(|| {
                record
                    .players
                    .iter()
                    .filter(|player| player.is_mafia)
                    .map(Into::into)
                    .collect()
            }),
        }
    }
}

/// The game as seen by one player.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewerResponse {
    pub game: GameSnapshot,
    pub player: PlayerSummary,
    pub is_host: bool,
    pub has_voted: bool,
    /// The viewer's secret word, only once roles are dealt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

/// Identity attached to a session token.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub player_id: PlayerId,
    pub game_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(player_count: u8, mafia_count: u8) -> CreateGameRequest {
        CreateGameRequest {
            host_name: "Ana".into(),
            player_count,
            mafia_count,
        }
    }

    #[test]
    fn create_request_bounds() {
        assert!(request(3, 1).validate().is_ok());
        assert!(request(20, 10).validate().is_ok());
        assert!(request(2, 1).validate().is_err());
        assert!(request(21, 1).validate().is_err());
        assert!(request(6, 0).validate().is_err());
        assert!(request(6, 4).validate().is_err());
    }

    #[test]
    fn join_request_requires_name() {
        let blank = JoinGameRequest {
            player_name: "  ".into(),
        };
        assert!(blank.validate().is_err());
    }
}
