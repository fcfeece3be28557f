use std::{collections::BTreeMap, time::SystemTime};

use crate::dao::models::{GameEntity, GameStatusEntity, PlayerEntity};

/// Identifier of a player inside a single game.
pub type PlayerId = u32;

/// Votes of the current round, keyed by voter and pointing at the accused player.
pub type VoteMap = BTreeMap<PlayerId, PlayerId>;

/// Player info tracked during a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identifier assigned at join time, never reused within the game.
    pub id: PlayerId,
    /// Display name, unique inside the game.
    pub name: String,
    /// Whether the player received the minority word for the current round.
    pub is_mafia: bool,
}

/// Top-level lifecycle status persisted with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Players are gathering; joins are accepted.
    Lobby,
    /// Roles are dealt; discussion, voting and reveal happen here.
    Playing,
    /// Terminal status kept for compatibility with stored records. No transition produces it.
    Ended,
}

/// The shared record of a single game, addressed by its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Six-symbol join code.
    pub code: String,
    /// Display name of the player who created the game.
    pub host: String,
    /// Identifier of the player who created the game.
    pub host_player_id: PlayerId,
    /// Target lobby size.
    pub player_count: u8,
    /// Target number of mafia players.
    pub mafia_count: u8,
    /// Players in join order.
    pub players: Vec<Player>,
    /// Word handed to the majority.
    pub normal_word: String,
    /// Word handed to the mafia.
    pub mafia_word: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Votes of the current round, `None` outside a voting round.
    pub votes: Option<VoteMap>,
    /// True once every current player voted exactly once.
    pub voting_complete: bool,
    /// True once the host revealed the mafia.
    pub mafia_revealed: bool,
    /// Identifier handed to the next player joining.
    pub next_player_id: PlayerId,
    /// Revision used for conditional writes.
    pub version: u64,
}

impl GameRecord {
    /// Look a player up by identifier.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Whether `id` designates the creator of the game.
    pub fn is_host(&self, id: PlayerId) -> bool {
        self.host_player_id == id
    }

    /// Whether `id` already has a vote recorded in the current round.
    pub fn has_voted(&self, id: PlayerId) -> bool {
        self.votes
            .as_ref()
            .is_some_and(|votes| votes.contains_key(&id))
    }

    /// Number of players currently holding the mafia word.
    pub fn mafia_total(&self) -> usize {
        self.players.iter().filter(|player| player.is_mafia).count()
    }

    /// Secret word for the given player; only meaningful once roles are dealt.
    pub fn word_for(&self, player: &Player) -> &str {
        if player.is_mafia {
            &self.mafia_word
        } else {
            &self.normal_word
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            is_mafia: value.is_mafia,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
            is_mafia: value.is_mafia,
        }
    }
}

impl From<GameStatusEntity> for GameStatus {
    fn from(value: GameStatusEntity) -> Self {
        match value {
            GameStatusEntity::Lobby => GameStatus::Lobby,
            GameStatusEntity::Playing => GameStatus::Playing,
            GameStatusEntity::Ended => GameStatus::Ended,
        }
    }
}

impl From<GameStatus> for GameStatusEntity {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::Lobby => GameStatusEntity::Lobby,
            GameStatus::Playing => GameStatusEntity::Playing,
            GameStatus::Ended => GameStatusEntity::Ended,
        }
    }
}

impl From<GameEntity> for GameRecord {
    fn from(value: GameEntity) -> Self {
        let players: Vec<Player> = value.players.into_iter().map(Into::into).collect();
        // Records written before the counter existed fall back to the highest id seen.
        let next_player_id = value.next_player_id.max(
            players
                .iter()
                .map(|player| player.id + 1)
                .max()
                .unwrap_or(1),
        );

        Self {
            code: value.code,
            host: value.host,
            host_player_id: value.host_player_id,
            player_count: value.player_count,
            mafia_count: value.mafia_count,
            players,
            normal_word: value.normal_word,
            mafia_word: value.mafia_word,
            status: value.status.into(),
            created_at: value.created_at,
            votes: value.votes,
            voting_complete: value.voting_complete,
            mafia_revealed: value.mafia_revealed,
            next_player_id,
            version: value.version,
        }
    }
}

impl From<GameRecord> for GameEntity {
    fn from(value: GameRecord) -> Self {
        Self {
            code: value.code,
            host: value.host,
            host_player_id: value.host_player_id,
            player_count: value.player_count,
            mafia_count: value.mafia_count,
            players: value.players.into_iter().map(Into::into).collect(),
            normal_word: value.normal_word,
            mafia_word: value.mafia_word,
            status: value.status.into(),
            created_at: value.created_at,
            votes: value.votes,
            voting_complete: value.voting_complete,
            mafia_revealed: value.mafia_revealed,
            next_player_id: value.next_player_id,
            version: value.version,
        }
    }
}
