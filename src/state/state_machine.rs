use std::time::SystemTime;

use indexmap::IndexMap;
use rand::Rng;
use thiserror::Error;

use crate::state::{
    game::{GameRecord, GameStatus, Player, PlayerId, VoteMap},
    generator::{WordPair, generate_game_code, generate_word_pair},
};

/// Smallest lobby a game can be created for, and the minimum to start.
pub const MIN_PLAYERS: u8 = 3;
/// Largest lobby a game can be created for.
pub const MAX_PLAYERS: u8 = 20;
/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// Phase of a game, derived from the persisted record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for players.
    Lobby,
    /// Roles dealt, no voting round open.
    Discussion,
    /// A voting round is open and some players have not voted yet.
    Voting,
    /// Every player voted; results can be shown.
    VotingComplete,
    /// The mafia have been revealed.
    Revealed,
    /// Terminal phase; no transition leads here.
    Ended,
}

impl GamePhase {
    /// Derive the phase of `record`.
    pub fn of(record: &GameRecord) -> Self {
        match record.status {
            GameStatus::Lobby => GamePhase::Lobby,
            GameStatus::Ended => GamePhase::Ended,
            GameStatus::Playing if record.mafia_revealed => GamePhase::Revealed,
            GameStatus::Playing if record.voting_complete => GamePhase::VotingComplete,
            GameStatus::Playing if record.votes.is_some() => GamePhase::Voting,
            GameStatus::Playing => GamePhase::Discussion,
        }
    }
}

/// Rule violations raised by the game transitions. None of them mutate the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Player or mafia count out of range, or no host name.
    #[error("invalid game settings: {0}")]
    InvalidSettings(String),
    /// Display name empty or too long.
    #[error("player name must be between 1 and {MAX_NAME_LEN} characters")]
    InvalidName,
    /// Joins are only accepted in the lobby.
    #[error("game already started")]
    AlreadyStarted,
    /// The lobby reached its target size.
    #[error("game is full")]
    Full,
    /// Another player already uses this name.
    #[error("name `{0}` is already taken")]
    NameTaken(String),
    /// Fewer than three players joined.
    #[error("at least {MIN_PLAYERS} players are needed to start")]
    NotEnoughPlayers,
    /// The voter is not part of the game.
    #[error("voter {0} is not in this game")]
    UnknownVoter(PlayerId),
    /// The vote target is not part of the game.
    #[error("target {0} is not in this game")]
    UnknownTarget(PlayerId),
}

/// Mutations that can be applied to an existing game record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A new player joins the lobby.
    Join {
        /// Requested display name.
        name: String,
    },
    /// Deal roles and leave the lobby.
    Start,
    /// Open a fresh voting round.
    StartVoting,
    /// Record or overwrite a vote.
    CastVote {
        /// Player casting the vote.
        voter: PlayerId,
        /// Player being accused.
        target: PlayerId,
    },
    /// Show who the mafia were.
    RevealMafias,
    /// Send everyone back to the lobby, keeping the roster.
    ResetToLobby,
}

/// Result of a successfully applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was applied.
    Applied,
    /// A player joined and received this identity.
    Joined(Player),
}

impl GameEvent {
    /// Apply the event to `record` in place. On error the record is untouched.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        record: &mut GameRecord,
        rng: &mut R,
    ) -> Result<EventOutcome, GameError> {
        match self {
            GameEvent::Join { name } => join_game(record, name).map(EventOutcome::Joined),
            GameEvent::Start => start_game(record, rng).map(|_| EventOutcome::Applied),
            GameEvent::StartVoting => {
                start_voting(record);
                Ok(EventOutcome::Applied)
            }
            GameEvent::CastVote { voter, target } => {
                cast_vote(record, *voter, *target).map(|_| EventOutcome::Applied)
            }
            GameEvent::RevealMafias => {
                reveal_mafias(record);
                Ok(EventOutcome::Applied)
            }
            GameEvent::ResetToLobby => {
                reset_to_lobby(record);
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// Short label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Join { .. } => "join",
            GameEvent::Start => "start",
            GameEvent::StartVoting => "start_voting",
            GameEvent::CastVote { .. } => "cast_vote",
            GameEvent::RevealMafias => "reveal_mafias",
            GameEvent::ResetToLobby => "reset_to_lobby",
        }
    }
}

/// Trim a display name and check its length.
pub fn normalize_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(GameError::InvalidName);
    }
    Ok(trimmed.to_owned())
}

/// Build a fresh lobby with the host as its only player.
pub fn create_game<R: Rng + ?Sized>(
    host_name: &str,
    player_count: u8,
    mafia_count: u8,
    catalog: &[WordPair],
    rng: &mut R,
) -> Result<GameRecord, GameError> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
        return Err(GameError::InvalidSettings(format!(
            "player count must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
        )));
    }
    let max_mafia = player_count / 2;
    if !(1..=max_mafia).contains(&mafia_count) {
        return Err(GameError::InvalidSettings(format!(
            "mafia count must be between 1 and {max_mafia}"
        )));
    }
    let host = normalize_name(host_name)
        .map_err(|_| GameError::InvalidSettings("host name must not be empty".into()))?;

    let words = generate_word_pair(catalog, rng);
    let host_player = Player {
        id: 1,
        name: host.clone(),
        is_mafia: false,
    };

    Ok(GameRecord {
        code: generate_game_code(rng),
        host,
        host_player_id: host_player.id,
        player_count,
        mafia_count,
        players: vec![host_player],
        normal_word: words.normal,
        mafia_word: words.mafia,
        status: GameStatus::Lobby,
        created_at: SystemTime::now(),
        votes: None,
        voting_complete: false,
        mafia_revealed: false,
        next_player_id: 2,
        version: 0,
    })
}

/// Whether a newcomer could join right now, ignoring the name.
pub fn check_joinable(record: &GameRecord) -> Result<(), GameError> {
    if record.status != GameStatus::Lobby {
        return Err(GameError::AlreadyStarted);
    }
    if record.players.len() >= usize::from(record.player_count) {
        return Err(GameError::Full);
    }
    Ok(())
}

/// Append a player to the lobby and hand out the next identifier.
pub fn join_game(record: &mut GameRecord, name: &str) -> Result<Player, GameError> {
    let name = normalize_name(name)?;
    check_joinable(record)?;
    if record.players.iter().any(|player| player.name == name) {
        return Err(GameError::NameTaken(name));
    }

    let player = Player {
        id: record.next_player_id,
        name,
        is_mafia: false,
    };
    record.next_player_id += 1;
    record.players.push(player.clone());
    Ok(player)
}

/// Number of mafia dealt for the current roster.
pub fn effective_mafia_count(record: &GameRecord) -> usize {
    usize::from(record.mafia_count).min(record.players.len() / 2)
}

/// Deal roles: pick mafia uniformly without replacement and enter play.
pub fn start_game<R: Rng + ?Sized>(record: &mut GameRecord, rng: &mut R) -> Result<(), GameError> {
    if record.players.len() < usize::from(MIN_PLAYERS) {
        return Err(GameError::NotEnoughPlayers);
    }

    for player in &mut record.players {
        player.is_mafia = false;
    }

    let mut pool: Vec<usize> = (0..record.players.len()).collect();
    for _ in 0..effective_mafia_count(record) {
        let picked = pool.swap_remove(rng.random_range(0..pool.len()));
        record.players[picked].is_mafia = true;
    }

    record.status = GameStatus::Playing;
    record.votes = None;
    record.voting_complete = false;
    record.mafia_revealed = false;
    Ok(())
}

/// Open a fresh voting round.
pub fn start_voting(record: &mut GameRecord) {
    record.votes = Some(VoteMap::new());
    record.voting_complete = false;
    record.mafia_revealed = false;
}

/// Record `voter`'s vote against `target`, replacing any earlier vote.
pub fn cast_vote(record: &mut GameRecord, voter: PlayerId, target: PlayerId) -> Result<(), GameError> {
    if record.player(voter).is_none() {
        return Err(GameError::UnknownVoter(voter));
    }
    if record.player(target).is_none() {
        return Err(GameError::UnknownTarget(target));
    }

    let votes = record.votes.get_or_insert_with(VoteMap::new);
    votes.insert(voter, target);
    record.voting_complete = votes.len() == record.players.len();
    Ok(())
}

/// Flag the mafia as revealed.
pub fn reveal_mafias(record: &mut GameRecord) {
    record.mafia_revealed = true;
}

/// Return to the lobby with the same code, host, words and roster.
pub fn reset_to_lobby(record: &mut GameRecord) {
    record.status = GameStatus::Lobby;
    record.votes = None;
    record.voting_complete = false;
    record.mafia_revealed = false;
    for player in &mut record.players {
        player.is_mafia = false;
    }
}

/// Votes received by each player, in roster order.
pub fn vote_counts(votes: &VoteMap, players: &[Player]) -> IndexMap<PlayerId, usize> {
    let mut counts: IndexMap<PlayerId, usize> =
        players.iter().map(|player| (player.id, 0)).collect();
    for target in votes.values() {
        if let Some(count) = counts.get_mut(target) {
            *count += 1;
        }
    }
    counts
}

/// Players sharing the highest number of votes, in roster order.
pub fn tally_votes(votes: &VoteMap, players: &[Player]) -> Vec<Player> {
    let counts = vote_counts(votes, players);
    let Some(top) = counts.values().copied().max().filter(|top| *top > 0) else {
        return Vec::new();
    };

    players
        .iter()
        .filter(|player| counts.get(&player.id) == Some(&top))
        .cloned()
        .collect()
}
