use tracing::{info, warn};

use crate::{
    dao::storage::StorageError,
    dto::{
        game::{
            CastVoteRequest, CreateGameRequest, CreateGameResponse, GameSnapshot,
            JoinGameRequest, JoinGameResponse, JoinableResponse, PlayerSummary,
            VoteResultsResponse,
        },
        validation::normalize_game_code,
    },
    error::ServiceError,
    state::{
        SessionRegistry, SharedState,
        game::GameRecord,
        generator::generate_game_code,
        state_machine::{self, EventOutcome, GameEvent},
        transitions::run_transition_with_broadcast,
    },
};

/// Fresh codes tried when a generated one is already taken.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Parse a code taken from a request path.
pub fn parse_code(raw: &str) -> Result<String, ServiceError> {
    normalize_game_code(raw).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| format!("malformed game code `{raw}`")),
        )
    })
}

/// Create a lobby with the caller as host and bind the caller's session to it.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
    session_token: Option<String>,
) -> Result<CreateGameResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let mut record = {
        let mut rng = rand::rng();
        state_machine::create_game(
            &request.host_name,
            request.player_count,
            request.mafia_count,
            state.config().word_pairs(),
            &mut rng,
        )?
    };

    let mut attempt = 1;
    loop {
        match store.insert_game(record.clone().into()).await {
            Ok(()) => break,
            Err(StorageError::AlreadyExists { code }) if attempt < MAX_CODE_ATTEMPTS => {
                warn!(code = %code, attempt, "generated game code already taken; retrying");
                record.code = generate_game_code(&mut rand::rng());
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let host = record
        .player(record.host_player_id)
        .map(PlayerSummary::from)
        .ok_or_else(|| ServiceError::InvalidInput("host player missing".into()))?;
    let token = session_token.unwrap_or_else(SessionRegistry::new_token);
    state.sessions().set(&token, host.id, &record.code);

    info!(
        code = %record.code,
        player_count = record.player_count,
        mafia_count = record.mafia_count,
        "game created"
    );

    Ok(CreateGameResponse {
        game: GameSnapshot::from(&record),
        player: host,
        session_token: token,
    })
}

/// Read a game by code.
pub async fn find_game(state: &SharedState, code: &str) -> Result<GameRecord, ServiceError> {
    let store = state.require_game_store().await?;
    store
        .find_game(code.to_owned())
        .await?
        .map(GameRecord::from)
        .ok_or_else(|| ServiceError::NotFound(code.to_owned()))
}

/// Full snapshot of a game.
pub async fn get_game(state: &SharedState, code: &str) -> Result<GameSnapshot, ServiceError> {
    let record = find_game(state, code).await?;
    Ok(GameSnapshot::from(&record))
}

/// Tell whether a newcomer could join `code` right now.
pub async fn check_joinable(
    state: &SharedState,
    code: &str,
) -> Result<JoinableResponse, ServiceError> {
    let record = find_game(state, code).await?;
    state_machine::check_joinable(&record)?;
    Ok(JoinableResponse {
        code: record.code,
        players_joined: record.players.len(),
        player_count: record.player_count,
    })
}

/// Add a player to the lobby and bind the caller's session to it.
pub async fn join_game(
    state: &SharedState,
    code: &str,
    request: JoinGameRequest,
    session_token: Option<String>,
) -> Result<JoinGameResponse, ServiceError> {
    let (outcome, record) = run_transition_with_broadcast(
        state,
        code,
        GameEvent::Join {
            name: request.player_name,
        },
    )
    .await?;

    let EventOutcome::Joined(player) = outcome else {
        return Err(ServiceError::InvalidInput("join did not add a player".into()));
    };

    let token = session_token.unwrap_or_else(SessionRegistry::new_token);
    state.sessions().set(&token, player.id, &record.code);
    info!(code = %record.code, player_id = player.id, "player joined");

    Ok(JoinGameResponse {
        game: GameSnapshot::from(&record),
        player: PlayerSummary::from(&player),
        session_token: token,
    })
}

/// Deal roles and leave the lobby.
pub async fn start_game(state: &SharedState, code: &str) -> Result<GameSnapshot, ServiceError> {
    let (_, record) = run_transition_with_broadcast(state, code, GameEvent::Start).await?;
    info!(
        code = %record.code,
        players = record.players.len(),
        mafia = record.mafia_total(),
        "game started"
    );
    Ok(GameSnapshot::from(&record))
}

/// Open a fresh voting round.
pub async fn start_voting(state: &SharedState, code: &str) -> Result<GameSnapshot, ServiceError> {
    let (_, record) = run_transition_with_broadcast(state, code, GameEvent::StartVoting).await?;
    Ok(GameSnapshot::from(&record))
}

/// Record a vote.
pub async fn cast_vote(
    state: &SharedState,
    code: &str,
    request: CastVoteRequest,
) -> Result<GameSnapshot, ServiceError> {
    let (_, record) = run_transition_with_broadcast(
        state,
        code,
        GameEvent::CastVote {
            voter: request.voter_id,
            target: request.target_id,
        },
    )
    .await?;
    Ok(GameSnapshot::from(&record))
}

/// Vote counts and most voted players of the current round.
pub async fn vote_results(
    state: &SharedState,
    code: &str,
) -> Result<VoteResultsResponse, ServiceError> {
    let record = find_game(state, code).await?;
    Ok(VoteResultsResponse::from(&record))
}

/// Reveal the mafia.
pub async fn reveal_mafias(state: &SharedState, code: &str) -> Result<GameSnapshot, ServiceError> {
    let (_, record) = run_transition_with_broadcast(state, code, GameEvent::RevealMafias).await?;
    Ok(GameSnapshot::from(&record))
}

/// Send everyone back to the lobby for another round.
pub async fn reset_to_lobby(state: &SharedState, code: &str) -> Result<GameSnapshot, ServiceError> {
    let (_, record) = run_transition_with_broadcast(state, code, GameEvent::ResetToLobby).await?;
    info!(code = %record.code, "game reset to lobby");
    Ok(GameSnapshot::from(&record))
}
