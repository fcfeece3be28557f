use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::game::{
        CastVoteRequest, CreateGameRequest, CreateGameResponse, GameSnapshot, JoinGameRequest,
        JoinGameResponse, JoinableResponse, VoteResultsResponse,
    },
    error::{AppError, ErrorBody},
    routes::session_token,
    services::game_service,
    state::SharedState,
};

/// Routes driving the game lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/{code}", get(get_game))
        .route("/games/{code}/joinable", get(check_joinable))
        .route("/games/{code}/players", post(join_game))
        .route("/games/{code}/start", post(start_game))
        .route("/games/{code}/voting", post(start_voting))
        .route("/games/{code}/votes", post(cast_vote))
        .route("/games/{code}/results", get(vote_results))
        .route("/games/{code}/reveal", post(reveal_mafias))
        .route("/games/{code}/reset", post(reset_to_lobby))
}

/// Open a new lobby with the caller as host.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    request_body = CreateGameRequest,
    params(("x-session-token" = Option<String>, Header, description = "Reuse this session token instead of minting one")),
    responses(
        (status = 201, description = "Game created", body = CreateGameResponse),
        (status = 400, description = "Invalid settings", body = ErrorBody)
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGameResponse>), AppError> {
    payload.validate()?;
    let created = game_service::create_game(&state, payload, session_token(&headers)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Read the full game record.
#[utoipa::path(
    get,
    path = "/games/{code}",
    tag = "game",
    params(("code" = String, Path, description = "Join code")),
    responses(
        (status = 200, description = "Current game", body = GameSnapshot),
        (status = 404, description = "No such game", body = ErrorBody)
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameSnapshot>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::get_game(&state, &code).await?))
}

/// Check that a game exists and still accepts players.
#[utoipa::path(
    get,
    path = "/games/{code}/joinable",
    tag = "game",
    params(("code" = String, Path, description = "Join code")),
    responses(
        (status = 200, description = "Game accepts players", body = JoinableResponse),
        (status = 404, description = "No such game", body = ErrorBody),
        (status = 409, description = "Game started or full", body = ErrorBody)
    )
)]
pub async fn check_joinable(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<JoinableResponse>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::check_joinable(&state, &code).await?))
}

/// Join the lobby.
#[utoipa::path(
    post,
    path = "/games/{code}/players",
    tag = "game",
    request_body = JoinGameRequest,
    params(
        ("code" = String, Path, description = "Join code"),
        ("x-session-token" = Option<String>, Header, description = "Reuse this session token instead of minting one")
    ),
    responses(
        (status = 201, description = "Player joined", body = JoinGameResponse),
        (status = 404, description = "No such game", body = ErrorBody),
        (status = 409, description = "Game started, full, or name taken", body = ErrorBody)
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<JoinGameRequest>,
) -> Result<(StatusCode, Json<JoinGameResponse>), AppError> {
    let code = game_service::parse_code(&code)?;
    payload.validate()?;
    let joined = game_service::join_game(&state, &code, payload, session_token(&headers)).await?;
    Ok((StatusCode::CREATED, Json(joined)))
}

/// Deal roles and start playing.
#[utoipa::path(
    post,
    path = "/games/{code}/start",
    tag = "game",
    params(("code" = String, Path, description = "Join code")),
    responses(
        (status = 200, description = "Game started", body = GameSnapshot),
        (status = 409, description = "Not enough players", body = ErrorBody)
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameSnapshot>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::start_game(&state, &code).await?))
}

/// Open a voting round.
#[utoipa::path(
    post,
    path = "/games/{code}/voting",
    tag = "game",
    params(("code" = String, Path, description = "Join code")),
    responses((status = 200, description = "Voting opened", body = GameSnapshot))
)]
pub async fn start_voting(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameSnapshot>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::start_voting(&state, &code).await?))
}

/// Cast or change a vote.
#[utoipa::path(
    post,
    path = "/games/{code}/votes",
    tag = "game",
    request_body = CastVoteRequest,
    params(("code" = String, Path, description = "Join code")),
    responses(
        (status = 200, description = "Vote recorded", body = GameSnapshot),
        (status = 400, description = "Unknown voter or target", body = ErrorBody)
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<CastVoteRequest>,
) -> Result<Json<GameSnapshot>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::cast_vote(&state, &code, payload).await?))
}

/// Vote counts and most voted players.
#[utoipa::path(
    get,
    path = "/games/{code}/results",
    tag = "game",
    params(("code" = String, Path, description = "Join code")),
    responses((status = 200, description = "Current results", body = VoteResultsResponse))
)]
pub async fn vote_results(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<VoteResultsResponse>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::vote_results(&state, &code).await?))
}

/// Reveal the mafia.
#[utoipa::path(
    post,
    path = "/games/{code}/reveal",
    tag = "game",
    params(("code" = String, Path, description = "Join code")),
    responses((status = 200, description = "Mafia revealed", body = GameSnapshot))
)]
pub async fn reveal_mafias(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameSnapshot>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::reveal_mafias(&state, &code).await?))
}

/// Return to the lobby for another round.
#[utoipa::path(
    post,
    path = "/games/{code}/reset",
    tag = "game",
    params(("code" = String, Path, description = "Join code")),
    responses((status = 200, description = "Back in the lobby", body = GameSnapshot))
)]
pub async fn reset_to_lobby(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameSnapshot>, AppError> {
    let code = game_service::parse_code(&code)?;
    Ok(Json(game_service::reset_to_lobby(&state, &code).await?))
}
