use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
};

use crate::{
    dto::game::{SessionResponse, ViewerResponse},
    error::{AppError, ErrorBody},
    routes::session_token,
    services::{game_service, session_service},
    state::SharedState,
};

/// Routes resolving the caller's identity.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session).delete(clear_session))
        .route("/games/{code}/view", get(viewer))
}

/// The game as seen by the caller.
#[utoipa::path(
    get,
    path = "/games/{code}/view",
    tag = "session",
    params(
        ("code" = String, Path, description = "Join code"),
        ("x-session-token" = String, Header, description = "Session token returned on create or join")
    ),
    responses(
        (status = 200, description = "Viewer projection", body = ViewerResponse),
        (status = 401, description = "Caller is not in this game", body = ErrorBody)
    )
)]
pub async fn viewer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ViewerResponse>, AppError> {
    let code = game_service::parse_code(&code)?;
    let token = session_token(&headers);
    Ok(Json(
        session_service::viewer(&state, &code, token.as_deref()).await?,
    ))
}

/// Session bound to the caller's token.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    params(("x-session-token" = String, Header, description = "Session token")),
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "No session", body = ErrorBody)
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let token = session_token(&headers);
    Ok(Json(
        session_service::get_session(&state, token.as_deref()).await?,
    ))
}

/// Leave the current game.
#[utoipa::path(
    delete,
    path = "/session",
    tag = "session",
    params(("x-session-token" = String, Header, description = "Session token")),
    responses((status = 204, description = "Session cleared"))
)]
pub async fn clear_session(State(state): State<SharedState>, headers: HeaderMap) -> StatusCode {
    let token = session_token(&headers);
    session_service::clear_session(&state, token.as_deref());
    StatusCode::NO_CONTENT
}
