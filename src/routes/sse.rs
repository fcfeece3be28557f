use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::{game_service, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/games/{code}/events",
    tag = "sse",
    params(("code" = String, Path, description = "Join code")),
    responses((status = 200, description = "`game.updated` snapshots and `system.status` changes", content_type = "text/event-stream", body = String))
)]
/// Stream snapshots of one game, starting with the current one.
pub async fn game_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let code = game_service::parse_code(&code)?;
    let (subscription, record) = sse_service::subscribe_game(&state, &code).await?;
    info!(code = %code, "new game SSE connection");
    Ok(sse_service::to_sse_stream(
        state.degraded_watcher(),
        subscription,
        record,
    ))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/games/{code}/events", get(game_stream))
}
