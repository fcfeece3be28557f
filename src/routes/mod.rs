use axum::{Router, http::HeaderMap};

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod session;
pub mod sse;

/// Header carrying the opaque session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(session::router())
        .merge(game::router())
        .merge(docs::router());

    api_router.with_state(state)
}

/// Session token sent by the client, if any.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}
