use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Word Mafia Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::get_game,
        crate::routes::game::check_joinable,
        crate::routes::game::join_game,
        crate::routes::game::start_game,
        crate::routes::game::start_voting,
        crate::routes::game::cast_vote,
        crate::routes::game::vote_results,
        crate::routes::game::reveal_mafias,
        crate::routes::game::reset_to_lobby,
        crate::routes::session::viewer,
        crate::routes::session::get_session,
        crate::routes::session::clear_session,
        crate::routes::sse::game_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::CreateGameResponse,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::JoinGameResponse,
            crate::dto::game::JoinableResponse,
            crate::dto::game::CastVoteRequest,
            crate::dto::game::GameSnapshot,
            crate::dto::game::PlayerSummary,
            crate::dto::game::VoteCount,
            crate::dto::game::VoteResultsResponse,
            crate::dto::game::ViewerResponse,
            crate::dto::game::SessionResponse,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::phase::VisibleGameStatus,
            crate::dto::sse::SystemStatus,
            crate::error::ErrorBody,
            crate::error::ErrorKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game lifecycle operations"),
        (name = "session", description = "Per-client identity"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
