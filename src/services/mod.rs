/// Push and poll change feeds behind one subscription type.
pub mod change_feed;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game lifecycle operations.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Session lookup and viewer projection.
pub mod session_service;
/// Server-Sent Events payloads.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
