use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::state_machine::GameError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No game is stored under the requested code.
    #[error("game `{0}` not found")]
    NotFound(String),
    /// The game left the lobby.
    #[error("game already started")]
    AlreadyStarted,
    /// The lobby reached its target size.
    #[error("game is full")]
    Full,
    /// Another player already uses this name.
    #[error("name `{0}` is already taken")]
    NameTaken(String),
    /// Fewer than three players joined.
    #[error("not enough players to start")]
    NotEnoughPlayers,
    /// A player id in the request does not belong to the game.
    #[error("unknown player: {0}")]
    UnknownPlayer(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The caller holds no session for this game, or its player is gone.
    #[error("not in game")]
    NotInGame,
    /// Concurrent writers kept invalidating the record.
    #[error("game `{0}` is too busy, try again")]
    Contention(String),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::InvalidSettings(_) | GameError::InvalidName => {
                ServiceError::InvalidInput(err.to_string())
            }
            GameError::AlreadyStarted => ServiceError::AlreadyStarted,
            GameError::Full => ServiceError::Full,
            GameError::NameTaken(name) => ServiceError::NameTaken(name),
            GameError::NotEnoughPlayers => ServiceError::NotEnoughPlayers,
            GameError::UnknownVoter(_) | GameError::UnknownTarget(_) => {
                ServiceError::UnknownPlayer(err.to_string())
            }
        }
    }
}

/// Stable machine-readable error category sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyStarted,
    Full,
    NameTaken,
    NotEnoughPlayers,
    UnknownPlayer,
    InvalidInput,
    NotInGame,
    Contention,
    StorageUnavailable,
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    /// Build an error of `kind` carrying a human-readable message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Category of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::InvalidInput | ErrorKind::UnknownPlayer => StatusCode::BAD_REQUEST,
            ErrorKind::NotInGame => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyStarted
            | ErrorKind::Full
            | ErrorKind::NameTaken
            | ErrorKind::NotEnoughPlayers
            | ErrorKind::Contention => StatusCode::CONFLICT,
            ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::new(ErrorKind::InvalidInput, format!("validation failed: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let kind = match &err {
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::AlreadyStarted => ErrorKind::AlreadyStarted,
            ServiceError::Full => ErrorKind::Full,
            ServiceError::NameTaken(_) => ErrorKind::NameTaken,
            ServiceError::NotEnoughPlayers => ErrorKind::NotEnoughPlayers,
            ServiceError::UnknownPlayer(_) => ErrorKind::UnknownPlayer,
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::NotInGame => ErrorKind::NotInGame,
            ServiceError::Contention(_) => ErrorKind::Contention,
            ServiceError::Unavailable(_) | ServiceError::Degraded => ErrorKind::StorageUnavailable,
        };
        let message = match &err {
            ServiceError::Unavailable(source) => format!("storage unavailable: {source}"),
            other => other.to_string(),
        };
        AppError::new(kind, message)
    }
}

/// JSON body returned for every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            kind: self.kind,
            message: self.message,
        });

        (status, payload).into_response()
    }
}
