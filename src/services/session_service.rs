use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::{
    dto::game::{GameSnapshot, PlayerSummary, SessionResponse, ViewerResponse},
    error::ServiceError,
    services::game_service,
    state::{
        SharedState,
        game::{GameRecord, GameStatus, Player},
    },
};

/// Session bound to `token`, as long as its game still lists the player.
pub async fn get_session(
    state: &SharedState,
    token: Option<&str>,
) -> Result<SessionResponse, ServiceError> {
    let session = token
        .and_then(|token| state.sessions().get(token))
        .ok_or(ServiceError::NotInGame)?;
    let (record, player) = resolve_viewer(state, &session.game_code, token).await?;
    Ok(SessionResponse {
        player_id: player.id,
        game_code: record.code,
    })
}

/// Forget the session bound to `token` (leaving the game client-side only).
pub fn clear_session(state: &SharedState, token: Option<&str>) -> bool {
    token.is_some_and(|token| state.sessions().clear(token))
}

/// Pause between two sweeps of idle sessions.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Periodically forget sessions idle for longer than the configured timeout.
pub async fn sweep_idle_sessions(state: SharedState) {
    let max_idle = state.config().session_idle_timeout();
    let mut ticker = interval(SESSION_SWEEP_INTERVAL.min(max_idle));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let evicted = state.sessions().evict_idle(max_idle);
        if evicted > 0 {
            debug!(evicted, remaining = state.sessions().len(), "evicted idle sessions");
        }
    }
}

/// Resolve the caller's player inside `code`.
///
/// Fails with [`ServiceError::NotInGame`] when the token has no session, the
/// session points at another game, or its player is no longer in the roster.
pub async fn resolve_viewer(
    state: &SharedState,
    code: &str,
    token: Option<&str>,
) -> Result<(GameRecord, Player), ServiceError> {
    let session = token
        .and_then(|token| state.sessions().get(token))
        .filter(|session| session.game_code == code)
        .ok_or(ServiceError::NotInGame)?;

    let record = match game_service::find_game(state, code).await {
        Ok(record) => record,
        Err(ServiceError::NotFound(_)) => return Err(ServiceError::NotInGame),
        Err(err) => return Err(err),
    };

    let player = record
        .player(session.player_id)
        .cloned()
        .ok_or(ServiceError::NotInGame)?;
    Ok((record, player))
}

/// The game as seen by the caller, including their secret word once dealt.
pub async fn viewer(
    state: &SharedState,
    code: &str,
    token: Option<&str>,
) -> Result<ViewerResponse, ServiceError> {
    let (record, player) = resolve_viewer(state, code, token).await?;
    Ok(project(&record, &player))
}

fn project(record: &GameRecord, player: &Player) -> ViewerResponse {
    ViewerResponse {
        game: GameSnapshot::from(record),
        player: PlayerSummary::from(player),
        is_host: record.is_host(player.id),
        has_voted: record.has_voted(player.id),
        word: (record.status == GameStatus::Playing).then(|| record.word_for(player).to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::{GameStore, memory::MemoryGameStore},
        dto::game::{CreateGameRequest, JoinGameRequest},
        state::AppState,
    };

    async fn lobby() -> (SharedState, MemoryGameStore, String, String) {
        let store = MemoryGameStore::new();
        let state = AppState::with_store(AppConfig::default(), Arc::new(store.clone())).await;
        let created = game_service::create_game(
            &state,
            CreateGameRequest {
                host_name: "Host".into(),
                player_count: 4,
                mafia_count: 1,
            },
            None,
        )
        .await
        .unwrap();
        (state, store, created.game.code, created.session_token)
    }

    #[tokio::test]
    async fn viewer_sees_own_word_once_started() {
        let (state, _, code, host_token) = lobby().await;
        let joined = game_service::join_game(
            &state,
            &code,
            JoinGameRequest {
                player_name: "Bob".into(),
            },
            None,
        )
        .await
        .unwrap();
        game_service::join_game(
            &state,
            &code,
            JoinGameRequest {
                player_name: "Cleo".into(),
            },
            None,
        )
        .await
        .unwrap();

        let host_view = viewer(&state, &code, Some(&host_token)).await.unwrap();
        assert!(host_view.is_host);
        assert!(host_view.word.is_none());

        game_service::start_game(&state, &code).await.unwrap();
        let view = viewer(&state, &code, Some(&joined.session_token)).await.unwrap();
        assert!(!view.is_host);
        assert!(!view.has_voted);
        let expected = if view.player.is_mafia {
            &view.game.mafia_word
        } else {
            &view.game.normal_word
        };
        assert_eq!(view.word.as_ref(), Some(expected));
    }

    #[tokio::test]
    async fn session_for_another_game_is_not_in_game() {
        let (state, _, code, host_token) = lobby().await;
        state.sessions().set(&host_token, 1, "ZZZZZZ");
        let err = viewer(&state, &code, Some(&host_token)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotInGame));

        let err = viewer(&state, &code, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotInGame));
    }

    #[tokio::test]
    async fn vanished_player_is_not_in_game() {
        let (state, store, code, host_token) = lobby().await;
        let mut record = GameRecord::from(store.find_game(code.clone()).await.unwrap().unwrap());
        let version = record.version;
        record.players.clear();
        record.version += 1;
        store.replace_game(record.into(), version).await.unwrap();

        let err = viewer(&state, &code, Some(&host_token)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotInGame));
    }

    #[tokio::test]
    async fn clearing_session_leaves_game() {
        let (state, _, code, host_token) = lobby().await;
        assert_eq!(
            get_session(&state, Some(&host_token)).await.unwrap().game_code,
            code
        );
        assert!(clear_session(&state, Some(&host_token)));
        assert!(matches!(
            get_session(&state, Some(&host_token)).await,
            Err(ServiceError::NotInGame)
        ));
    }

    #[tokio::test]
    async fn session_of_vanished_game_or_player_is_not_in_game() {
        let (state, store, code, host_token) = lobby().await;
        let mut record = GameRecord::from(store.find_game(code.clone()).await.unwrap().unwrap());
        let version = record.version;
        record.players.clear();
        record.version += 1;
        store.replace_game(record.into(), version).await.unwrap();
        assert!(matches!(
            get_session(&state, Some(&host_token)).await,
            Err(ServiceError::NotInGame)
        ));

        state.sessions().set(&host_token, 1, "ZZZZZZ");
        assert!(matches!(
            get_session(&state, Some(&host_token)).await,
            Err(ServiceError::NotInGame)
        ));
    }
}
