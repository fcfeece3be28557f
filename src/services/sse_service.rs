use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{
        change_feed::{self, Subscription},
        game_service, sse_events,
    },
    state::{SharedState, game::GameRecord},
};

/// Subscribe to `code` and fetch its current snapshot.
///
/// The subscription is opened before the read so no write in between is missed.
pub async fn subscribe_game(
    state: &SharedState,
    code: &str,
) -> Result<(Subscription, GameRecord), ServiceError> {
    let subscription = change_feed::subscribe(state, code, None);
    let record = game_service::find_game(state, code).await?;
    Ok((subscription, record))
}

/// Convert a game subscription into an SSE response: the current snapshot
/// first, then every update and degraded mode change until the client leaves.
pub fn to_sse_stream(
    mut degraded: watch::Receiver<bool>,
    mut subscription: Subscription,
    initial: GameRecord,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let code = initial.code.clone();

    tokio::spawn(async move {
        let mut last_version = initial.version;
        if !forward(&tx, sse_events::game_updated(&initial)).await {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                update = subscription.next() => {
                    let Some(record) = update else { break };
                    // Push and poll may both surface a revision the client already has.
                    if record.version <= last_version {
                        continue;
                    }
                    last_version = record.version;
                    if !forward(&tx, sse_events::game_updated(&record)).await {
                        break;
                    }
                }
                changed = degraded.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let value = *degraded.borrow_and_update();
                    if !forward(&tx, sse_events::system_status(value)).await {
                        break;
                    }
                }
            }
        }

        info!(code = %code, "game SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Push one event to the client; `false` once the client is gone.
async fn forward(
    tx: &mpsc::Sender<Result<Event, Infallible>>,
    payload: Option<ServerEvent>,
) -> bool {
    let Some(payload) = payload else {
        return true;
    };

    let event = Event::default().event(payload.name).data(payload.data);
    tx.send(Ok(event)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::game_store::memory::MemoryGameStore, state::AppState,
    };

    #[tokio::test]
    async fn unknown_games_leave_no_hub_behind() {
        let state =
            AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new())).await;

        for code in ["ABC234", "XYZ789", "ABC234"] {
            let err = subscribe_game(&state, code).await.err();
            assert!(matches!(err, Some(ServiceError::NotFound(_))));
        }
        assert!(state.changes().is_empty());
    }
}
