use std::time::Duration;

use futures::Stream;
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc,
    },
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::{
    config::ChangeTransport,
    state::{SharedState, game::GameRecord},
};

/// Snapshots buffered between the poll task and the consumer.
const SUBSCRIPTION_BUFFER: usize = 8;

/// Live feed of snapshots for one game, whatever the transport underneath.
///
/// Dropping the subscription unsubscribes: the push hub of the game is
/// released once its last subscriber is gone, and the poll task stops.
pub struct Subscription {
    feed: Feed,
}

enum Feed {
    Pushed(PushedFeed),
    Polled(PolledFeed),
}

struct PushedFeed {
    state: SharedState,
    code: String,
    updates: Option<broadcast::Receiver<GameRecord>>,
}

struct PolledFeed {
    receiver: mpsc::Receiver<GameRecord>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Next snapshot; `None` once the feed is closed.
    pub async fn next(&mut self) -> Option<GameRecord> {
        match &mut self.feed {
            Feed::Pushed(feed) => feed.next().await,
            Feed::Polled(feed) => feed.receiver.recv().await,
        }
    }

    /// Consume the subscription as a stream of snapshots.
    pub fn into_stream(mut self) -> impl Stream<Item = GameRecord> {
        async_stream::stream! {
            while let Some(record) = self.next().await {
                yield record;
            }
        }
    }
}

impl PushedFeed {
    async fn next(&mut self) -> Option<GameRecord> {
        let updates = self.updates.as_mut()?;
        loop {
            match updates.recv().await {
                Ok(record) => return Some(record),
                Err(RecvError::Closed) => return None,
                // Every snapshot replaces the previous one, so skipping is safe.
                Err(RecvError::Lagged(skipped)) => {
                    debug!(code = %self.code, skipped, "change feed subscriber lagged");
                }
            }
        }
    }
}

impl Drop for PushedFeed {
    fn drop(&mut self) {
        drop(self.updates.take());
        self.state.changes().release(&self.code);
    }
}

impl Drop for PolledFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe to changes of `code` using the configured transport.
///
/// `seen_version` is the revision the caller already holds; the poll transport
/// only delivers snapshots with another revision.
pub fn subscribe(state: &SharedState, code: &str, seen_version: Option<u64>) -> Subscription {
    let feed = match state.config().change_transport() {
        ChangeTransport::Push => Feed::Pushed(PushedFeed {
            state: state.clone(),
            code: code.to_owned(),
            updates: Some(state.changes().subscribe(code)),
        }),
        ChangeTransport::Poll => {
            let (tx, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);
            let task = tokio::spawn(poll_changes(
                state.clone(),
                code.to_owned(),
                seen_version,
                state.config().poll_interval(),
                tx,
            ));
            Feed::Polled(PolledFeed { receiver, task })
        }
    };

    Subscription { feed }
}

async fn poll_changes(
    state: SharedState,
    code: String,
    mut seen_version: Option<u64>,
    period: Duration,
    tx: mpsc::Sender<GameRecord>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tx.closed() => break,
            _ = ticker.tick() => {}
        }

        let Some(store) = state.game_store().await else {
            continue;
        };
        let record = match store.find_game(code.clone()).await {
            Ok(Some(entity)) => GameRecord::from(entity),
            Ok(None) => continue,
            Err(err) => {
                warn!(code = %code, error = %err, "failed to poll game");
                continue;
            }
        };

        if seen_version == Some(record.version) {
            continue;
        }
        seen_version = Some(record.version);
        if tx.send(record).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;
    use rand::{SeedableRng, rngs::StdRng};
    use tokio::time::timeout;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::{GameStore, memory::MemoryGameStore},
        state::{
            AppState,
            generator::default_word_pairs,
            state_machine::{GameEvent, create_game},
            transitions::run_transition_with_broadcast,
        },
    };

    const WAIT: Duration = Duration::from_secs(2);

    async fn setup(config: AppConfig) -> (SharedState, GameRecord) {
        let store = MemoryGameStore::new();
        let mut rng = StdRng::seed_from_u64(5);
        let record = create_game("Host", 5, 1, &default_word_pairs(), &mut rng).unwrap();
        store.insert_game(record.clone().into()).await.unwrap();
        let state = AppState::with_store(config, Arc::new(store)).await;
        (state, record)
    }

    #[tokio::test]
    async fn push_transport_delivers_writes() {
        let (state, record) = setup(AppConfig::default()).await;
        let mut subscription = subscribe(&state, &record.code, Some(record.version));

        run_transition_with_broadcast(&state, &record.code, GameEvent::Join { name: "Bob".into() })
            .await
            .unwrap();

        let update = timeout(WAIT, subscription.next()).await.unwrap().unwrap();
        assert_eq!(update.players.len(), 2);
        assert_eq!(update.version, 1);
    }

    #[tokio::test]
    async fn poll_transport_delivers_new_versions_only() {
        let config = AppConfig::default()
            .with_change_transport(ChangeTransport::Poll)
            .with_poll_interval(Duration::from_millis(10));
        let (state, record) = setup(config).await;
        let mut stream = Box::pin(subscribe(&state, &record.code, Some(record.version)).into_stream());

        run_transition_with_broadcast(&state, &record.code, GameEvent::Join { name: "Bob".into() })
            .await
            .unwrap();

        let update = timeout(WAIT, stream.next()).await.unwrap().unwrap();
        assert_eq!(update.version, 1);
        assert_eq!(update.players.len(), 2);
    }

    #[tokio::test]
    async fn dropping_subscription_releases_push_hub() {
        let (state, record) = setup(AppConfig::default()).await;
        let first = subscribe(&state, &record.code, None);
        let second = subscribe(&state, &record.code, None);
        assert_eq!(state.changes().len(), 1);

        drop(first);
        assert_eq!(state.changes().len(), 1);
        drop(second);
        assert!(state.changes().is_empty());
    }
}
