use tracing::{debug, info, warn};

use crate::{
    dao::storage::StorageError,
    error::ServiceError,
    state::{
        SharedState,
        game::GameRecord,
        state_machine::{EventOutcome, GameEvent},
    },
};

/// Apply `event` to the game stored under `code` and broadcast the new snapshot.
///
/// The record is read, mutated in memory and written back only if its stored
/// version did not move in between. A conflicting write restarts the whole
/// read-apply-write until the configured attempts run out. Events that leave
/// the record unchanged are not written nor broadcast.
pub async fn run_transition_with_broadcast(
    state: &SharedState,
    code: &str,
    event: GameEvent,
) -> Result<(EventOutcome, GameRecord), ServiceError> {
    let store = state.require_game_store().await?;
    let max_attempts = state.config().max_write_attempts();

    for attempt in 1..=max_attempts {
        let Some(entity) = store.find_game(code.to_owned()).await? else {
            return Err(ServiceError::NotFound(code.to_owned()));
        };
        let current = GameRecord::from(entity);

        let mut next = current.clone();
        let outcome = {
            let mut rng = rand::rng();
            event.apply(&mut next, &mut rng)?
        };

        if next == current {
            debug!(code, event = event.name(), "transition left the game unchanged");
            return Ok((outcome, current));
        }

        let expected = current.version;
        next.version = expected + 1;

        match store.replace_game(next.clone().into(), expected).await {
            Ok(()) => {
                info!(code, event = event.name(), version = next.version, "game updated");
                state.changes().publish(&next);
                return Ok((outcome, next));
            }
            Err(StorageError::VersionConflict { .. }) => {
                debug!(code, event = event.name(), attempt, "write conflict; retrying");
            }
            Err(err) => {
                warn!(code, event = event.name(), error = %err, "failed to persist game");
                return Err(err.into());
            }
        }
    }

    warn!(code, event = event.name(), attempts = max_attempts, "giving up after repeated write conflicts");
    Err(ServiceError::Contention(code.to_owned()))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use futures::future::BoxFuture;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameStore, memory::MemoryGameStore},
            models::GameEntity,
            storage::StorageResult,
        },
        state::{
            AppState,
            generator::default_word_pairs,
            state_machine::{create_game, join_game},
        },
    };

    /// Lets a rival writer slip in right before the first conditional write.
    struct RacingStore {
        inner: MemoryGameStore,
        raced: AtomicBool,
    }

    impl GameStore for RacingStore {
        fn find_game(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.find_game(code)
        }

        fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.insert_game(game)
        }

        fn replace_game(
            &self,
            game: GameEntity,
            expected_version: u64,
        ) -> BoxFuture<'static, StorageResult<()>> {
            let inner = self.inner.clone();
            let race = !self.raced.swap(true, Ordering::SeqCst);
            Box::pin(async move {
                if race {
                    let mut rival = GameRecord::from(inner.find_game(game.code.clone()).await?.unwrap());
                    let version = rival.version;
                    join_game(&mut rival, "Rival").unwrap();
                    rival.version = version + 1;
                    inner.replace_game(rival.into(), version).await?;
                }
                inner.replace_game(game, expected_version).await
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    /// Rejects every conditional write.
    struct BusyStore(MemoryGameStore);

    impl GameStore for BusyStore {
        fn find_game(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.0.find_game(code)
        }

        fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.0.insert_game(game)
        }

        fn replace_game(
            &self,
            game: GameEntity,
            expected_version: u64,
        ) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async move {
                Err(StorageError::VersionConflict {
                    code: game.code,
                    expected: expected_version,
                })
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    async fn seeded(store: &MemoryGameStore) -> GameRecord {
        let mut rng = StdRng::seed_from_u64(11);
        let record = create_game("Host", 6, 1, &default_word_pairs(), &mut rng).unwrap();
        store.insert_game(record.clone().into()).await.unwrap();
        record
    }

    #[tokio::test]
    async fn conflicting_write_is_retried_without_reusing_ids() {
        let memory = MemoryGameStore::new();
        let record = seeded(&memory).await;
        let store = Arc::new(RacingStore {
            inner: memory.clone(),
            raced: AtomicBool::new(false),
        });
        let state = AppState::with_store(AppConfig::default(), store).await;

        let (outcome, updated) = run_transition_with_broadcast(
            &state,
            &record.code,
            GameEvent::Join { name: "Bob".into() },
        )
        .await
        .unwrap();

        match outcome {
            EventOutcome::Joined(player) => assert_eq!(player.id, 3),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(updated.version, 2);
        assert_eq!(
            updated.players.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["Host", "Rival", "Bob"]
        );

        let stored = GameRecord::from(memory.find_game(record.code.clone()).await.unwrap().unwrap());
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn persistent_conflicts_end_in_contention() {
        let memory = MemoryGameStore::new();
        let record = seeded(&memory).await;
        let state = AppState::with_store(AppConfig::default(), Arc::new(BusyStore(memory))).await;

        let err = run_transition_with_broadcast(&state, &record.code, GameEvent::RevealMafias)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Contention(_)));
    }

    #[tokio::test]
    async fn unchanged_record_skips_write_and_broadcast() {
        let memory = MemoryGameStore::new();
        let record = seeded(&memory).await;
        let state = AppState::with_store(AppConfig::default(), Arc::new(memory.clone())).await;
        let mut rx = state.changes().subscribe(&record.code);

        let (_, first) = run_transition_with_broadcast(&state, &record.code, GameEvent::RevealMafias)
            .await
            .unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(rx.recv().await.unwrap(), first);

        let (_, second) = run_transition_with_broadcast(&state, &record.code, GameEvent::RevealMafias)
            .await
            .unwrap();
        assert_eq!(second, first);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_game_is_not_found() {
        let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new())).await;
        let err = run_transition_with_broadcast(&state, "ABC234", GameEvent::Start)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
