//! Process-local store used by default and in tests.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;

use crate::dao::{
    game_store::GameStore,
    models::GameEntity,
    storage::{StorageError, StorageResult},
};

/// Game store keeping records in a concurrent map.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    games: Arc<DashMap<String, GameEntity>>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no record is stored.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    fn insert(&self, game: GameEntity) -> StorageResult<()> {
        match self.games.entry(game.code.clone()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists { code: game.code }),
            Entry::Vacant(slot) => {
                slot.insert(game);
                Ok(())
            }
        }
    }

    fn replace(&self, game: GameEntity, expected_version: u64) -> StorageResult<()> {
        // The entry guard holds the shard lock, so check and write are atomic.
        match self.games.entry(game.code.clone()) {
            Entry::Occupied(mut slot) if slot.get().version == expected_version => {
                slot.insert(game);
                Ok(())
            }
            _ => Err(StorageError::VersionConflict {
                code: game.code,
                expected: expected_version,
            }),
        }
    }
}

impl GameStore for MemoryGameStore {
    fn find_game(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let found = self.games.get(&code).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.insert(game);
        Box::pin(async move { result })
    }

    fn replace_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.replace(game, expected_version);
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
