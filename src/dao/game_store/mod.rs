#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::GameEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer holding one record per game code.
///
/// Writes are conditional: [`GameStore::replace_game`] only succeeds when the
/// stored record still carries `expected_version`, which lets callers retry a
/// read-modify-write instead of overwriting a concurrent update.
pub trait GameStore: Send + Sync {
    /// Fetch the record stored under `code`.
    fn find_game(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Store a brand-new record, failing with `AlreadyExists` when the code is taken.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a record if its stored version equals `expected_version`.
    fn replace_game(
        &self,
        game: GameEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
