use serde::{Deserialize, Serialize};

use crate::dao::models::GameEntity;

pub const GAME_PREFIX: &str = "game::";

/// CouchDB document wrapping a game entity with its revision metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameEntity,
}

impl CouchGameDocument {
    /// Wrap an entity, attaching the revision the write is based on.
    pub fn from_entity(game: GameEntity, rev: Option<String>) -> Self {
        Self {
            id: game_doc_id(&game.code),
            rev,
            game,
        }
    }

    pub fn into_entity(self) -> GameEntity {
        self.game
    }
}

pub fn game_doc_id(code: &str) -> String {
    format!("{GAME_PREFIX}{code}")
}
