use std::collections::BTreeMap;

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::dao::models::{GameEntity, GameStatusEntity, PlayerEntity};

/// MongoDB shape of a game record; `_id` is the join code and numeric
/// counters are stored as signed integers since BSON has no unsigned types.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    code: String,
    host: String,
    host_player_id: i64,
    player_count: i32,
    mafia_count: i32,
    players: Vec<MongoPlayerDocument>,
    normal_word: String,
    mafia_word: String,
    status: GameStatusEntity,
    created_at: DateTime,
    #[serde_as(as = "Option<BTreeMap<DisplayFromStr, _>>")]
    votes: Option<BTreeMap<u32, i64>>,
    #[serde(default)]
    voting_complete: bool,
    #[serde(default)]
    mafia_revealed: bool,
    #[serde(default)]
    next_player_id: i64,
    #[serde(default)]
    version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoPlayerDocument {
    id: i64,
    name: String,
    #[serde(default)]
    is_mafia: bool,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: i64::from(value.id),
            name: value.name,
            is_mafia: value.is_mafia,
        }
    }
}

impl From<MongoPlayerDocument> for PlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: clamp_u32(value.id),
            name: value.name,
            is_mafia: value.is_mafia,
        }
    }
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            code: value.code,
            host: value.host,
            host_player_id: i64::from(value.host_player_id),
            player_count: i32::from(value.player_count),
            mafia_count: i32::from(value.mafia_count),
            players: value.players.into_iter().map(Into::into).collect(),
            normal_word: value.normal_word,
            mafia_word: value.mafia_word,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            votes: value.votes.map(|votes| {
                votes
                    .into_iter()
                    .map(|(voter, target)| (voter, i64::from(target)))
                    .collect()
            }),
            voting_complete: value.voting_complete,
            mafia_revealed: value.mafia_revealed,
            next_player_id: i64::from(value.next_player_id),
            version: version_as_i64(value.version),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            code: value.code,
            host: value.host,
            host_player_id: clamp_u32(value.host_player_id),
            player_count: u8::try_from(value.player_count).unwrap_or(u8::MAX),
            mafia_count: u8::try_from(value.mafia_count).unwrap_or(u8::MAX),
            players: value.players.into_iter().map(Into::into).collect(),
            normal_word: value.normal_word,
            mafia_word: value.mafia_word,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            votes: value.votes.map(|votes| {
                votes
                    .into_iter()
                    .map(|(voter, target)| (voter, clamp_u32(target)))
                    .collect()
            }),
            voting_complete: value.voting_complete,
            mafia_revealed: value.mafia_revealed,
            next_player_id: clamp_u32(value.next_player_id),
            version: u64::try_from(value.version).unwrap_or_default(),
        }
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

pub fn version_as_i64(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

pub fn doc_id(code: &str) -> Document {
    doc! {"_id": code}
}

/// Filter matching the record only while it still carries `version`.
pub fn versioned_doc_id(code: &str, version: u64) -> Document {
    doc! {"_id": code, "version": version_as_i64(version)}
}
