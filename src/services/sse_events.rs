use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::GameSnapshot,
        sse::{ServerEvent, SystemStatus},
    },
    state::game::GameRecord,
};

const EVENT_GAME_UPDATED: &str = "game.updated";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Event carrying a full snapshot of the game.
pub fn game_updated(record: &GameRecord) -> Option<ServerEvent> {
    build_event(EVENT_GAME_UPDATED, &GameSnapshot::from(record))
}

/// Event announcing a degraded mode change.
pub fn system_status(degraded: bool) -> Option<ServerEvent> {
    build_event(EVENT_SYSTEM_STATUS, &SystemStatus { degraded })
}

fn build_event(event: &'static str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(event, payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_status_event_is_named() {
        let event = system_status(true).unwrap();
        assert_eq!(event.name, EVENT_SYSTEM_STATUS);
        assert_eq!(event.data, r#"{"degraded":true}"#);
    }
}
