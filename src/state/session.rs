use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::state::game::PlayerId;

/// Identity a client holds inside one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Player the client plays as.
    pub player_id: PlayerId,
    /// Game the player belongs to.
    pub game_code: String,
}

struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

/// Per-client identities keyed by an opaque token.
///
/// Entries untouched for longer than the idle timeout are evicted by
/// [`SessionRegistry::evict_idle`].
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh token.
    pub fn new_token() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Session attached to `token`, if any. Reading it counts as activity.
    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get_mut(token).map(|mut entry| {
            entry.last_seen = Instant::now();
            entry.session.clone()
        })
    }

    /// Attach a session to `token`, replacing the previous one.
    pub fn set(&self, token: &str, player_id: PlayerId, game_code: &str) {
        self.sessions.insert(
            token.to_owned(),
            SessionEntry {
                session: Session {
                    player_id,
                    game_code: game_code.to_owned(),
                },
                last_seen: Instant::now(),
            },
        );
    }

    /// Drop sessions idle for at least `max_idle`. Returns how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_seen.elapsed() < max_idle);
        before.saturating_sub(self.sessions.len())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Forget the session attached to `token`. Returns whether one existed.
    pub fn clear(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_session() {
        let registry = SessionRegistry::new();
        let token = SessionRegistry::new_token();
        assert_eq!(token.len(), 32);

        registry.set(&token, 1, "ABC234");
        registry.set(&token, 4, "XYZ789");
        assert_eq!(
            registry.get(&token),
            Some(Session {
                player_id: 4,
                game_code: "XYZ789".into()
            })
        );
    }

    #[test]
    fn clear_forgets_session() {
        let registry = SessionRegistry::new();
        registry.set("token", 2, "ABC234");
        assert!(registry.clear("token"));
        assert!(!registry.clear("token"));
        assert_eq!(registry.get("token"), None);
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        registry.set("kept", 1, "ABC234");
        registry.set("idle", 2, "ABC234");

        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.evict_idle(Duration::ZERO), 2);
        assert!(registry.is_empty());
    }
}
