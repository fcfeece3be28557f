use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::state::game::GameRecord;

/// Per-game broadcast hubs carrying the latest record snapshot after each write.
pub struct ChangeHubs {
    hubs: DashMap<String, broadcast::Sender<GameRecord>>,
    capacity: usize,
}

impl ChangeHubs {
    /// Hubs whose channels buffer up to `capacity` snapshots per game.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Register a subscriber for `code`, creating its hub on first use.
    pub fn subscribe(&self, code: &str) -> broadcast::Receiver<GameRecord> {
        self.hubs
            .entry(code.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send a snapshot to every subscriber of its game. Hubs nobody listens to are dropped.
    pub fn publish(&self, record: &GameRecord) {
        let Some(sender) = self.hubs.get(&record.code).map(|hub| hub.clone()) else {
            return;
        };

        if sender.send(record.clone()).is_err() {
            self.hubs
                .remove_if(&record.code, |_, hub| hub.receiver_count() == 0);
        }
    }

    /// Drop the hub of `code` once its last subscriber is gone.
    pub fn release(&self, code: &str) {
        self.hubs
            .remove_if(code, |_, hub| hub.receiver_count() == 0);
    }

    /// Number of games with a live hub.
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    /// Whether no hub is live.
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{generator::default_word_pairs, state_machine::create_game};
    use rand::{SeedableRng, rngs::StdRng};

    fn record() -> GameRecord {
        let mut rng = StdRng::seed_from_u64(1);
        create_game("Host", 4, 1, &default_word_pairs(), &mut rng).unwrap()
    }

    #[tokio::test]
    async fn subscribers_receive_snapshots_of_their_game() {
        let hubs = ChangeHubs::new(4);
        let record = record();
        let mut rx = hubs.subscribe(&record.code);

        hubs.publish(&record);
        assert_eq!(rx.recv().await.unwrap(), record);
    }

    #[test]
    fn hubs_without_receivers_are_pruned() {
        let hubs = ChangeHubs::new(4);
        let record = record();
        drop(hubs.subscribe(&record.code));
        assert_eq!(hubs.len(), 1);

        hubs.publish(&record);
        assert!(hubs.is_empty());
    }

    #[test]
    fn release_keeps_hubs_with_subscribers() {
        let hubs = ChangeHubs::new(4);
        let record = record();
        let first = hubs.subscribe(&record.code);
        let second = hubs.subscribe(&record.code);

        drop(first);
        hubs.release(&record.code);
        assert_eq!(hubs.len(), 1);

        drop(second);
        hubs.release(&record.code);
        assert!(hubs.is_empty());
    }
}
