//! Replay-protection store collaborator.
//!
//! Consulted only from the final validation gate; an implementation may
//! block on I/O, so callers must not hold clear-text buffers locked across
//! the lookup. Persistence is the deployment's concern.

use std::collections::HashSet;
use std::sync::Mutex;

pub trait ReplayStore: Send + Sync {
    /// Returns whether `message_id` was seen before, recording it as seen.
    fn witness(&self, message_id: &str) -> bool;
}

/// Process-local store backed by a mutex-guarded set. The lock is held only
/// for the lookup itself.
#[derive(Debug, Default)]
pub struct MemoryReplayStore {
    seen: Mutex<HashSet<String>>,
}

impl MemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().expect("replay store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplayStore for MemoryReplayStore {
    fn witness(&self, message_id: &str) -> bool {
        let mut seen = self.seen.lock().expect("replay store lock");
        !seen.insert(message_id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_fresh_second_is_replay() {
        let store = MemoryReplayStore::new();
        assert!(!store.witness("6"));
        assert!(store.witness("6"));
        assert!(!store.witness("7"));
        assert_eq!(store.len(), 2);
    }
}
