use std::collections::HashMap;
use tokio::sync::RwLock;

/// Tracks per-user live connection counts. A user is online while at least
/// one connection is open, so the online state is the logical OR over all of
/// their sockets: only the 0→1 and 1→0 edges are reported back to callers,
/// which persist `is_online`/`last_seen` and broadcast the status change.
pub struct PresenceTracker {
    counts: RwLock<HashMap<String, usize>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            counts: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection. Returns true when the user just came online.
    pub async fn connect(&self, user_id: &str) -> bool {
        let mut counts = self.counts.write().await;
        let count = counts.entry(user_id.to_string()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Unregister a connection. Returns true when the user just went offline
    /// (their last connection closed).
    pub async fn disconnect(&self, user_id: &str) -> bool {
        let mut counts = self.counts.write().await;
        match counts.get_mut(user_id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                counts.remove(user_id);
                true
            }
            None => false,
        }
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.counts.read().await.contains_key(user_id)
    }

    pub async fn connection_count(&self, user_id: &str) -> usize {
        self.counts.read().await.get(user_id).copied().unwrap_or(0)
    }

    pub async fn online_user_ids(&self) -> Vec<String> {
        self.counts.read().await.keys().cloned().collect()
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
