use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-chat mutation locks. Everything that mutates one chat's state
/// (messages, roster, group info) serializes on that chat's lock, and the
/// guard is held across the persist-then-broadcast sequence so per-chat event
/// order matches mutation order. Reads never take it, and no chat's lock
/// blocks another's.
pub struct ChatLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// One entry per chat touched since startup; the map lock is only held
    /// long enough to clone the Arc.
    pub async fn acquire(&self, chat_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

impl Default for ChatLocks {
    fn default() -> Self {
        Self::new()
    }
}
