use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};

use crate::ws::events::ServerEvent;

pub type ClientId = u64;

pub struct ConnectedClient {
    pub user_id: String,
    pub username: String,
    pub tx: mpsc::UnboundedSender<String>,
    pub subscribed_chats: HashSet<String>,
}

/// Room subscriptions and connected clients. Mutated under its own locks so
/// connect/disconnect churn never serializes behind chat writes. Deliveries
/// are best-effort per connection: a dead socket's send fails silently and
/// never blocks the rest; its cleanup happens in the close path.
pub struct GatewayState {
    next_id: RwLock<u64>,
    pub clients: RwLock<HashMap<ClientId, ConnectedClient>>,
    pub chat_subs: RwLock<HashMap<String, HashSet<ClientId>>>,
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            next_id: RwLock::new(1),
            clients: RwLock::new(HashMap::new()),
            chat_subs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn next_client_id(&self) -> ClientId {
        let mut id = self.next_id.write().await;
        let current = *id;
        *id += 1;
        current
    }

    /// Register a new client connection
    pub async fn register(
        &self,
        client_id: ClientId,
        user_id: String,
        username: String,
        tx: mpsc::UnboundedSender<String>,
    ) {
        let client = ConnectedClient {
            user_id,
            username,
            tx,
            subscribed_chats: HashSet::new(),
        };
        self.clients.write().await.insert(client_id, client);
    }

    /// Unregister a client and clean up all of its room subscriptions
    pub async fn unregister(&self, client_id: ClientId) -> Option<ConnectedClient> {
        let client = self.clients.write().await.remove(&client_id)?;

        let mut subs = self.chat_subs.write().await;
        for chat_id in &client.subscribed_chats {
            if let Some(set) = subs.get_mut(chat_id) {
                set.remove(&client_id);
                if set.is_empty() {
                    subs.remove(chat_id);
                }
            }
        }

        Some(client)
    }

    /// Subscribe a client to a chat's room
    pub async fn subscribe_chat(&self, client_id: ClientId, chat_id: &str) {
        self.chat_subs
            .write()
            .await
            .entry(chat_id.to_string())
            .or_default()
            .insert(client_id);

        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            client.subscribed_chats.insert(chat_id.to_string());
        }
    }

    /// Unsubscribe a client from a chat's room; no-op if absent
    pub async fn unsubscribe_chat(&self, client_id: ClientId, chat_id: &str) {
        let mut subs = self.chat_subs.write().await;
        if let Some(set) = subs.get_mut(chat_id) {
            set.remove(&client_id);
            if set.is_empty() {
                subs.remove(chat_id);
            }
        }

        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            client.subscribed_chats.remove(chat_id);
        }
    }

    pub async fn is_subscribed(&self, client_id: ClientId, chat_id: &str) -> bool {
        self.clients
            .read()
            .await
            .get(&client_id)
            .map(|c| c.subscribed_chats.contains(chat_id))
            .unwrap_or(false)
    }

    /// Broadcast an event to every subscriber of a chat. Nobody is excluded
    /// unless the caller passes a connection to suppress (sender echo is the
    /// caller's choice).
    pub async fn broadcast_chat(
        &self,
        chat_id: &str,
        event: &ServerEvent,
        exclude: Option<ClientId>,
    ) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let subs = self.chat_subs.read().await;
        let clients = self.clients.read().await;

        if let Some(subscriber_ids) = subs.get(chat_id) {
            for &cid in subscriber_ids {
                if Some(cid) == exclude {
                    continue;
                }
                if let Some(client) = clients.get(&cid) {
                    let _ = client.tx.send(msg.clone());
                }
            }
        }
    }

    /// Broadcast an event to ALL connected clients
    pub async fn broadcast_all(&self, event: &ServerEvent, exclude: Option<ClientId>) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let clients = self.clients.read().await;
        for (&cid, client) in clients.iter() {
            if Some(cid) == exclude {
                continue;
            }
            let _ = client.tx.send(msg.clone());
        }
    }

    /// Send an event to a specific connection
    pub async fn send_to(&self, client_id: ClientId, event: &ServerEvent) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let clients = self.clients.read().await;
        if let Some(client) = clients.get(&client_id) {
            let _ = client.tx.send(msg);
        }
    }

    /// Send an event to every connection of a user
    pub async fn send_to_user(&self, user_id: &str, event: &ServerEvent) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let clients = self.clients.read().await;
        for client in clients.values() {
            if client.user_id == user_id {
                let _ = client.tx.send(msg.clone());
            }
        }
    }

}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}
