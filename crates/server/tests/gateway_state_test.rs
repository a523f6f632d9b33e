use ripple_server::locks::ChatLocks;
use ripple_server::presence::PresenceTracker;
use ripple_server::ws::events::ServerEvent;
use ripple_server::ws::gateway::GatewayState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

fn make_tx() -> (mpsc::UnboundedSender<String>, mpsc::UnboundedReceiver<String>) {
    mpsc::unbounded_channel()
}

fn error_event(message: &str) -> ServerEvent {
    ServerEvent::Error {
        message: message.into(),
    }
}

#[tokio::test]
async fn broadcast_reaches_all_room_subscribers() {
    let gw = GatewayState::new();
    let (tx1, mut rx1) = make_tx();
    let (tx2, mut rx2) = make_tx();

    let cid1 = gw.next_client_id().await;
    let cid2 = gw.next_client_id().await;
    gw.register(cid1, "u1".into(), "alice".into(), tx1).await;
    gw.register(cid2, "u2".into(), "bob".into(), tx2).await;

    gw.subscribe_chat(cid1, "c1").await;
    gw.subscribe_chat(cid2, "c1").await;

    gw.broadcast_chat("c1", &error_event("hello"), None).await;

    assert!(rx1.try_recv().is_ok());
    assert!(rx2.try_recv().is_ok());
}

#[tokio::test]
async fn broadcast_respects_exclusion() {
    let gw = GatewayState::new();
    let (tx1, mut rx1) = make_tx();
    let (tx2, mut rx2) = make_tx();

    let cid1 = gw.next_client_id().await;
    let cid2 = gw.next_client_id().await;
    gw.register(cid1, "u1".into(), "alice".into(), tx1).await;
    gw.register(cid2, "u2".into(), "bob".into(), tx2).await;

    gw.subscribe_chat(cid1, "c1").await;
    gw.subscribe_chat(cid2, "c1").await;

    gw.broadcast_chat("c1", &error_event("no echo"), Some(cid1))
        .await;

    assert!(rx1.try_recv().is_err());
    assert!(rx2.try_recv().is_ok());
}

#[tokio::test]
async fn broadcast_skips_other_rooms() {
    let gw = GatewayState::new();
    let (tx1, mut rx1) = make_tx();
    let (tx2, mut rx2) = make_tx();

    let cid1 = gw.next_client_id().await;
    let cid2 = gw.next_client_id().await;
    gw.register(cid1, "u1".into(), "alice".into(), tx1).await;
    gw.register(cid2, "u2".into(), "bob".into(), tx2).await;

    gw.subscribe_chat(cid1, "c1").await;
    gw.subscribe_chat(cid2, "c2").await;

    gw.broadcast_chat("c1", &error_event("c1 only"), None).await;

    assert!(rx1.try_recv().is_ok());
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn dead_subscriber_does_not_block_the_rest() {
    let gw = GatewayState::new();
    let (tx1, rx1) = make_tx();
    let (tx2, mut rx2) = make_tx();

    let cid1 = gw.next_client_id().await;
    let cid2 = gw.next_client_id().await;
    gw.register(cid1, "u1".into(), "alice".into(), tx1).await;
    gw.register(cid2, "u2".into(), "bob".into(), tx2).await;

    gw.subscribe_chat(cid1, "c1").await;
    gw.subscribe_chat(cid2, "c1").await;

    // Simulate a dead socket: the receiving half is gone
    drop(rx1);

    gw.broadcast_chat("c1", &error_event("still flows"), None)
        .await;
    assert!(rx2.try_recv().is_ok());
}

#[tokio::test]
async fn unregister_cleans_all_subscriptions() {
    let gw = GatewayState::new();
    let (tx, mut rx) = make_tx();

    let cid = gw.next_client_id().await;
    gw.register(cid, "u1".into(), "alice".into(), tx).await;
    gw.subscribe_chat(cid, "c1").await;
    gw.subscribe_chat(cid, "c2").await;

    let removed = gw.unregister(cid).await;
    assert!(removed.is_some());

    gw.broadcast_chat("c1", &error_event("gone"), None).await;
    gw.broadcast_chat("c2", &error_event("gone"), None).await;
    assert!(rx.try_recv().is_err());
    assert!(!gw.is_subscribed(cid, "c1").await);
}

#[tokio::test]
async fn unsubscribe_is_noop_when_absent() {
    let gw = GatewayState::new();
    let (tx, _rx) = make_tx();

    let cid = gw.next_client_id().await;
    gw.register(cid, "u1".into(), "alice".into(), tx).await;

    // Never subscribed; must not panic or corrupt state
    gw.unsubscribe_chat(cid, "c1").await;
    assert!(!gw.is_subscribed(cid, "c1").await);
}

#[tokio::test]
async fn send_to_user_hits_every_connection() {
    let gw = GatewayState::new();
    let (tx1, mut rx1) = make_tx();
    let (tx2, mut rx2) = make_tx();
    let (tx3, mut rx3) = make_tx();

    let cid1 = gw.next_client_id().await;
    let cid2 = gw.next_client_id().await;
    let cid3 = gw.next_client_id().await;
    gw.register(cid1, "u1".into(), "alice".into(), tx1).await;
    gw.register(cid2, "u1".into(), "alice".into(), tx2).await;
    gw.register(cid3, "u2".into(), "bob".into(), tx3).await;

    gw.send_to_user("u1", &error_event("direct")).await;

    assert!(rx1.try_recv().is_ok());
    assert!(rx2.try_recv().is_ok());
    assert!(rx3.try_recv().is_err());
}

#[tokio::test]
async fn presence_flips_only_on_edges() {
    let presence = PresenceTracker::new();

    assert!(presence.connect("u1").await); // 0 -> 1: online
    assert!(!presence.connect("u1").await); // second socket, no transition
    assert_eq!(presence.connection_count("u1").await, 2);
    assert!(presence.is_online("u1").await);

    assert!(!presence.disconnect("u1").await); // 2 -> 1: still online
    assert!(presence.is_online("u1").await);
    assert!(presence.disconnect("u1").await); // 1 -> 0: offline
    assert!(!presence.is_online("u1").await);

    // Spurious disconnects are harmless
    assert!(!presence.disconnect("u1").await);
}

#[tokio::test]
async fn presence_tracks_users_independently() {
    let presence = PresenceTracker::new();

    presence.connect("u1").await;
    presence.connect("u2").await;

    let mut online = presence.online_user_ids().await;
    online.sort();
    assert_eq!(online, vec!["u1".to_string(), "u2".to_string()]);

    presence.disconnect("u1").await;
    assert_eq!(presence.online_user_ids().await, vec!["u2".to_string()]);
}

#[tokio::test]
async fn chat_locks_serialize_same_chat() {
    let locks = Arc::new(ChatLocks::new());
    let entered = Arc::new(AtomicBool::new(false));

    let guard = locks.acquire("c1").await;

    let locks2 = locks.clone();
    let entered2 = entered.clone();
    let waiter = tokio::spawn(async move {
        let _guard = locks2.acquire("c1").await;
        entered2.store(true, Ordering::SeqCst);
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!entered.load(Ordering::SeqCst), "second writer got in early");

    drop(guard);
    waiter.await.unwrap();
    assert!(entered.load(Ordering::SeqCst));
}

#[tokio::test]
async fn chat_locks_do_not_couple_chats() {
    let locks = ChatLocks::new();

    let _c1 = locks.acquire("c1").await;
    // Another chat's lock is immediately available
    let acquired = tokio::time::timeout(
        std::time::Duration::from_millis(100),
        locks.acquire("c2"),
    )
    .await;
    assert!(acquired.is_ok());
}
