use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::chats;
use crate::error::ChatError;
use crate::messages;
use crate::models::AuthUser;
use crate::store;
use crate::ws::events::{ClientEvent, ServerEvent};
use crate::ws::gateway::ClientId;
use crate::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    query: axum::extract::Query<std::collections::HashMap<String, String>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    // Extract session from query param, Authorization header, or cookie
    let auth_user = extract_session(&state, &headers, &query).await;

    ws.on_upgrade(move |socket| handle_socket(socket, state, auth_user))
}

async fn extract_session(
    state: &AppState,
    headers: &axum::http::HeaderMap,
    query: &std::collections::HashMap<String, String>,
) -> Option<AuthUser> {
    // 1. Try query param ?token=...
    let token_from_query = query.get("token").map(|t| t.to_string());

    // 2. Try Authorization: Bearer <token>
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    // 3. Try cookie
    let token_from_cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .filter_map(|c| {
            c.trim()
                .strip_prefix("ripple.session_token=")
                .map(|t| t.to_string())
        })
        .next();

    let token = token_from_query.or(auth_header).or(token_from_cookie)?;
    if token.is_empty() {
        return None;
    }

    let row = sqlx::query_as::<_, (String, String, String)>(
        r#"SELECT u.id, u.username, s.expires_at
           FROM sessions s
           JOIN users u ON u.id = s.user_id
           WHERE s.token = ?"#,
    )
    .bind(&token)
    .fetch_optional(&state.db)
    .await
    .ok()??;

    let now = chrono::Utc::now().to_rfc3339();
    if row.2 < now {
        return None;
    }

    Some(AuthUser {
        id: row.0,
        username: row.1,
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, auth_user: Option<AuthUser>) {
    let user = match auth_user {
        Some(u) => u,
        None => {
            // Can't authenticate — close connection
            return;
        }
    };

    let client_id = state.gateway.next_client_id().await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Create mpsc channel for sending messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Register client
    state
        .gateway
        .register(client_id, user.id.clone(), user.username.clone(), tx)
        .await;

    // First connection for this user flips them online; additional sockets
    // only bump the refcount.
    let now = chrono::Utc::now().to_rfc3339();
    if state.presence.connect(&user.id).await {
        if let Err(e) = store::users::set_presence(&state.db, &user.id, true, &now).await {
            tracing::warn!("failed to persist presence for {}: {}", user.id, e);
        }
        state
            .gateway
            .broadcast_all(
                &ServerEvent::StatusChanged {
                    user_id: user.id.clone(),
                    status: "online".into(),
                    last_seen: now.clone(),
                },
                None,
            )
            .await;
    }

    // Send currently-online users to the new client
    for uid in state.presence.online_user_ids().await {
        if uid != user.id {
            state
                .gateway
                .send_to(
                    client_id,
                    &ServerEvent::StatusChanged {
                        user_id: uid,
                        status: "online".into(),
                        last_seen: now.clone(),
                    },
                )
                .await;
        }
    }

    // Task to forward messages from mpsc to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive loop
    let state_clone = state.clone();
    let user_clone = user.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => {
                    let text_str: &str = &text;
                    if let Ok(event) = serde_json::from_str::<ClientEvent>(text_str) {
                        handle_client_event(&state_clone, client_id, &user_clone, event).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    // Clean up. This runs regardless of any in-flight mutation's outcome:
    // mutations complete in their own tasks and still broadcast to whoever
    // remains subscribed.
    state.gateway.unregister(client_id).await;

    let now = chrono::Utc::now().to_rfc3339();
    if state.presence.disconnect(&user.id).await {
        if let Err(e) = store::users::set_presence(&state.db, &user.id, false, &now).await {
            tracing::warn!("failed to persist presence for {}: {}", user.id, e);
        }
        state
            .gateway
            .broadcast_all(
                &ServerEvent::StatusChanged {
                    user_id: user.id.clone(),
                    status: "offline".into(),
                    last_seen: now,
                },
                None,
            )
            .await;
    }
}

async fn send_error(state: &AppState, client_id: ClientId, err: ChatError) {
    let message = match &err {
        ChatError::Storage(e) => {
            tracing::error!("storage error: {:?}", e);
            "Internal error".to_string()
        }
        other => other.to_string(),
    };
    state
        .gateway
        .send_to(client_id, &ServerEvent::Error { message })
        .await;
}

async fn handle_client_event(
    state: &Arc<AppState>,
    client_id: ClientId,
    user: &AuthUser,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Subscribe { chat_id } => {
            match chats::is_member_by_id(&state.db, &chat_id, &user.id).await {
                Ok(true) => state.gateway.subscribe_chat(client_id, &chat_id).await,
                Ok(false) => send_error(state, client_id, ChatError::PermissionDenied).await,
                Err(e) => send_error(state, client_id, e).await,
            }
        }
        ClientEvent::Unsubscribe { chat_id } => {
            state.gateway.unsubscribe_chat(client_id, &chat_id).await;
        }
        ClientEvent::SendMessage { chat_id, message } => {
            if let Err(e) = messages::send(state, &chat_id, user, message).await {
                send_error(state, client_id, e).await;
            }
        }
        ClientEvent::EditMessage {
            message_id,
            content,
        } => {
            if let Err(e) = messages::edit(state, &message_id, user, content).await {
                send_error(state, client_id, e).await;
            }
        }
        ClientEvent::DeleteMessage { message_id } => {
            if let Err(e) = messages::soft_delete(state, &message_id, user).await {
                send_error(state, client_id, e).await;
            }
        }
        ClientEvent::AddReaction { message_id, emoji } => {
            if let Err(e) = messages::add_reaction(state, &message_id, user, emoji).await {
                send_error(state, client_id, e).await;
            }
        }
        ClientEvent::RemoveReaction { message_id, emoji } => {
            if let Err(e) = messages::remove_reaction(state, &message_id, user, &emoji).await {
                send_error(state, client_id, e).await;
            }
        }
        ClientEvent::MarkRead { message_id } => {
            if let Err(e) = messages::mark_read(state, &message_id, user).await {
                send_error(state, client_id, e).await;
            }
        }
        // Typing is ephemeral: relayed to the room with the origin excluded,
        // never persisted. Being subscribed already implies membership.
        ClientEvent::TypingStart { chat_id } => {
            if state.gateway.is_subscribed(client_id, &chat_id).await {
                state
                    .gateway
                    .broadcast_chat(
                        &chat_id,
                        &ServerEvent::TypingStart {
                            chat_id: chat_id.clone(),
                            user_id: user.id.clone(),
                        },
                        Some(client_id),
                    )
                    .await;
            }
        }
        ClientEvent::TypingStop { chat_id } => {
            if state.gateway.is_subscribed(client_id, &chat_id).await {
                state
                    .gateway
                    .broadcast_chat(
                        &chat_id,
                        &ServerEvent::TypingStop {
                            chat_id: chat_id.clone(),
                            user_id: user.id.clone(),
                        },
                        Some(client_id),
                    )
                    .await;
            }
        }
        ClientEvent::Ping => {
            state.gateway.send_to(client_id, &ServerEvent::Pong).await;
        }
    }
}
