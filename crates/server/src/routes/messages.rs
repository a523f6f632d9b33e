use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ChatError;
use crate::messages;
use crate::models::{AuthUser, EditMessageRequest, ReactionRequest, SendMessageRequest};
use crate::AppState;

#[derive(Deserialize)]
pub struct MessageQuery {
    pub before: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/chats/:chatId/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, ChatError> {
    let page = messages::list_messages(
        &state,
        &chat_id,
        &user,
        query.before.as_deref(),
        query.limit,
    )
    .await?;
    Ok(Json(page))
}

/// POST /api/chats/:chatId/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let message = messages::send(&state, &chat_id, &user, body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PATCH /api/messages/:messageId
pub async fn edit_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    Json(body): Json<EditMessageRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let message = messages::edit(&state, &message_id, &user, body.content).await?;
    Ok(Json(message))
}

/// DELETE /api/messages/:messageId
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, ChatError> {
    let message = messages::soft_delete(&state, &message_id, &user).await?;
    Ok(Json(message))
}

/// PUT /api/messages/:messageId/reactions
pub async fn add_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    Json(body): Json<ReactionRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let message = messages::add_reaction(&state, &message_id, &user, body.emoji).await?;
    Ok(Json(message))
}

/// DELETE /api/messages/:messageId/reactions/:emoji
pub async fn remove_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((message_id, emoji)): Path<(String, String)>,
) -> Result<impl IntoResponse, ChatError> {
    let message = messages::remove_reaction(&state, &message_id, &user, &emoji).await?;
    Ok(Json(message))
}

/// POST /api/messages/:messageId/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, ChatError> {
    let message = messages::mark_read(&state, &message_id, &user).await?;
    Ok(Json(message))
}
