use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::chats;
use crate::error::ChatError;
use crate::models::{AddParticipantsRequest, AuthUser, CreateChatRequest, UpdateChatRequest};
use crate::store;
use crate::AppState;

/// POST /api/chats
///
/// 201 for a newly created chat, 200 when an existing direct chat was
/// returned instead.
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateChatRequest>,
) -> Result<Response, ChatError> {
    let (chat, created) = chats::create_chat(&state, &user, body).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(chat)).into_response())
}

/// GET /api/chats
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ChatError> {
    let chats = store::chats::list_for_user(&state.db, &user.id).await?;
    Ok(Json(chats))
}

/// GET /api/chats/:chatId
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, ChatError> {
    let chat = store::chats::get(&state.db, &chat_id).await?;
    if !chat.is_member(&user.id) {
        return Err(ChatError::PermissionDenied);
    }
    Ok(Json(chat))
}

/// PATCH /api/chats/:chatId
pub async fn update_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    Json(body): Json<UpdateChatRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let chat =
        chats::update_group_info(&state, &chat_id, &user, body.name, body.description).await?;
    Ok(Json(chat))
}

/// POST /api/chats/:chatId/participants
pub async fn add_participants(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    Json(body): Json<AddParticipantsRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let (chat, added) =
        chats::add_participants(&state, &chat_id, &user, &body.participant_ids).await?;
    Ok(Json(serde_json::json!({ "added": added, "chat": chat })))
}

/// DELETE /api/chats/:chatId/participants/me
pub async fn leave_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, ChatError> {
    chats::leave_chat(&state, &chat_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
