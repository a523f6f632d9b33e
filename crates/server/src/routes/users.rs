use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::error::ChatError;
use crate::models::{AuthUser, UserPresence};
use crate::store;
use crate::AppState;

/// GET /api/users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ChatError> {
    let me = store::users::get(&state.db, &user.id).await?;
    Ok(Json(me))
}

/// GET /api/users/:userId
///
/// Presence snapshot; the live flag comes from the tracker, the persisted
/// last_seen from storage.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ChatError> {
    let user = store::users::get(&state.db, &user_id).await?;
    let mut presence = UserPresence::from(user);
    presence.is_online = state.presence.is_online(&presence.id).await;
    Ok(Json(presence))
}
