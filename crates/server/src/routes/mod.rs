pub mod chats;
pub mod messages;
pub mod users;

use crate::ws;
use crate::AppState;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Chats
        .route("/chats", post(chats::create_chat))
        .route("/chats", get(chats::list_chats))
        .route("/chats/{chatId}", get(chats::get_chat))
        .route("/chats/{chatId}", patch(chats::update_chat))
        .route("/chats/{chatId}/participants", post(chats::add_participants))
        .route(
            "/chats/{chatId}/participants/me",
            delete(chats::leave_chat),
        )
        // Messages
        .route("/chats/{chatId}/messages", get(messages::list_messages))
        .route("/chats/{chatId}/messages", post(messages::send_message))
        .route("/messages/{messageId}", patch(messages::edit_message))
        .route("/messages/{messageId}", delete(messages::delete_message))
        .route(
            "/messages/{messageId}/reactions",
            put(messages::add_reaction),
        )
        .route(
            "/messages/{messageId}/reactions/{emoji}",
            delete(messages::remove_reaction),
        )
        .route("/messages/{messageId}/read", post(messages::mark_read))
        // Users
        .route("/users/me", get(users::get_me))
        .route("/users/{userId}", get(users::get_user));

    Router::new()
        .nest("/api", api_routes)
        .route("/gateway", get(ws::handler::ws_handler))
        .with_state(state)
}
