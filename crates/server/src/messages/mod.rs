//! Message lifecycle: send, edit, reactions, read tracking, soft delete,
//! listing. Every mutation runs under the owning chat's lock and broadcasts
//! its event before releasing it, so clients observe per-chat events in
//! mutation order and never before the state change is persisted.

use ripple_shared::constants::{
    DELETED_MESSAGE_PLACEHOLDER, MAX_MESSAGE_PAGE_SIZE, MESSAGE_PAGE_SIZE,
};
use ripple_shared::validation::{validate_emoji, validate_message_content};

use crate::error::ChatError;
use crate::models::{
    AuthUser, Chat, DeliveryStatus, EditEntry, Message, MessageType, PaginatedResponse, Reaction,
    ReadReceipt, SendMessageRequest,
};
use crate::store;
use crate::ws::events::ServerEvent;
use crate::AppState;

fn require_member(chat: &Chat, user_id: &str) -> Result<(), ChatError> {
    if chat.is_member(user_id) {
        Ok(())
    } else {
        Err(ChatError::PermissionDenied)
    }
}

/// The payload a message must carry, by convention of its type.
fn check_payload(req: &SendMessageRequest, message_type: MessageType) -> Result<(), ChatError> {
    match message_type {
        MessageType::Text => {
            let content = req.content.as_deref().unwrap_or_default();
            validate_message_content(content).map_err(ChatError::Validation)?;
        }
        MessageType::Location => {
            if req.location.is_none() {
                return Err(ChatError::Validation("Location payload is required".into()));
            }
        }
        MessageType::Contact => {
            if req.contact.is_none() {
                return Err(ChatError::Validation("Contact payload is required".into()));
            }
        }
        // Every remaining type carries its payload in `media`.
        _ => {
            if req.media.is_none() {
                return Err(ChatError::Validation("Media payload is required".into()));
            }
        }
    }
    Ok(())
}

pub async fn send(
    state: &AppState,
    chat_id: &str,
    sender: &AuthUser,
    req: SendMessageRequest,
) -> Result<Message, ChatError> {
    let _guard = state.locks.acquire(chat_id).await;

    let chat = store::chats::get(&state.db, chat_id).await?;
    require_member(&chat, &sender.id)?;

    let message_type = req.message_type.unwrap_or(MessageType::Text);
    check_payload(&req, message_type)?;

    if let Some(reply_to) = &req.reply_to {
        let target = store::messages::find_by_id(&state.db, reply_to).await?;
        match target {
            Some(t) if t.chat_id == chat_id && !t.is_deleted => {}
            _ => return Err(ChatError::InvalidReply),
        }
    }

    let now = chrono::Utc::now().to_rfc3339();
    let message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id: chat_id.to_string(),
        sender_id: sender.id.clone(),
        content: req.content.unwrap_or_default(),
        message_type,
        media: req.media,
        location: req.location,
        contact: req.contact,
        reply_to: req.reply_to,
        reactions: Vec::new(),
        edit_history: Vec::new(),
        is_edited: false,
        is_deleted: false,
        deleted_at: None,
        delivery_status: DeliveryStatus::sent_at(now.clone()),
        read_by: Vec::new(),
        metadata: req.metadata.unwrap_or_default(),
        created_at: now.clone(),
    };

    store::messages::insert(&state.db, &message).await?;

    // Durability over strict atomicity: the message stands even if the chat
    // touch fails, leaving last_activity eventually consistent.
    if let Err(e) =
        store::chats::touch_last_message(&state.db, chat_id, &message.id, &now).await
    {
        tracing::warn!("failed to update chat {} after send: {}", chat_id, e);
    }

    state
        .gateway
        .broadcast_chat(
            chat_id,
            &ServerEvent::MessageNew {
                message: message.clone(),
            },
            None,
        )
        .await;

    Ok(message)
}

pub async fn edit(
    state: &AppState,
    message_id: &str,
    actor: &AuthUser,
    new_content: String,
) -> Result<Message, ChatError> {
    let found = store::messages::get(&state.db, message_id).await?;
    let _guard = state.locks.acquire(&found.chat_id).await;
    let mut message = store::messages::get(&state.db, message_id).await?;

    // Editing is sender-only; moderators delete, they don't rewrite.
    if message.sender_id != actor.id {
        return Err(ChatError::PermissionDenied);
    }
    if message.is_deleted {
        return Err(ChatError::AlreadyDeleted);
    }
    validate_message_content(&new_content).map_err(ChatError::Validation)?;

    if new_content == message.content {
        return Ok(message);
    }

    let now = chrono::Utc::now().to_rfc3339();
    message.edit_history.push(EditEntry {
        content: std::mem::replace(&mut message.content, new_content),
        edited_at: now,
    });
    message.is_edited = true;

    store::messages::update_content(
        &state.db,
        message_id,
        &message.content,
        &message.edit_history,
    )
    .await?;

    state
        .gateway
        .broadcast_chat(
            &message.chat_id,
            &ServerEvent::MessageEdited {
                message: message.clone(),
            },
            None,
        )
        .await;

    Ok(message)
}

/// Upsert of the (user, emoji) pair: a repeated add refreshes the timestamp,
/// the list never holds duplicates.
pub async fn add_reaction(
    state: &AppState,
    message_id: &str,
    actor: &AuthUser,
    emoji: String,
) -> Result<Message, ChatError> {
    validate_emoji(&emoji).map_err(ChatError::Validation)?;

    let found = store::messages::get(&state.db, message_id).await?;
    let _guard = state.locks.acquire(&found.chat_id).await;
    let mut message = store::messages::get(&state.db, message_id).await?;

    let chat = store::chats::get(&state.db, &message.chat_id).await?;
    require_member(&chat, &actor.id)?;

    message
        .reactions
        .retain(|r| !(r.user_id == actor.id && r.emoji == emoji));
    message.reactions.push(Reaction {
        user_id: actor.id.clone(),
        emoji,
        created_at: chrono::Utc::now().to_rfc3339(),
    });

    store::messages::update_reactions(&state.db, message_id, &message.reactions).await?;
    broadcast_reactions(state, &message).await;

    Ok(message)
}

pub async fn remove_reaction(
    state: &AppState,
    message_id: &str,
    actor: &AuthUser,
    emoji: &str,
) -> Result<Message, ChatError> {
    let found = store::messages::get(&state.db, message_id).await?;
    let _guard = state.locks.acquire(&found.chat_id).await;
    let mut message = store::messages::get(&state.db, message_id).await?;

    let chat = store::chats::get(&state.db, &message.chat_id).await?;
    require_member(&chat, &actor.id)?;

    let before = message.reactions.len();
    message
        .reactions
        .retain(|r| !(r.user_id == actor.id && r.emoji == emoji));
    if message.reactions.len() == before {
        return Ok(message);
    }

    store::messages::update_reactions(&state.db, message_id, &message.reactions).await?;
    broadcast_reactions(state, &message).await;

    Ok(message)
}

async fn broadcast_reactions(state: &AppState, message: &Message) {
    state
        .gateway
        .broadcast_chat(
            &message.chat_id,
            &ServerEvent::ReactionChanged {
                message_id: message.id.clone(),
                chat_id: message.chat_id.clone(),
                reactions: message.reactions.clone(),
            },
            None,
        )
        .await;
}

/// Record a read receipt. Re-marking is a no-op; the aggregate
/// `deliveryStatus.read` is set by the first reader other than the sender
/// and never changes afterwards.
pub async fn mark_read(
    state: &AppState,
    message_id: &str,
    actor: &AuthUser,
) -> Result<Message, ChatError> {
    let found = store::messages::get(&state.db, message_id).await?;
    let _guard = state.locks.acquire(&found.chat_id).await;
    let mut message = store::messages::get(&state.db, message_id).await?;

    let chat = store::chats::get(&state.db, &message.chat_id).await?;
    require_member(&chat, &actor.id)?;

    if message.read_by.iter().any(|r| r.user_id == actor.id) {
        return Ok(message);
    }

    let now = chrono::Utc::now().to_rfc3339();
    message.read_by.push(ReadReceipt {
        user_id: actor.id.clone(),
        read_at: now.clone(),
    });
    if message.delivery_status.read.is_none() && actor.id != message.sender_id {
        message.delivery_status.read = Some(now);
    }

    store::messages::update_read_state(
        &state.db,
        message_id,
        &message.read_by,
        &message.delivery_status,
    )
    .await?;

    Ok(message)
}

/// Soft delete: the row stays, the content reads as the placeholder, and any
/// media/location/contact payloads are treated as inaccessible by consumers.
pub async fn soft_delete(
    state: &AppState,
    message_id: &str,
    actor: &AuthUser,
) -> Result<Message, ChatError> {
    let found = store::messages::get(&state.db, message_id).await?;
    let _guard = state.locks.acquire(&found.chat_id).await;
    let mut message = store::messages::get(&state.db, message_id).await?;

    if message.is_deleted {
        return Err(ChatError::AlreadyDeleted);
    }

    let chat = store::chats::get(&state.db, &message.chat_id).await?;
    let is_sender = message.sender_id == actor.id;
    let can_moderate = chat.role_of(&actor.id).is_some_and(|r| r.can_manage());
    if !is_sender && !can_moderate {
        return Err(ChatError::PermissionDenied);
    }

    let now = chrono::Utc::now().to_rfc3339();
    message.is_deleted = true;
    message.deleted_at = Some(now.clone());
    message.content = DELETED_MESSAGE_PLACEHOLDER.to_string();

    store::messages::mark_deleted(&state.db, message_id, DELETED_MESSAGE_PLACEHOLDER, &now)
        .await?;

    state
        .gateway
        .broadcast_chat(
            &message.chat_id,
            &ServerEvent::MessageDeleted {
                message_id: message.id.clone(),
                chat_id: message.chat_id.clone(),
            },
            None,
        )
        .await;

    Ok(message)
}

/// One page of a chat's visible history. Fetched newest-first by `before`
/// cursor, returned oldest-first for rendering.
pub async fn list_messages(
    state: &AppState,
    chat_id: &str,
    requester: &AuthUser,
    before: Option<&str>,
    limit: Option<i64>,
) -> Result<PaginatedResponse<Message>, ChatError> {
    let chat = store::chats::get(&state.db, chat_id).await?;
    require_member(&chat, &requester.id)?;

    let limit = limit
        .unwrap_or(MESSAGE_PAGE_SIZE)
        .clamp(1, MAX_MESSAGE_PAGE_SIZE);

    let mut items = store::messages::list_page(&state.db, chat_id, before, limit + 1).await?;

    let has_more = items.len() as i64 > limit;
    if has_more {
        items.pop();
    }
    items.reverse(); // chronological order

    let cursor = items.first().map(|m| m.created_at.clone());

    Ok(PaginatedResponse {
        items,
        cursor,
        has_more,
    })
}
