//! Chat state machine: creation, participant lifecycle, permission checks.
//! Roster mutations run under the owning chat's lock and broadcast to the
//! chat's room before releasing it.

use std::collections::HashSet;

use ripple_shared::validation::{validate_chat_description, validate_chat_name};
use sqlx::SqlitePool;

use crate::error::ChatError;
use crate::models::{
    direct_key_for, AuthUser, Chat, ChatSettings, ChatType, CreateChatRequest, Participant, Role,
};
use crate::store;
use crate::ws::events::ServerEvent;
use crate::AppState;

/// Direct chats hold exactly two participant records, checked before every
/// persist of the roster.
fn check_direct_invariant(chat: &Chat) -> Result<(), ChatError> {
    if chat.chat_type == ChatType::Direct && chat.participants.len() != 2 {
        return Err(ChatError::InvalidParticipantCount);
    }
    Ok(())
}

/// Membership contract for callers holding only ids (authorization
/// middleware, gateway subscribe).
pub async fn is_member_by_id(
    pool: &SqlitePool,
    chat_id: &str,
    user_id: &str,
) -> Result<bool, ChatError> {
    Ok(store::chats::get(pool, chat_id).await?.is_member(user_id))
}

pub async fn role(
    pool: &SqlitePool,
    chat_id: &str,
    user_id: &str,
) -> Result<Option<Role>, ChatError> {
    Ok(store::chats::get(pool, chat_id).await?.role_of(user_id))
}

/// Create a chat. For direct chats the create is idempotent per unordered
/// pair: an existing chat is returned instead of a duplicate, and the
/// returned flag tells the caller whether a new chat was persisted (REST
/// picks 201 vs 200 off it).
pub async fn create_chat(
    state: &AppState,
    requester: &AuthUser,
    req: CreateChatRequest,
) -> Result<(Chat, bool), ChatError> {
    // Requester is always a participant; dedup preserving request order.
    let mut ids: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for id in std::iter::once(&requester.id).chain(req.participant_ids.iter()) {
        if seen.insert(id.clone()) {
            ids.push(id.clone());
        }
    }

    let existing = store::users::find_existing(&state.db, &ids).await?;
    if let Some(missing) = ids.iter().find(|id| !existing.contains(*id)) {
        return Err(ChatError::InvalidParticipant(missing.clone()));
    }

    match req.chat_type {
        ChatType::Direct => create_direct_chat(state, requester, ids).await,
        ChatType::Group => create_group_chat(state, requester, ids, req).await,
    }
}

async fn create_direct_chat(
    state: &AppState,
    requester: &AuthUser,
    ids: Vec<String>,
) -> Result<(Chat, bool), ChatError> {
    if ids.len() != 2 {
        return Err(ChatError::InvalidParticipantCount);
    }

    let requester_user = store::users::get(&state.db, &ids[0]).await?;
    let other_user = store::users::get(&state.db, &ids[1]).await?;
    if requester_user.blocked.contains(&other_user.id)
        || other_user.blocked.contains(&requester_user.id)
    {
        return Err(ChatError::PermissionDenied);
    }

    let key = direct_key_for(&ids[0], &ids[1]);
    if let Some(chat) = store::chats::find_by_direct_key(&state.db, &key).await? {
        let chat = reactivate_if_left(state, chat, &requester.id).await?;
        return Ok((chat, false));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let chat = Chat {
        id: uuid::Uuid::new_v4().to_string(),
        chat_type: ChatType::Direct,
        // Name and description are forced empty for direct chats.
        name: String::new(),
        description: String::new(),
        participants: ids
            .iter()
            .map(|id| Participant::new(id.clone(), Role::Member, now.clone()))
            .collect(),
        direct_key: Some(key.clone()),
        last_message_id: None,
        last_activity: now.clone(),
        is_archived: false,
        settings: ChatSettings::default(),
        created_by: requester.id.clone(),
        created_at: now,
    };
    check_direct_invariant(&chat)?;

    match store::chats::insert(&state.db, &chat).await {
        Ok(()) => Ok((chat, true)),
        Err(ChatError::StorageConflict) => {
            // Lost the lookup-then-create race; the winner's row is visible now.
            let chat = store::chats::find_by_direct_key(&state.db, &key)
                .await?
                .ok_or(ChatError::StorageConflict)?;
            let chat = reactivate_if_left(state, chat, &requester.id).await?;
            Ok((chat, false))
        }
        Err(e) => Err(e),
    }
}

/// Requesting a direct chat the requester previously left reopens it: the
/// pair key stays unique, the chat id stays stable, and the participant
/// record is reactivated in place.
async fn reactivate_if_left(
    state: &AppState,
    chat: Chat,
    user_id: &str,
) -> Result<Chat, ChatError> {
    let left = chat
        .participants
        .iter()
        .any(|p| p.user_id == user_id && p.has_left);
    if !left {
        return Ok(chat);
    }

    let _guard = state.locks.acquire(&chat.id).await;
    let mut chat = store::chats::get(&state.db, &chat.id).await?;
    let now = chrono::Utc::now().to_rfc3339();
    if let Some(p) = chat.participant_mut(user_id) {
        if p.has_left {
            p.joined_at = now.clone();
            p.left_at = None;
            p.has_left = false;
            p.is_active = true;
        }
    }
    check_direct_invariant(&chat)?;
    store::chats::update_participants(&state.db, &chat.id, &chat.participants, &now).await?;
    Ok(chat)
}

async fn create_group_chat(
    state: &AppState,
    requester: &AuthUser,
    ids: Vec<String>,
    req: CreateChatRequest,
) -> Result<(Chat, bool), ChatError> {
    let name = req.name.unwrap_or_default().trim().to_string();
    if !name.is_empty() {
        validate_chat_name(&name).map_err(ChatError::Validation)?;
    }
    let description = req.description.unwrap_or_default();
    validate_chat_description(&description).map_err(ChatError::Validation)?;

    let now = chrono::Utc::now().to_rfc3339();
    let chat = Chat {
        id: uuid::Uuid::new_v4().to_string(),
        chat_type: ChatType::Group,
        name,
        description,
        // Creator is the sole initial admin.
        participants: ids
            .iter()
            .map(|id| {
                let role = if id == &requester.id {
                    Role::Admin
                } else {
                    Role::Member
                };
                Participant::new(id.clone(), role, now.clone())
            })
            .collect(),
        direct_key: None,
        last_message_id: None,
        last_activity: now.clone(),
        is_archived: false,
        settings: ChatSettings::default(),
        created_by: requester.id.clone(),
        created_at: now,
    };

    store::chats::insert(&state.db, &chat).await?;
    Ok((chat, true))
}

/// Add (or reactivate) participants in a group chat. Returns the updated
/// chat and how many records were actually added or reactivated.
pub async fn add_participants(
    state: &AppState,
    chat_id: &str,
    actor: &AuthUser,
    new_ids: &[String],
) -> Result<(Chat, usize), ChatError> {
    let _guard = state.locks.acquire(chat_id).await;

    let mut chat = store::chats::get(&state.db, chat_id).await?;
    if chat.chat_type != ChatType::Group {
        return Err(ChatError::UnsupportedOperation);
    }

    let role = chat.role_of(&actor.id).ok_or(ChatError::PermissionDenied)?;
    if !role.can_manage() && !chat.settings.allow_members_to_add_others {
        return Err(ChatError::PermissionDenied);
    }

    let mut ids: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for id in new_ids {
        if seen.insert(id.clone()) {
            ids.push(id.clone());
        }
    }

    let existing = store::users::find_existing(&state.db, &ids).await?;
    if let Some(missing) = ids.iter().find(|id| !existing.contains(*id)) {
        return Err(ChatError::InvalidParticipant(missing.clone()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let mut changed: Vec<Participant> = Vec::new();
    for id in &ids {
        match chat.participant_mut(id) {
            Some(p) if p.has_left => {
                // Rejoining resets the record instead of duplicating it.
                p.joined_at = now.clone();
                p.left_at = None;
                p.has_left = false;
                p.is_active = true;
                changed.push(p.clone());
            }
            Some(_) => {}
            None => {
                let p = Participant::new(id.clone(), Role::Member, now.clone());
                chat.participants.push(p.clone());
                changed.push(p);
            }
        }
    }

    if changed.is_empty() {
        return Ok((chat, 0));
    }

    check_direct_invariant(&chat)?;
    store::chats::update_participants(&state.db, chat_id, &chat.participants, &now).await?;
    chat.last_activity = now;

    state
        .gateway
        .broadcast_chat(
            chat_id,
            &ServerEvent::ParticipantAdded {
                chat_id: chat_id.to_string(),
                participants: changed.clone(),
            },
            None,
        )
        .await;

    Ok((chat, changed.len()))
}

/// Leave a chat. Leaving twice is a no-op success; the participant record is
/// kept for history.
pub async fn leave_chat(
    state: &AppState,
    chat_id: &str,
    actor: &AuthUser,
) -> Result<Chat, ChatError> {
    let _guard = state.locks.acquire(chat_id).await;

    let mut chat = store::chats::get(&state.db, chat_id).await?;
    let now = chrono::Utc::now().to_rfc3339();

    let participant = chat
        .participant_mut(&actor.id)
        .ok_or(ChatError::PermissionDenied)?;
    if participant.has_left {
        return Ok(chat);
    }

    participant.has_left = true;
    participant.is_active = false;
    participant.left_at = Some(now.clone());

    check_direct_invariant(&chat)?;
    store::chats::update_participants(&state.db, chat_id, &chat.participants, &now).await?;
    chat.last_activity = now;

    state
        .gateway
        .broadcast_chat(
            chat_id,
            &ServerEvent::ParticipantLeft {
                chat_id: chat_id.to_string(),
                user_id: actor.id.clone(),
            },
            None,
        )
        .await;

    Ok(chat)
}

/// Update group name/description; only supplied fields are applied.
pub async fn update_group_info(
    state: &AppState,
    chat_id: &str,
    actor: &AuthUser,
    name: Option<String>,
    description: Option<String>,
) -> Result<Chat, ChatError> {
    let _guard = state.locks.acquire(chat_id).await;

    let mut chat = store::chats::get(&state.db, chat_id).await?;
    if chat.chat_type != ChatType::Group {
        return Err(ChatError::UnsupportedOperation);
    }

    let role = chat.role_of(&actor.id).ok_or(ChatError::PermissionDenied)?;
    if !role.can_manage() && !chat.settings.allow_members_to_edit_group_info {
        return Err(ChatError::PermissionDenied);
    }

    if let Some(name) = name {
        validate_chat_name(&name).map_err(ChatError::Validation)?;
        chat.name = name.trim().to_string();
    }
    if let Some(description) = description {
        validate_chat_description(&description).map_err(ChatError::Validation)?;
        chat.description = description;
    }

    store::chats::update_info(&state.db, chat_id, &chat.name, &chat.description).await?;

    Ok(chat)
}
