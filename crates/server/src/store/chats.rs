use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::ChatError;
use crate::models::{Chat, Participant};

use super::with_timeout;

/// Insert a new chat. A unique-index violation on `direct_key` means a
/// concurrent create for the same pair won the race; the caller re-runs its
/// lookup on `StorageConflict` instead of surfacing the error.
pub async fn insert(pool: &SqlitePool, chat: &Chat) -> Result<(), ChatError> {
    let result = with_timeout(
        sqlx::query(
            r#"INSERT INTO chats
               (id, type, name, description, participants, direct_key,
                last_message_id, last_activity, is_archived, settings,
                created_by, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&chat.id)
        .bind(chat.chat_type)
        .bind(&chat.name)
        .bind(&chat.description)
        .bind(Json(&chat.participants))
        .bind(&chat.direct_key)
        .bind(&chat.last_message_id)
        .bind(&chat.last_activity)
        .bind(chat.is_archived)
        .bind(Json(&chat.settings))
        .bind(&chat.created_by)
        .bind(&chat.created_at)
        .execute(pool),
    )
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(ChatError::Storage(sqlx::Error::Database(e))) if e.is_unique_violation() => {
            Err(ChatError::StorageConflict)
        }
        Err(e) => Err(e),
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Chat>, ChatError> {
    with_timeout(
        sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = ?")
            .bind(id)
            .fetch_optional(pool),
    )
    .await
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Chat, ChatError> {
    find_by_id(pool, id)
        .await?
        .ok_or(ChatError::NotFound("chat"))
}

pub async fn find_by_direct_key(pool: &SqlitePool, key: &str) -> Result<Option<Chat>, ChatError> {
    with_timeout(
        sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE direct_key = ?")
            .bind(key)
            .fetch_optional(pool),
    )
    .await
}

/// Chats where the user is an active participant, most recent activity first.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Chat>, ChatError> {
    with_timeout(
        sqlx::query_as::<_, Chat>(
            r#"SELECT * FROM chats
               WHERE EXISTS (
                   SELECT 1 FROM json_each(chats.participants)
                   WHERE json_extract(json_each.value, '$.userId') = ?
                     AND json_extract(json_each.value, '$.hasLeft') = 0
               )
               ORDER BY last_activity DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool),
    )
    .await
}

pub async fn update_participants(
    pool: &SqlitePool,
    chat_id: &str,
    participants: &[Participant],
    last_activity: &str,
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query("UPDATE chats SET participants = ?, last_activity = ? WHERE id = ?")
            .bind(Json(participants))
            .bind(last_activity)
            .bind(chat_id)
            .execute(pool),
    )
    .await?;
    Ok(())
}

pub async fn update_info(
    pool: &SqlitePool,
    chat_id: &str,
    name: &str,
    description: &str,
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query("UPDATE chats SET name = ?, description = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(chat_id)
            .execute(pool),
    )
    .await?;
    Ok(())
}

pub async fn touch_last_message(
    pool: &SqlitePool,
    chat_id: &str,
    message_id: &str,
    last_activity: &str,
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query("UPDATE chats SET last_message_id = ?, last_activity = ? WHERE id = ?")
            .bind(message_id)
            .bind(last_activity)
            .bind(chat_id)
            .execute(pool),
    )
    .await?;
    Ok(())
}
