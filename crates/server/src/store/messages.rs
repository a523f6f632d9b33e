use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::ChatError;
use crate::models::{DeliveryStatus, EditEntry, Message, Reaction, ReadReceipt};

use super::with_timeout;

pub async fn insert(pool: &SqlitePool, message: &Message) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query(
            r#"INSERT INTO messages
               (id, chat_id, sender_id, content, type, media, location, contact,
                reply_to, reactions, edit_history, is_edited, is_deleted,
                deleted_at, delivery_status, read_by, metadata, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&message.id)
        .bind(&message.chat_id)
        .bind(&message.sender_id)
        .bind(&message.content)
        .bind(message.message_type)
        .bind(message.media.as_ref().map(Json))
        .bind(message.location.as_ref().map(Json))
        .bind(message.contact.as_ref().map(Json))
        .bind(&message.reply_to)
        .bind(Json(&message.reactions))
        .bind(Json(&message.edit_history))
        .bind(message.is_edited)
        .bind(message.is_deleted)
        .bind(&message.deleted_at)
        .bind(Json(&message.delivery_status))
        .bind(Json(&message.read_by))
        .bind(Json(&message.metadata))
        .bind(&message.created_at)
        .execute(pool),
    )
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Message>, ChatError> {
    with_timeout(
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(pool),
    )
    .await
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Message, ChatError> {
    find_by_id(pool, id)
        .await?
        .ok_or(ChatError::NotFound("message"))
}

pub async fn update_content(
    pool: &SqlitePool,
    id: &str,
    content: &str,
    edit_history: &[EditEntry],
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query(
            "UPDATE messages SET content = ?, edit_history = ?, is_edited = 1 WHERE id = ?",
        )
        .bind(content)
        .bind(Json(edit_history))
        .bind(id)
        .execute(pool),
    )
    .await?;
    Ok(())
}

pub async fn update_reactions(
    pool: &SqlitePool,
    id: &str,
    reactions: &[Reaction],
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query("UPDATE messages SET reactions = ? WHERE id = ?")
            .bind(Json(reactions))
            .bind(id)
            .execute(pool),
    )
    .await?;
    Ok(())
}

pub async fn update_read_state(
    pool: &SqlitePool,
    id: &str,
    read_by: &[ReadReceipt],
    delivery_status: &DeliveryStatus,
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query("UPDATE messages SET read_by = ?, delivery_status = ? WHERE id = ?")
            .bind(Json(read_by))
            .bind(Json(delivery_status))
            .bind(id)
            .execute(pool),
    )
    .await?;
    Ok(())
}

/// Soft delete: the row stays for referential integrity (reply threads), the
/// content is blanked to the placeholder.
pub async fn mark_deleted(
    pool: &SqlitePool,
    id: &str,
    placeholder: &str,
    deleted_at: &str,
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query(
            "UPDATE messages SET is_deleted = 1, deleted_at = ?, content = ? WHERE id = ?",
        )
        .bind(deleted_at)
        .bind(placeholder)
        .bind(id)
        .execute(pool),
    )
    .await?;
    Ok(())
}

/// One page of non-deleted messages, newest first.
pub async fn list_page(
    pool: &SqlitePool,
    chat_id: &str,
    before: Option<&str>,
    limit: i64,
) -> Result<Vec<Message>, ChatError> {
    if let Some(before) = before {
        with_timeout(
            sqlx::query_as::<_, Message>(
                r#"SELECT * FROM messages
                   WHERE chat_id = ? AND is_deleted = 0 AND created_at < ?
                   ORDER BY created_at DESC LIMIT ?"#,
            )
            .bind(chat_id)
            .bind(before)
            .bind(limit)
            .fetch_all(pool),
        )
        .await
    } else {
        with_timeout(
            sqlx::query_as::<_, Message>(
                r#"SELECT * FROM messages
                   WHERE chat_id = ? AND is_deleted = 0
                   ORDER BY created_at DESC LIMIT ?"#,
            )
            .bind(chat_id)
            .bind(limit)
            .fetch_all(pool),
        )
        .await
    }
}
