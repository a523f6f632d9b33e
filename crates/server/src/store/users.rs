use sqlx::SqlitePool;

use crate::error::ChatError;
use crate::models::User;

use super::with_timeout;

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, ChatError> {
    with_timeout(
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool),
    )
    .await
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<User, ChatError> {
    find_by_id(pool, id)
        .await?
        .ok_or(ChatError::NotFound("user"))
}

/// The subset of `ids` that resolves to an existing user.
pub async fn find_existing(pool: &SqlitePool, ids: &[String]) -> Result<Vec<String>, ChatError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders: Vec<String> = ids.iter().map(|_| "?".to_string()).collect();
    let sql = format!(
        "SELECT id FROM users WHERE id IN ({})",
        placeholders.join(",")
    );

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for id in ids {
        query = query.bind(id);
    }

    with_timeout(query.fetch_all(pool)).await
}

pub async fn set_presence(
    pool: &SqlitePool,
    id: &str,
    is_online: bool,
    last_seen: &str,
) -> Result<(), ChatError> {
    with_timeout(
        sqlx::query("UPDATE users SET is_online = ?, last_seen = ?, updated_at = ? WHERE id = ?")
            .bind(is_online)
            .bind(last_seen)
            .bind(last_seen)
            .bind(id)
            .execute(pool),
    )
    .await?;
    Ok(())
}
