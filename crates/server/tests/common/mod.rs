use axum::Router;
use ripple_server::{config::Config, db, locks, presence, routes, ws, AppState};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    db::apply_schema(&pool).await.unwrap();

    pool
}

/// Build a test Axum app with the given pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    routes::build_router(test_state(pool))
}

pub fn test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState {
        db: pool,
        config: Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: ":memory:".into(),
        },
        gateway: Arc::new(ws::gateway::GatewayState::new()),
        presence: Arc::new(presence::PresenceTracker::new()),
        locks: locks::ChatLocks::new(),
    })
}

/// Create a test user with a valid session. Returns (user_id, session_token).
pub async fn create_test_user(pool: &SqlitePool, email: &str, username: &str) -> (String, String) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO users (id, username, email, is_online, last_seen, blocked, created_at, updated_at)
           VALUES (?, ?, ?, 0, NULL, '[]', ?, ?)"#,
    )
    .bind(&user_id)
    .bind(username)
    .bind(email)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    let session_token = uuid::Uuid::new_v4().to_string();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();

    sqlx::query(
        r#"INSERT INTO sessions (id, user_id, token, expires_at, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user_id)
    .bind(&session_token)
    .bind(&expires_at)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, session_token)
}

/// Mark `blocked_id` as blocked by `user_id`.
pub async fn block_user(pool: &SqlitePool, user_id: &str, blocked_id: &str) {
    sqlx::query("UPDATE users SET blocked = ? WHERE id = ?")
        .bind(serde_json::json!([blocked_id]).to_string())
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Create a group chat directly in the database. The creator is the admin,
/// everyone else a member.
pub async fn create_group_chat(
    pool: &SqlitePool,
    creator_id: &str,
    member_ids: &[&str],
    name: &str,
) -> String {
    let chat_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut participants = vec![participant_json(creator_id, "admin", &now)];
    for id in member_ids {
        participants.push(participant_json(id, "member", &now));
    }

    sqlx::query(
        r#"INSERT INTO chats
           (id, type, name, description, participants, direct_key, last_activity,
            is_archived, settings, created_by, created_at)
           VALUES (?, 'group', ?, '', ?, NULL, ?, 0, ?, ?, ?)"#,
    )
    .bind(&chat_id)
    .bind(name)
    .bind(serde_json::Value::Array(participants).to_string())
    .bind(&now)
    .bind(default_settings_json())
    .bind(creator_id)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    chat_id
}

fn participant_json(user_id: &str, role: &str, joined_at: &str) -> serde_json::Value {
    serde_json::json!({
        "userId": user_id,
        "role": role,
        "joinedAt": joined_at,
        "hasLeft": false,
        "isActive": true,
    })
}

pub fn default_settings_json() -> String {
    serde_json::json!({
        "allowMembersToAddOthers": false,
        "allowMembersToEditGroupInfo": false,
        "messageRetentionDays": 0,
    })
    .to_string()
}
