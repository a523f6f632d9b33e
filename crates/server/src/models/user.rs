use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_online: bool,
    pub last_seen: Option<String>,
    /// User ids this user has blocked.
    #[sqlx(json)]
    pub blocked: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Presence snapshot exposed to other users.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    pub id: String,
    pub username: String,
    pub is_online: bool,
    pub last_seen: Option<String>,
}

impl From<User> for UserPresence {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_online: user.is_online,
            last_seen: user.last_seen,
        }
    }
}
