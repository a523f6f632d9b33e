use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ChatType {
    Direct,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Member,
}

impl Role {
    /// Privilege rank, higher wins. Kept explicit so role checks never
    /// degenerate into string comparisons.
    pub fn privilege(self) -> u8 {
        match self {
            Role::Admin => 2,
            Role::Moderator => 1,
            Role::Member => 0,
        }
    }

    /// Whether this role may manage the roster and group info.
    pub fn can_manage(self) -> bool {
        self.privilege() >= Role::Moderator.privilege()
    }
}

/// A user's membership record within a chat. Records are never removed:
/// leaving flips `has_left`/`is_active` so history stays intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: String,
    pub role: Role,
    pub joined_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_at: Option<String>,
    pub has_left: bool,
    pub is_active: bool,
}

impl Participant {
    pub fn new(user_id: String, role: Role, joined_at: String) -> Self {
        Self {
            user_id,
            role,
            joined_at,
            left_at: None,
            has_left: false,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub allow_members_to_add_others: bool,
    pub allow_members_to_edit_group_info: bool,
    /// 0 means messages are kept forever.
    pub message_retention_days: i64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            allow_members_to_add_others: false,
            allow_members_to_edit_group_info: false,
            message_retention_days: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub chat_type: ChatType,
    pub name: String,
    pub description: String,
    #[sqlx(json)]
    pub participants: Vec<Participant>,
    /// Sorted participant-pair key for direct chats; the unique index on it
    /// arbitrates concurrent create requests for the same pair.
    #[serde(skip)]
    pub direct_key: Option<String>,
    pub last_message_id: Option<String>,
    pub last_activity: String,
    pub is_archived: bool,
    #[sqlx(json)]
    pub settings: ChatSettings,
    pub created_by: String,
    pub created_at: String,
}

impl Chat {
    /// Membership predicate every message operation gates on: a participant
    /// record exists and has not left.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.participants
            .iter()
            .any(|p| p.user_id == user_id && !p.has_left)
    }

    /// Role of an active participant, `None` for outsiders and leavers.
    pub fn role_of(&self, user_id: &str) -> Option<Role> {
        self.participants
            .iter()
            .find(|p| p.user_id == user_id && !p.has_left)
            .map(|p| p.role)
    }

    pub fn participant_mut(&mut self, user_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    pub fn active_participant_count(&self) -> usize {
        self.participants.iter().filter(|p| !p.has_left).count()
    }
}

/// Sorted pair key for a two-user direct chat, identical for either request
/// order.
pub fn direct_key_for(a: &str, b: &str) -> String {
    if a < b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub participant_ids: Vec<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantsRequest {
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChatRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}
