use serde::{Deserialize, Serialize};

use crate::models::{Message, Participant, Reaction, SendMessageRequest};

// ── Client → Server Events ──

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Subscribe {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    Unsubscribe {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    // The payload nests under `message` so its `type` field (text, image, …)
    // never collides with the event tag.
    SendMessage {
        #[serde(rename = "chatId")]
        chat_id: String,
        message: SendMessageRequest,
    },
    EditMessage {
        #[serde(rename = "messageId")]
        message_id: String,
        content: String,
    },
    DeleteMessage {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    AddReaction {
        #[serde(rename = "messageId")]
        message_id: String,
        emoji: String,
    },
    RemoveReaction {
        #[serde(rename = "messageId")]
        message_id: String,
        emoji: String,
    },
    MarkRead {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    TypingStart {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    TypingStop {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    Ping,
}

// ── Server → Client Events ──

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "message:new")]
    MessageNew { message: Message },
    #[serde(rename = "message:edited")]
    MessageEdited { message: Message },
    #[serde(rename = "message:deleted")]
    MessageDeleted {
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    #[serde(rename = "message:reaction_changed")]
    ReactionChanged {
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "chatId")]
        chat_id: String,
        reactions: Vec<Reaction>,
    },
    #[serde(rename = "chat:participant_added")]
    ParticipantAdded {
        #[serde(rename = "chatId")]
        chat_id: String,
        participants: Vec<Participant>,
    },
    #[serde(rename = "chat:participant_left")]
    ParticipantLeft {
        #[serde(rename = "chatId")]
        chat_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "user:status_changed")]
    StatusChanged {
        #[serde(rename = "userId")]
        user_id: String,
        status: String, // "online" | "offline"
        #[serde(rename = "lastSeen")]
        last_seen: String,
    },
    #[serde(rename = "typing:start")]
    TypingStart {
        #[serde(rename = "chatId")]
        chat_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "typing:stop")]
    TypingStop {
        #[serde(rename = "chatId")]
        chat_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "pong")]
    Pong,
}
