pub const APP_NAME: &str = "Ripple";

// Limits
pub const MAX_MESSAGE_LENGTH: usize = 4000;
pub const MAX_CHAT_NAME_LENGTH: usize = 100;
pub const MAX_CHAT_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_EMOJI_LENGTH: usize = 32;
pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MIN_USERNAME_LENGTH: usize = 2;

pub const MESSAGE_PAGE_SIZE: i64 = 50;
pub const MAX_MESSAGE_PAGE_SIZE: i64 = 100;

/// Content a soft-deleted message reads as.
pub const DELETED_MESSAGE_PLACEHOLDER: &str = "This message was deleted";

// Storage
pub const STORAGE_TIMEOUT_MS: u64 = 5_000;

// WebSocket
pub const WS_HEARTBEAT_INTERVAL_MS: u64 = 30_000;
pub const WS_RECONNECT_BASE_DELAY_MS: u64 = 1_000;
pub const WS_RECONNECT_MAX_DELAY_MS: u64 = 30_000;
