use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Business-rule and storage failures surfaced by the chat core. The REST
/// layer maps these to status codes; the gateway maps them to `error` ack
/// frames. Only `Storage` represents an unexpected fault.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("unknown participant: {0}")]
    InvalidParticipant(String),

    #[error("direct chats require exactly two participants")]
    InvalidParticipantCount,

    #[error("permission denied")]
    PermissionDenied,

    #[error("operation not supported for this chat type")]
    UnsupportedOperation,

    #[error("reply target is missing or deleted")]
    InvalidReply,

    #[error("message is already deleted")]
    AlreadyDeleted,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("storage timed out")]
    StorageTimeout,

    #[error("storage conflict")]
    StorageConflict,

    #[error("storage error")]
    Storage(#[from] sqlx::Error),
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::InvalidParticipant(_)
            | ChatError::InvalidParticipantCount
            | ChatError::UnsupportedOperation
            | ChatError::InvalidReply
            | ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::PermissionDenied => StatusCode::FORBIDDEN,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::AlreadyDeleted | ChatError::StorageConflict => StatusCode::CONFLICT,
            ChatError::StorageTimeout => StatusCode::GATEWAY_TIMEOUT,
            ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Never leak storage details to the client.
            ChatError::Storage(e) => {
                tracing::error!("storage error: {:?}", e);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
