//! Typed persistence for the three entity collections. Every call is bounded
//! by the storage timeout; elapsing surfaces `StorageTimeout` to the caller
//! rather than being silently retried.

pub mod chats;
pub mod messages;
pub mod users;

use std::future::Future;
use std::time::Duration;

use ripple_shared::constants::STORAGE_TIMEOUT_MS;

use crate::error::ChatError;

pub(crate) async fn with_timeout<T, F>(fut: F) -> Result<T, ChatError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(Duration::from_millis(STORAGE_TIMEOUT_MS), fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ChatError::Storage(e)),
        Err(_) => Err(ChatError::StorageTimeout),
    }
}
