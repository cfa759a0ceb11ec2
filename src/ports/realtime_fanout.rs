//! Realtime fan-out port.
//!
//! Dispatch handlers emit through this port instead of reaching for a global
//! gateway handle, which keeps them testable with a recording fake.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::domain::realtime::{RoomName, ServerEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FanoutError {
    #[error("Realtime transport unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RealtimeFanout: Send + Sync {
    /// Sends `event` to every connection in `room`. Returns how many
    /// connections accepted the frame; an empty room is not an error.
    async fn emit_to_room(&self, room: &RoomName, event: ServerEvent)
        -> Result<usize, FanoutError>;

    /// Sends `event` to every connection of `user`.
    async fn emit_to_user(&self, user: &UserId, event: ServerEvent) -> Result<usize, FanoutError> {
        self.emit_to_room(&RoomName::user(user), event).await
    }
}
