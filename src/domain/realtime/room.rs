//! Broadcast room names.
//!
//! ```text
//! user:<userId>                  every connection of one user
//! conversation:<conversationId>  connections that joined a conversation
//! ```
//!
//! Both namespaces carry a prefix so a user id can never collide with a
//! conversation id.

use std::fmt;

use crate::domain::foundation::{ConversationId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomName(String);

impl RoomName {
    pub fn user(id: &UserId) -> Self {
        Self(format!("user:{}", id))
    }

    pub fn conversation(id: &ConversationId) -> Self {
        Self(format!("conversation:{}", id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
