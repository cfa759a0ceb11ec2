//! Conversation module - direct and group conversations.

mod aggregate;
mod errors;
mod events;

pub use aggregate::{
    Conversation, ConversationKind, DirectPairKey, LastMessageRef, RemovalOutcome,
    RequestedMembers, MAX_GROUP_NAME_LENGTH,
};
pub use errors::ConversationError;
pub use events::{ConversationDeleted, ConversationUpdated, GroupConversationCreated, UpdateReason};
