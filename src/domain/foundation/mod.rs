//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, errors, and the event/command vocabulary used by
//! the conversation, message, and notification modules.

mod auth;
mod command;
mod errors;
mod events;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ErrorKind, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, EventType,
    SerializableDomainEvent,
};
pub use ids::{ConversationId, MessageId, NotificationId, UserId};
pub use timestamp::Timestamp;
