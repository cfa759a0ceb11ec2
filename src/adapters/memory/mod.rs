//! In-memory store adapters.
//!
//! Used by tests and by the server when no database is configured.

mod conversation_store;
mod message_store;
mod notification_store;
mod profile_store;

pub use conversation_store::InMemoryConversationStore;
pub use message_store::InMemoryMessageStore;
pub use notification_store::InMemoryNotificationStore;
pub use profile_store::InMemoryProfileStore;
