//! Conversation command and query handlers.

mod create_group;
mod leave_conversation;
mod list_conversations;
mod start_direct;

pub use create_group::{CreateGroupConversationCommand, CreateGroupConversationHandler};
pub use leave_conversation::{LeaveConversationCommand, LeaveConversationHandler};
pub use list_conversations::{ListConversationsHandler, ListConversationsQuery};
pub use start_direct::{StartDirectConversationCommand, StartDirectConversationHandler};
