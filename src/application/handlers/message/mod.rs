//! Message command and query handlers.

mod delete_message;
mod edit_message;
mod get_messages;
mod mark_message_read;
mod send_message;

pub use delete_message::{DeleteMessageCommand, DeleteMessageHandler};
pub use edit_message::{EditMessageCommand, EditMessageHandler};
pub use get_messages::{GetMessagesHandler, GetMessagesQuery};
pub use mark_message_read::{MarkMessageReadCommand, MarkMessageReadHandler};
pub use send_message::{SendMessageCommand, SendMessageHandler};
