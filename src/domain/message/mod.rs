//! Message module - messages, their content, and read state.

mod aggregate;
mod errors;
mod events;

pub use aggregate::{Message, MessageContent, MAX_TEXT_LENGTH};
pub use errors::MessageError;
pub use events::{MessageCreated, MessageDeleted, MessageUpdated, MessagesRead};
