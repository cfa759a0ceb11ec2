//! Real-time vocabulary: room names, server events, and payload views.

mod room;
mod server_event;
mod views;

pub use room::RoomName;
pub use server_event::{
    ConversationRef, CountData, DeletedMessageData, JoinErrorData, ServerEvent, UnreadCountData,
    WelcomeData,
};
pub use views::{ConversationView, MessageView, NotificationView, UserSummary};
