//! Ports - the interfaces the application core depends on.
//!
//! Adapters in `crate::adapters` implement these traits.

mod conversation_repository;
mod event_publisher;
mod event_subscriber;
mod message_repository;
mod notification_repository;
mod profile_reader;
mod realtime_fanout;
mod session_validator;

pub use conversation_repository::{ConversationRepository, DirectInsert};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{
    DomainEventHandler, EventBus, EventHandler, EventSubscriber, EventSubscriberExt, TypedHandler,
};
pub use message_repository::MessageRepository;
pub use notification_repository::NotificationRepository;
pub use profile_reader::ProfileReader;
pub use realtime_fanout::{FanoutError, RealtimeFanout};
pub use session_validator::SessionValidator;
