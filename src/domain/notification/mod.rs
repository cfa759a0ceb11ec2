//! Notification module.

mod aggregate;
mod errors;
mod events;

pub use aggregate::{Notification, NotificationKind};
pub use errors::NotificationError;
pub use events::{NotificationCreated, NotificationsChanged};
