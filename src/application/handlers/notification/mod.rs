//! Notification command and query handlers.

mod create_notification;
mod delete_notifications;
mod list_notifications;

pub use create_notification::{
    CreateNotificationCommand, CreateNotificationHandler, CreateNotificationOutcome,
};
pub use delete_notifications::{DeleteNotificationsCommand, DeleteNotificationsHandler};
pub use list_notifications::ListNotificationsHandler;
