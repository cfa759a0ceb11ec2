//! Notification-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, ErrorKind, NotificationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    NotFound(NotificationId),
    /// The caller is not the recipient.
    Forbidden,
    Infrastructure(String),
}

impl NotificationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            NotificationError::NotFound(_) => ErrorCode::NotificationNotFound,
            NotificationError::Forbidden => ErrorCode::Forbidden,
            NotificationError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
    pub fn message(&self) -> String {
        match self {
            NotificationError::NotFound(id) => format!("Notification not found: {}", id),
            NotificationError::Forbidden => "Permission denied".to_string(),
            NotificationError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for NotificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for NotificationError {}

impl From<DomainError> for NotificationError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Forbidden | ErrorCode::Unauthorized => NotificationError::Forbidden,
            _ => NotificationError::Infrastructure(err.to_string()),
        }
    }
}
