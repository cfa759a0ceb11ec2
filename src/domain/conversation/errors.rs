//! Conversation-specific error types.

use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, ErrorKind};

/// Conversation-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// Conversation does not exist.
    NotFound(ConversationId),
    /// Conversation exists but the caller is not a participant.
    Forbidden,
    /// Request was malformed (self-conversation, too few members, ...).
    ValidationFailed { field: String, message: String },
    /// A concurrent writer won a uniqueness race.
    Conflict(String),
    /// Store failure.
    Infrastructure(String),
}

impl ConversationError {
    pub fn not_found(id: ConversationId) -> Self {
        ConversationError::NotFound(id)
    }
    pub fn forbidden() -> Self {
        ConversationError::Forbidden
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConversationError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        ConversationError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            ConversationError::NotFound(_) => ErrorCode::ConversationNotFound,
            ConversationError::Forbidden => ErrorCode::Forbidden,
            ConversationError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            ConversationError::Conflict(_) => ErrorCode::Conflict,
            ConversationError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
    pub fn message(&self) -> String {
        match self {
            ConversationError::NotFound(id) => format!("Conversation not found: {}", id),
            ConversationError::Forbidden => {
                "You are not a participant of this conversation".to_string()
            }
            ConversationError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            ConversationError::Conflict(msg) => format!("Conflict: {}", msg),
            ConversationError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for ConversationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ConversationError {}

impl From<DomainError> for ConversationError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Forbidden | ErrorCode::Unauthorized => ConversationError::Forbidden,
            ErrorCode::Conflict => ConversationError::Conflict(err.message),
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                ConversationError::ValidationFailed {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            _ => ConversationError::Infrastructure(err.to_string()),
        }
    }
}
