//! Message-specific error types.

use crate::domain::conversation::ConversationError;
use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, ErrorKind, MessageId, ValidationError,
};

/// Errors raised by message commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    ConversationNotFound(ConversationId),
    NotFound(MessageId),
    Forbidden,
    ValidationFailed { field: String, message: String },
    Infrastructure(String),
}

impl MessageError {
    pub fn not_found(id: MessageId) -> Self {
        MessageError::NotFound(id)
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        MessageError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            MessageError::ConversationNotFound(_) => ErrorCode::ConversationNotFound,
            MessageError::NotFound(_) => ErrorCode::MessageNotFound,
            MessageError::Forbidden => ErrorCode::Forbidden,
            MessageError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            MessageError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
    pub fn message(&self) -> String {
        match self {
            MessageError::ConversationNotFound(id) => format!("Conversation not found: {}", id),
            MessageError::NotFound(id) => format!("Message not found: {}", id),
            MessageError::Forbidden => "Permission denied".to_string(),
            MessageError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            MessageError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MessageError {}

impl From<DomainError> for MessageError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Forbidden | ErrorCode::Unauthorized => MessageError::Forbidden,
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                MessageError::ValidationFailed {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            _ => MessageError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for MessageError {
    fn from(err: ValidationError) -> Self {
        MessageError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ConversationError> for MessageError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NotFound(id) => MessageError::ConversationNotFound(id),
            ConversationError::Forbidden => MessageError::Forbidden,
            ConversationError::ValidationFailed { field, message } => {
                MessageError::ValidationFailed { field, message }
            }
            ConversationError::Conflict(msg) | ConversationError::Infrastructure(msg) => {
                MessageError::Infrastructure(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_errors_keep_their_kind() {
        let id = ConversationId::new();
        let err: MessageError = ConversationError::not_found(id).into();
        assert_eq!(err, MessageError::ConversationNotFound(id));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: MessageError = ConversationError::forbidden().into();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn validation_error_maps_field() {
        let err: MessageError = ValidationError::empty_field("text").into();
        assert!(matches!(err, MessageError::ValidationFailed { ref field, .. } if field == "text"));
    }
}
