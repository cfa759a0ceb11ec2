//! Message entity and its content value object.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId, ValidationError};

use super::MessageError;

/// Maximum length of a message body, in characters.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Text and/or image reference. At least one is present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    text: Option<String>,
    image_url: Option<String>,
}

impl MessageContent {
    pub fn new(text: Option<String>, image_url: Option<String>) -> Result<Self, ValidationError> {
        let text = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let image_url = image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        if text.is_none() && image_url.is_none() {
            return Err(ValidationError::empty_field("text"));
        }
        if let Some(t) = &text {
            if t.chars().count() > MAX_TEXT_LENGTH {
                return Err(ValidationError::too_long("text", MAX_TEXT_LENGTH));
            }
        }
        if let Some(u) = &image_url {
            if !(u.starts_with("https://") || u.starts_with("http://")) {
                return Err(ValidationError::invalid_format(
                    "image_url",
                    "must be an http(s) URL",
                ));
            }
        }
        Ok(Self { text, image_url })
    }

    /// Text-only shorthand.
    pub fn text(text: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Some(text.into()), None)
    }

    pub fn body(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// A message in a conversation.
///
/// `read_by` always contains the sender. `created_at` is assigned by the
/// store so that it strictly increases within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    sender: UserId,
    content: MessageContent,
    read_by: BTreeSet<UserId>,
    created_at: Timestamp,
    edited_at: Option<Timestamp>,
}

impl Message {
    /// New message, already read by its sender.
    pub fn new(conversation_id: ConversationId, sender: UserId, content: MessageContent) -> Self {
        let mut read_by = BTreeSet::new();
        read_by.insert(sender.clone());
        Self {
            id: MessageId::new(),
            conversation_id,
            sender,
            content,
            read_by,
            created_at: Timestamp::now(),
            edited_at: None,
        }
    }

    /// Reconstitute a message from persistence (no validation).
    pub fn reconstitute(
        id: MessageId,
        conversation_id: ConversationId,
        sender: UserId,
        content: MessageContent,
        read_by: BTreeSet<UserId>,
        created_at: Timestamp,
        edited_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender,
            content,
            read_by,
            created_at,
            edited_at,
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn sender(&self) -> &UserId {
        &self.sender
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn read_by(&self) -> &BTreeSet<UserId> {
        &self.read_by
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn edited_at(&self) -> Option<&Timestamp> {
        self.edited_at.as_ref()
    }

    pub fn is_read_by(&self, user: &UserId) -> bool {
        self.read_by.contains(user)
    }

    /// Set-union `user` into `read_by`. Returns false if already present.
    pub fn mark_read_by(&mut self, user: &UserId) -> bool {
        self.read_by.insert(user.clone())
    }

    /// Store-assigned creation time.
    pub fn stamp_created_at(&mut self, at: Timestamp) {
        self.created_at = at;
    }

    /// Only the sender may change or remove a message.
    pub fn ensure_sender(&self, user: &UserId) -> Result<(), MessageError> {
        if &self.sender != user {
            return Err(MessageError::Forbidden);
        }
        Ok(())
    }

    /// Replaces the content on behalf of `editor`.
    pub fn edit(&mut self, editor: &UserId, content: MessageContent) -> Result<(), MessageError> {
        self.ensure_sender(editor)?;
        self.content = content;
        self.edited_at = Some(Timestamp::now());
        Ok(())
    }
}
