//! ConversationManager - conversation lifecycle and access rules.
//!
//! Every mutation is delegated to a single atomic repository call. The
//! manager never loads a conversation, edits it, and writes it back.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::conversation::{
    Conversation, ConversationError, DirectPairKey, LastMessageRef, RemovalOutcome,
    RequestedMembers,
};
use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::message::Message;
use crate::ports::{ConversationRepository, DirectInsert, MessageRepository};

/// What `create_group` ended up creating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCreation {
    /// Only two distinct members were requested.
    Direct(Conversation),
    Group(Conversation),
}

impl GroupCreation {
    pub fn conversation(&self) -> &Conversation {
        match self {
            GroupCreation::Direct(c) | GroupCreation::Group(c) => c,
        }
    }
}

pub struct ConversationManager {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl ConversationManager {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            conversations,
            messages,
        }
    }

    /// Returns the direct conversation between `me` and `other`, creating it
    /// if needed, and makes sure it is visible to `me`.
    pub async fn find_or_create_direct(
        &self,
        me: &UserId,
        other: &UserId,
    ) -> Result<Conversation, ConversationError> {
        let key = DirectPairKey::new(me.clone(), other.clone())?;

        if let Some(existing) = self.conversations.find_direct(&key).await? {
            return self.reveal(existing, me).await;
        }

        let candidate = Conversation::new_direct(me.clone(), other.clone())?;
        match self.conversations.insert_direct(&candidate).await? {
            DirectInsert::Created(created) => {
                tracing::debug!(conversation_id = %created.id(), pair = %key, "direct conversation created");
                Ok(created)
            }
            DirectInsert::Existing(existing) => {
                tracing::debug!(conversation_id = %existing.id(), pair = %key, "lost direct creation race");
                self.reveal(existing, me).await
            }
        }
    }

    async fn reveal(
        &self,
        conversation: Conversation,
        me: &UserId,
    ) -> Result<Conversation, ConversationError> {
        if conversation.is_visible_to(me) {
            return Ok(conversation);
        }
        self.conversations
            .reveal_to(conversation.id(), me)
            .await?
            .ok_or_else(|| ConversationError::not_found(*conversation.id()))
    }

    /// Creates a group from `members ∪ {creator}`. Two distinct members
    /// collapse to the direct conversation between them.
    pub async fn create_group(
        &self,
        creator: &UserId,
        members: impl IntoIterator<Item = UserId>,
        name: Option<String>,
    ) -> Result<GroupCreation, ConversationError> {
        match RequestedMembers::resolve(creator, members)? {
            RequestedMembers::Pair(other) => Ok(GroupCreation::Direct(
                self.find_or_create_direct(creator, &other).await?,
            )),
            RequestedMembers::Group(all) => {
                let conversation = Conversation::new_group(all, name)?;
                self.conversations.insert_group(&conversation).await?;
                tracing::debug!(
                    conversation_id = %conversation.id(),
                    members = conversation.participants().len(),
                    "group conversation created"
                );
                Ok(GroupCreation::Group(conversation))
            }
        }
    }

    /// Membership check. `NotFound` when the conversation does not exist,
    /// `Forbidden` when it exists but `user` is not a participant.
    pub async fn authorize_access(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<Conversation, ConversationError> {
        if let Some(conversation) = self
            .conversations
            .find_for_participant(conversation_id, user)
            .await?
        {
            return Ok(conversation);
        }

        if self.conversations.exists(conversation_id).await? {
            Err(ConversationError::forbidden())
        } else {
            Err(ConversationError::not_found(*conversation_id))
        }
    }

    /// Points the conversation at `message` and reveals a direct
    /// conversation to both sides.
    pub async fn record_message_activity(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<Conversation, ConversationError> {
        let latest = LastMessageRef {
            message_id: *message.id(),
            at: *message.created_at(),
        };
        self.conversations
            .record_message(conversation_id, latest)
            .await?
            .ok_or_else(|| ConversationError::not_found(*conversation_id))
    }

    /// Re-derives the last-message pointer from the newest stored message.
    pub async fn refresh_last_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, ConversationError> {
        let latest = self
            .messages
            .latest_in_conversation(conversation_id)
            .await?
            .map(|m| LastMessageRef {
                message_id: *m.id(),
                at: *m.created_at(),
            });
        self.conversations
            .repoint_last_message(conversation_id, latest)
            .await?
            .ok_or_else(|| ConversationError::not_found(*conversation_id))
    }

    /// Removes `user` from the conversation. A group left with nobody
    /// seeing it is deleted together with its messages.
    pub async fn remove_participant(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<RemovalOutcome, ConversationError> {
        let outcome = self
            .conversations
            .remove_participant(conversation_id, user)
            .await?
            .ok_or_else(|| ConversationError::not_found(*conversation_id))?;

        if outcome == RemovalOutcome::GroupDeleted {
            let removed = self
                .messages
                .delete_for_conversation(conversation_id)
                .await?;
            tracing::info!(
                conversation_id = %conversation_id,
                messages_removed = removed,
                "abandoned group deleted"
            );
        }
        Ok(outcome)
    }

    /// Conversations `user` can see, most recently active first.
    pub async fn list_visible_to(
        &self,
        user: &UserId,
    ) -> Result<Vec<Conversation>, ConversationError> {
        Ok(self.conversations.list_visible_to(user).await?)
    }

    /// Participants of a conversation other than `user`.
    pub fn others(conversation: &Conversation, user: &UserId) -> BTreeSet<UserId> {
        conversation
            .participants()
            .iter()
            .filter(|p| *p != user)
            .cloned()
            .collect()
    }
}
