//! ConversationFanout - conversation list frames for each participant.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::services::{PayloadShaper, ReadLedger};
use crate::domain::conversation::{
    ConversationDeleted, ConversationUpdated, GroupConversationCreated,
};
use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::domain::realtime::{ConversationRef, RoomName, ServerEvent};
use crate::ports::{ConversationRepository, DomainEventHandler, RealtimeFanout};

use super::{emit, settle};

pub struct ConversationFanout {
    conversations: Arc<dyn ConversationRepository>,
    ledger: Arc<ReadLedger>,
    shaper: Arc<PayloadShaper>,
    fanout: Arc<dyn RealtimeFanout>,
}

impl ConversationFanout {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        ledger: Arc<ReadLedger>,
        shaper: Arc<PayloadShaper>,
        fanout: Arc<dyn RealtimeFanout>,
    ) -> Self {
        Self {
            conversations,
            ledger,
            shaper,
            fanout,
        }
    }

    /// `updatedConversation` to everyone who sees the conversation, then a
    /// fresh unread count to everyone but the actor.
    async fn on_updated(&self, event: &ConversationUpdated) -> Result<(), DomainError> {
        let Some(conversation) = self.conversations.find_by_id(&event.conversation_id).await?
        else {
            tracing::debug!(
                conversation_id = %event.conversation_id,
                "conversation gone before fan-out"
            );
            return Ok(());
        };
        let view = self.shaper.conversation_view(&conversation).await?;

        for participant in conversation.visible_to() {
            emit(
                self.fanout.as_ref(),
                &RoomName::user(participant),
                ServerEvent::UpdatedConversation(view.clone()),
            )
            .await;
        }

        for participant in conversation.visible_to() {
            if event.actor.as_ref() == Some(participant) {
                continue;
            }
            let count = match self.ledger.count_unread(conversation.id(), participant).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation.id(),
                        user_id = %participant,
                        error = %e,
                        "unread count failed, skipping participant"
                    );
                    continue;
                }
            };
            emit(
                self.fanout.as_ref(),
                &RoomName::user(participant),
                ServerEvent::unread_count(*conversation.id(), count),
            )
            .await;
        }
        Ok(())
    }

    async fn on_group_created(&self, event: &GroupConversationCreated) -> Result<(), DomainError> {
        let Some(conversation) = self.conversations.find_by_id(&event.conversation_id).await?
        else {
            return Ok(());
        };
        let view = self.shaper.conversation_view(&conversation).await?;

        for member in &event.members {
            emit(
                self.fanout.as_ref(),
                &RoomName::user(member),
                ServerEvent::NewGroupConversation(view.clone()),
            )
            .await;
        }
        Ok(())
    }
}

#[async_trait]
impl DomainEventHandler<ConversationUpdated> for ConversationFanout {
    async fn handle_event(
        &self,
        event: ConversationUpdated,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let result = self.on_updated(&event).await;
        settle("ConversationFanout::updated", envelope, result)
    }

    fn name(&self) -> &'static str {
        "ConversationFanout::updated"
    }
}

#[async_trait]
impl DomainEventHandler<GroupConversationCreated> for ConversationFanout {
    async fn handle_event(
        &self,
        event: GroupConversationCreated,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let result = self.on_group_created(&event).await;
        settle("ConversationFanout::group_created", envelope, result)
    }

    fn name(&self) -> &'static str {
        "ConversationFanout::group_created"
    }
}

#[async_trait]
impl DomainEventHandler<ConversationDeleted> for ConversationFanout {
    async fn handle_event(
        &self,
        event: ConversationDeleted,
        _envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        for user in &event.audience {
            emit(
                self.fanout.as_ref(),
                &RoomName::user(user),
                ServerEvent::DeletedConversation(ConversationRef {
                    conversation_id: event.conversation_id,
                }),
            )
            .await;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ConversationFanout::deleted"
    }
}
