//! MessageFanout - message lifecycle and read-state frames.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::services::{PayloadShaper, ReadLedger};
use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::domain::message::{MessageCreated, MessageDeleted, MessageUpdated, MessagesRead};
use crate::domain::realtime::{DeletedMessageData, RoomName, ServerEvent};
use crate::ports::{DomainEventHandler, RealtimeFanout};

use super::{emit, settle};

/// Emits `newMessage`, `updatedMessage` and `deletedMessage` to the
/// conversation room, and the reader's unread count after a read.
pub struct MessageFanout {
    shaper: Arc<PayloadShaper>,
    ledger: Arc<ReadLedger>,
    fanout: Arc<dyn RealtimeFanout>,
}

impl MessageFanout {
    pub fn new(
        shaper: Arc<PayloadShaper>,
        ledger: Arc<ReadLedger>,
        fanout: Arc<dyn RealtimeFanout>,
    ) -> Self {
        Self {
            shaper,
            ledger,
            fanout,
        }
    }

    async fn unread_for_reader(&self, event: &MessagesRead) -> Result<(), DomainError> {
        let count = self
            .ledger
            .count_unread(&event.conversation_id, &event.reader)
            .await?;
        emit(
            self.fanout.as_ref(),
            &RoomName::user(&event.reader),
            ServerEvent::unread_count(event.conversation_id, count),
        )
        .await;
        Ok(())
    }
}

#[async_trait]
impl DomainEventHandler<MessageCreated> for MessageFanout {
    async fn handle_event(
        &self,
        event: MessageCreated,
        _envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let view = self.shaper.message_view(&event.message).await;
        emit(
            self.fanout.as_ref(),
            &RoomName::conversation(&event.conversation_id),
            ServerEvent::NewMessage(view),
        )
        .await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MessageFanout::created"
    }
}

#[async_trait]
impl DomainEventHandler<MessageUpdated> for MessageFanout {
    async fn handle_event(
        &self,
        event: MessageUpdated,
        _envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let view = self.shaper.message_view(&event.message).await;
        emit(
            self.fanout.as_ref(),
            &RoomName::conversation(&event.conversation_id),
            ServerEvent::UpdatedMessage(view),
        )
        .await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MessageFanout::updated"
    }
}

#[async_trait]
impl DomainEventHandler<MessageDeleted> for MessageFanout {
    async fn handle_event(
        &self,
        event: MessageDeleted,
        _envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        emit(
            self.fanout.as_ref(),
            &RoomName::conversation(&event.conversation_id),
            ServerEvent::DeletedMessage(DeletedMessageData {
                conversation_id: event.conversation_id,
                message_id: event.message_id,
            }),
        )
        .await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MessageFanout::deleted"
    }
}

#[async_trait]
impl DomainEventHandler<MessagesRead> for MessageFanout {
    async fn handle_event(
        &self,
        event: MessagesRead,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let result = self.unread_for_reader(&event).await;
        settle("MessageFanout::read", envelope, result)
    }

    fn name(&self) -> &'static str {
        "MessageFanout::read"
    }
}
