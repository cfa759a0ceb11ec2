//! GetMessagesHandler - open a conversation's history.
//!
//! Reading is a write: every fetched message is marked read by the viewer
//! before the list is returned.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::{ConversationManager, PayloadShaper, ReadLedger};
use crate::domain::foundation::{
    CommandMetadata, ConversationId, EventId, SerializableDomainEvent, Timestamp,
};
use crate::domain::message::{MessageError, MessagesRead};
use crate::domain::realtime::MessageView;
use crate::ports::{EventPublisher, MessageRepository};

#[derive(Debug, Clone)]
pub struct GetMessagesQuery {
    pub conversation_id: ConversationId,
}

pub struct GetMessagesHandler {
    manager: Arc<ConversationManager>,
    ledger: Arc<ReadLedger>,
    messages: Arc<dyn MessageRepository>,
    shaper: Arc<PayloadShaper>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl GetMessagesHandler {
    pub fn new(
        manager: Arc<ConversationManager>,
        ledger: Arc<ReadLedger>,
        messages: Arc<dyn MessageRepository>,
        shaper: Arc<PayloadShaper>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            manager,
            ledger,
            messages,
            shaper,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        query: GetMessagesQuery,
        metadata: CommandMetadata,
    ) -> Result<Vec<MessageView>, MessageError> {
        let viewer = &metadata.user_id;
        self.manager
            .authorize_access(&query.conversation_id, viewer)
            .await?;

        self.ledger
            .mark_all_read(&query.conversation_id, viewer)
            .await?;
        let messages = self
            .messages
            .list_for_conversation(&query.conversation_id)
            .await?;

        let event = MessagesRead {
            event_id: EventId::new(),
            conversation_id: query.conversation_id,
            reader: viewer.clone(),
            read_at: Timestamp::now(),
        };
        publish_committed(
            self.event_publisher.as_ref(),
            event
                .to_envelope()
                .with_correlation_id(metadata.correlation_id())
                .with_user_id(viewer.to_string()),
        )
        .await;

        Ok(self.shaper.message_views(&messages).await)
    }
}
