//! Shared fixtures for handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::adapters::memory::{
    InMemoryConversationStore, InMemoryMessageStore, InMemoryNotificationStore,
    InMemoryProfileStore,
};
use crate::application::services::{ConversationManager, PayloadShaper, ReadLedger};
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, EventType, UserId};
use crate::ports::EventPublisher;

pub fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub struct MockEventPublisher {
    published_events: Mutex<Vec<EventEnvelope>>,
    fail_publish: bool,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self {
            published_events: Mutex::new(Vec::new()),
            fail_publish: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            published_events: Mutex::new(Vec::new()),
            fail_publish: true,
        }
    }

    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published_events.lock().unwrap().clone()
    }

    pub fn published_types(&self) -> Vec<EventType> {
        self.published_events()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if self.fail_publish {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Simulated publish failure",
            ));
        }
        self.published_events.lock().unwrap().push(event);
        Ok(())
    }
}

/// In-memory stores plus the services built on them.
pub struct Fixture {
    pub conversations: Arc<InMemoryConversationStore>,
    pub messages: Arc<InMemoryMessageStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub manager: Arc<ConversationManager>,
    pub ledger: Arc<ReadLedger>,
    pub shaper: Arc<PayloadShaper>,
    pub publisher: Arc<MockEventPublisher>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_publisher(MockEventPublisher::new())
    }

    pub fn with_publisher(publisher: MockEventPublisher) -> Self {
        let conversations = Arc::new(InMemoryConversationStore::new());
        let messages = Arc::new(InMemoryMessageStore::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        Self {
            manager: Arc::new(ConversationManager::new(
                conversations.clone(),
                messages.clone(),
            )),
            ledger: Arc::new(ReadLedger::new(messages.clone())),
            shaper: Arc::new(PayloadShaper::new(profiles.clone(), messages.clone())),
            notifications: Arc::new(InMemoryNotificationStore::new()),
            publisher: Arc::new(publisher),
            conversations,
            messages,
            profiles,
        }
    }
}
