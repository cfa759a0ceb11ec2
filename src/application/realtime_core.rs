//! RealtimeCore - wires stores, services, handlers and fan-out together.
//!
//! Built once at startup and shared behind an `Arc`. Handlers are cheap
//! to construct (a handful of `Arc` clones), so the core hands out fresh
//! ones instead of storing every handler.

use std::sync::Arc;

use crate::adapters::events::InMemoryEventBus;
use crate::adapters::memory::{
    InMemoryConversationStore, InMemoryMessageStore, InMemoryNotificationStore,
    InMemoryProfileStore,
};
use crate::application::handlers::conversation::{
    CreateGroupConversationHandler, LeaveConversationHandler, ListConversationsHandler,
    StartDirectConversationHandler,
};
use crate::application::handlers::fanout::{
    ConversationFanout, MessageFanout, NotificationFanout,
};
use crate::application::handlers::message::{
    DeleteMessageHandler, EditMessageHandler, GetMessagesHandler, MarkMessageReadHandler,
    SendMessageHandler,
};
use crate::application::handlers::notification::{
    CreateNotificationHandler, DeleteNotificationsHandler, ListNotificationsHandler,
};
use crate::application::services::{ConversationManager, PayloadShaper, ReadLedger};
use crate::domain::conversation::{
    ConversationDeleted, ConversationUpdated, GroupConversationCreated,
};
use crate::domain::message::{MessageCreated, MessageDeleted, MessageUpdated, MessagesRead};
use crate::domain::notification::{NotificationCreated, NotificationsChanged};
use crate::ports::{
    ConversationRepository, EventBus, EventPublisher, EventSubscriberExt, MessageRepository,
    NotificationRepository, ProfileReader, RealtimeFanout,
};

/// The persistence ports the core runs on.
#[derive(Clone)]
pub struct Stores {
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub profiles: Arc<dyn ProfileReader>,
}

impl Stores {
    /// Process-local stores; state is lost on restart.
    pub fn in_memory() -> Self {
        Self {
            conversations: Arc::new(InMemoryConversationStore::new()),
            messages: Arc::new(InMemoryMessageStore::new()),
            notifications: Arc::new(InMemoryNotificationStore::new()),
            profiles: Arc::new(InMemoryProfileStore::new()),
        }
    }
}

/// Bus for a long-running server: dispatches without keeping a history.
pub(crate) fn server_bus() -> Arc<InMemoryEventBus> {
    Arc::new(InMemoryEventBus::without_history())
}

pub struct RealtimeCore {
    stores: Stores,
    manager: Arc<ConversationManager>,
    ledger: Arc<ReadLedger>,
    shaper: Arc<PayloadShaper>,
    publisher: Arc<dyn EventPublisher>,
}

impl RealtimeCore {
    /// Builds the services and subscribes the fan-out handlers to `bus`.
    pub fn new<B>(stores: Stores, bus: Arc<B>, fanout: Arc<dyn RealtimeFanout>) -> Self
    where
        B: EventBus + 'static,
    {
        let manager = Arc::new(ConversationManager::new(
            stores.conversations.clone(),
            stores.messages.clone(),
        ));
        let ledger = Arc::new(ReadLedger::new(stores.messages.clone()));
        let shaper = Arc::new(PayloadShaper::new(
            stores.profiles.clone(),
            stores.messages.clone(),
        ));

        let messages = Arc::new(MessageFanout::new(
            shaper.clone(),
            ledger.clone(),
            fanout.clone(),
        ));
        bus.subscribe_typed::<MessageCreated, _>(messages.clone());
        bus.subscribe_typed::<MessageUpdated, _>(messages.clone());
        bus.subscribe_typed::<MessageDeleted, _>(messages.clone());
        bus.subscribe_typed::<MessagesRead, _>(messages);

        let conversations = Arc::new(ConversationFanout::new(
            stores.conversations.clone(),
            ledger.clone(),
            shaper.clone(),
            fanout.clone(),
        ));
        bus.subscribe_typed::<ConversationUpdated, _>(conversations.clone());
        bus.subscribe_typed::<GroupConversationCreated, _>(conversations.clone());
        bus.subscribe_typed::<ConversationDeleted, _>(conversations);

        let notifications = Arc::new(NotificationFanout::new(
            stores.notifications.clone(),
            shaper.clone(),
            fanout,
        ));
        bus.subscribe_typed::<NotificationCreated, _>(notifications.clone());
        bus.subscribe_typed::<NotificationsChanged, _>(notifications);

        tracing::debug!("realtime fan-out handlers registered");

        Self {
            stores,
            manager,
            ledger,
            shaper,
            publisher: bus,
        }
    }

    /// Core for a long-running server, on a bus that retains nothing.
    pub fn for_server(stores: Stores, fanout: Arc<dyn RealtimeFanout>) -> Self {
        Self::new(stores, server_bus(), fanout)
    }

    pub fn manager(&self) -> &Arc<ConversationManager> {
        &self.manager
    }

    pub fn ledger(&self) -> &Arc<ReadLedger> {
        &self.ledger
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn start_direct(&self) -> StartDirectConversationHandler {
        StartDirectConversationHandler::new(self.manager.clone())
    }

    pub fn create_group(&self) -> CreateGroupConversationHandler {
        CreateGroupConversationHandler::new(self.manager.clone(), self.publisher.clone())
    }

    pub fn leave_conversation(&self) -> LeaveConversationHandler {
        LeaveConversationHandler::new(self.manager.clone(), self.publisher.clone())
    }

    pub fn list_conversations(&self) -> ListConversationsHandler {
        ListConversationsHandler::new(
            self.manager.clone(),
            self.ledger.clone(),
            self.shaper.clone(),
        )
    }

    pub fn send_message(&self) -> SendMessageHandler {
        SendMessageHandler::new(
            self.manager.clone(),
            self.stores.messages.clone(),
            self.publisher.clone(),
        )
    }

    pub fn get_messages(&self) -> GetMessagesHandler {
        GetMessagesHandler::new(
            self.manager.clone(),
            self.ledger.clone(),
            self.stores.messages.clone(),
            self.shaper.clone(),
            self.publisher.clone(),
        )
    }

    pub fn mark_message_read(&self) -> MarkMessageReadHandler {
        MarkMessageReadHandler::new(
            self.manager.clone(),
            self.ledger.clone(),
            self.stores.messages.clone(),
            self.publisher.clone(),
        )
    }

    pub fn edit_message(&self) -> EditMessageHandler {
        EditMessageHandler::new(
            self.manager.clone(),
            self.stores.messages.clone(),
            self.publisher.clone(),
        )
    }

    pub fn delete_message(&self) -> DeleteMessageHandler {
        DeleteMessageHandler::new(
            self.manager.clone(),
            self.stores.messages.clone(),
            self.publisher.clone(),
        )
    }

    pub fn create_notification(&self) -> CreateNotificationHandler {
        CreateNotificationHandler::new(self.stores.notifications.clone(), self.publisher.clone())
    }

    pub fn list_notifications(&self) -> ListNotificationsHandler {
        ListNotificationsHandler::new(
            self.stores.notifications.clone(),
            self.shaper.clone(),
            self.publisher.clone(),
        )
    }

    pub fn delete_notifications(&self) -> DeleteNotificationsHandler {
        DeleteNotificationsHandler::new(self.stores.notifications.clone(), self.publisher.clone())
    }
}
