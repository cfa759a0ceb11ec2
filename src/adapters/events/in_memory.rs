//! In-process event bus.
//!
//! Delivers each published envelope to the handlers registered for its
//! `EventType`, one after another in registration order. A handler that
//! returns an error or panics is logged and skipped; the publisher and the
//! remaining handlers never see the failure.
//!
//! The bus also records what was published so tests can assert on it.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use futures::FutureExt;

use crate::domain::foundation::{DomainError, EventEnvelope, EventType};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

/// In-memory event bus.
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// bus.subscribe_typed::<MessageCreated, _>(message_fanout);
///
/// bus.publish(envelope).await?;
/// assert!(bus.has_event(EventType::MessageCreated));
/// ```
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<EventType, Vec<Arc<dyn EventHandler>>>>,
    published: RwLock<Vec<EventEnvelope>>,
    record_published: bool,
}

impl InMemoryEventBus {
    /// Creates a bus that records every published envelope.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            record_published: true,
        }
    }

    /// Creates a bus that dispatches without keeping a history.
    pub fn without_history() -> Self {
        Self {
            record_published: false,
            ..Self::new()
        }
    }

    fn read_published(&self) -> RwLockReadGuard<'_, Vec<EventEnvelope>> {
        self.published.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_published(&self) -> RwLockWriteGuard<'_, Vec<EventEnvelope>> {
        self.published.write().unwrap_or_else(|e| e.into_inner())
    }

    fn handlers_for(&self, event_type: EventType) -> Vec<Arc<dyn EventHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&event_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of handlers registered for `event_type`.
    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.handlers_for(event_type).len()
    }

    // === Test Helpers ===

    /// Returns all published events.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.read_published().clone()
    }

    /// Returns events of a specific type.
    pub fn events_of_type(&self, event_type: EventType) -> Vec<EventEnvelope> {
        self.read_published()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Returns events for a specific aggregate.
    pub fn events_for_aggregate(&self, aggregate_id: &str) -> Vec<EventEnvelope> {
        self.read_published()
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect()
    }

    /// Clears the recorded history.
    pub fn clear(&self) {
        self.write_published().clear();
    }

    pub fn event_count(&self) -> usize {
        self.read_published().len()
    }

    pub fn has_event(&self, event_type: EventType) -> bool {
        self.read_published()
            .iter()
            .any(|e| e.event_type == event_type)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if self.record_published {
            self.write_published().push(event.clone());
        }

        // Snapshot taken so no lock is held across handler awaits.
        let handlers = self.handlers_for(event.event_type);
        if handlers.is_empty() {
            tracing::trace!(event_type = %event.event_type, "no subscribers");
            return Ok(());
        }

        for handler in handlers {
            let outcome = AssertUnwindSafe(handler.handle(event.clone()))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    event_id = %event.event_id,
                    error = %err,
                    "event handler failed"
                ),
                Err(_) => tracing::error!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    event_id = %event.event_id,
                    "event handler panicked"
                ),
            }
        }

        Ok(())
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: EventType, handler: Arc<dyn EventHandler>) {
        tracing::debug!(event_type = %event_type, handler = handler.name(), "subscribed");
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(event_type)
            .or_default()
            .push(handler);
    }
}
