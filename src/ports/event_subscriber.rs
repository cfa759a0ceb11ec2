//! EventSubscriber port - Interface for subscribing to domain events.
//!
//! Two handler flavours exist:
//! - `EventHandler` receives raw envelopes and is what the bus stores
//! - `DomainEventHandler<E>` receives a decoded `E`; register it with
//!   `subscribe_typed`, which wires it to `E::EVENT_TYPE` and decodes the
//!   payload before calling it

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, DomainEvent, EventEnvelope, EventType};

/// Handler for processing domain events.
///
/// Implementations should be idempotent and quick. Errors are logged by the
/// bus and never reach the publisher or other handlers.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Handler for one statically-known event payload.
#[async_trait]
pub trait DomainEventHandler<E: DomainEvent>: Send + Sync {
    async fn handle_event(&self, event: E, envelope: &EventEnvelope) -> Result<(), DomainError>;

    fn name(&self) -> &'static str;
}

/// Adapts a `DomainEventHandler<E>` to the envelope-level `EventHandler`.
pub struct TypedHandler<E, H: ?Sized> {
    inner: Arc<H>,
    _event: PhantomData<fn() -> E>,
}

impl<E, H: ?Sized> TypedHandler<E, H> {
    pub fn new(inner: Arc<H>) -> Self {
        Self {
            inner,
            _event: PhantomData,
        }
    }
}

#[async_trait]
impl<E, H> EventHandler for TypedHandler<E, H>
where
    E: DomainEvent,
    H: DomainEventHandler<E> + ?Sized + 'static,
{
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let payload = event.decode::<E>()?;
        self.inner.handle_event(payload, &event).await
    }

    fn name(&self) -> &'static str {
        <H as DomainEventHandler<E>>::name(&self.inner)
    }
}

/// Port for subscribing to domain events.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to a specific event type.
    fn subscribe(&self, event_type: EventType, handler: Arc<dyn EventHandler>);

    /// Subscribe handler to multiple event types.
    fn subscribe_all(&self, event_types: &[EventType], handler: Arc<dyn EventHandler>) {
        for event_type in event_types {
            self.subscribe(*event_type, Arc::clone(&handler));
        }
    }
}

/// Typed registration on top of any `EventSubscriber`.
pub trait EventSubscriberExt: EventSubscriber {
    /// Registers `handler` for `E::EVENT_TYPE`.
    ///
    /// ```ignore
    /// bus.subscribe_typed::<MessageCreated, _>(message_fanout.clone());
    /// ```
    fn subscribe_typed<E, H>(&self, handler: Arc<H>)
    where
        E: DomainEvent,
        H: DomainEventHandler<E> + 'static,
    {
        self.subscribe(E::EVENT_TYPE, Arc::new(TypedHandler::<E, H>::new(handler)));
    }
}

impl<T: EventSubscriber + ?Sized> EventSubscriberExt for T {}

/// Combined trait for event bus implementations.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
