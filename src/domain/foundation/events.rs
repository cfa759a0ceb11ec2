//! Event infrastructure for domain event publishing and handling.
//!
//! - `EventType` - Closed set of event names the core publishes
//! - `EventId` - Unique identifier for events (deduplication)
//! - `EventMetadata` - Tracing and correlation context
//! - `EventEnvelope` - Transport wrapper for domain events
//! - `DomainEvent` - Trait that ties a payload type to its `EventType`
//! - `domain_event!` - Macro to simplify DomainEvent implementations

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::{DomainError, ErrorCode, Timestamp};

// ============================================
// EventType
// ============================================

/// Every event the core can publish.
///
/// The serialized form is the wire name used in logs and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "message:created")]
    MessageCreated,
    #[serde(rename = "message:updated")]
    MessageUpdated,
    #[serde(rename = "message:deleted")]
    MessageDeleted,
    #[serde(rename = "messages:read")]
    MessagesRead,
    #[serde(rename = "conversation:updated")]
    ConversationUpdated,
    #[serde(rename = "conversation:deleted")]
    ConversationDeleted,
    #[serde(rename = "groupConversation:created")]
    GroupConversationCreated,
    #[serde(rename = "notification:created")]
    NotificationCreated,
    #[serde(rename = "notifications:changed")]
    NotificationsChanged,
}

impl EventType {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::MessageCreated => "message:created",
            EventType::MessageUpdated => "message:updated",
            EventType::MessageDeleted => "message:deleted",
            EventType::MessagesRead => "messages:read",
            EventType::ConversationUpdated => "conversation:updated",
            EventType::ConversationDeleted => "conversation:deleted",
            EventType::GroupConversationCreated => "groupConversation:created",
            EventType::NotificationCreated => "notification:created",
            EventType::NotificationsChanged => "notifications:changed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// DomainEvent Trait
// ============================================

/// Trait that all domain events must implement.
///
/// The associated `EVENT_TYPE` binds a payload type to exactly one event
/// name, so subscribers registered through `subscribe_typed` can only ever
/// receive the payload shape they expect.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Event name used for routing.
    const EVENT_TYPE: EventType;

    /// Returns the ID of the aggregate that emitted this event.
    fn aggregate_id(&self) -> String;

    /// Returns the type of aggregate (e.g., "Conversation", "Notification").
    fn aggregate_type(&self) -> &'static str;

    /// Returns when the event occurred.
    fn occurred_at(&self) -> Timestamp;

    /// Returns the unique ID for this event instance.
    fn event_id(&self) -> EventId;
}

/// Macro to implement DomainEvent trait with minimal boilerplate.
///
/// # Example
///
/// ```ignore
/// domain_event!(
///     MessageCreated,
///     event_type = EventType::MessageCreated,
///     aggregate_id = conversation_id,
///     aggregate_type = "Conversation",
///     occurred_at = created_at,
///     event_id = event_id
/// );
/// ```
#[macro_export]
macro_rules! domain_event {
    (
        $event_name:ident,
        event_type = $event_type:expr,
        aggregate_id = $agg_id_field:ident,
        aggregate_type = $agg_type:expr,
        occurred_at = $occurred_field:ident,
        event_id = $event_id_field:ident
    ) => {
        impl $crate::domain::foundation::DomainEvent for $event_name {
            const EVENT_TYPE: $crate::domain::foundation::EventType = $event_type;

            fn aggregate_id(&self) -> String {
                self.$agg_id_field.to_string()
            }

            fn aggregate_type(&self) -> &'static str {
                $agg_type
            }

            fn occurred_at(&self) -> $crate::domain::foundation::Timestamp {
                self.$occurred_field
            }

            fn event_id(&self) -> $crate::domain::foundation::EventId {
                self.$event_id_field.clone()
            }
        }
    };
}

pub use crate::domain_event;

/// Unique identifier for events (used for deduplication).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an EventId from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata for tracing and correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// ID linking related events across a single user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// ID of the event that directly caused this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,

    /// User who initiated the action that led to this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Transport envelope for domain events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique ID for this event instance.
    pub event_id: EventId,

    /// Event type for routing.
    pub event_type: EventType,

    /// ID of the aggregate that emitted this event.
    pub aggregate_id: String,

    /// Type of aggregate (e.g., "Conversation").
    pub aggregate_type: String,

    /// When the event occurred.
    pub occurred_at: Timestamp,

    /// Event-specific payload as JSON.
    pub payload: JsonValue,

    /// Tracing and correlation metadata.
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Creates an envelope from a domain event with automatic serialization.
    ///
    /// ```ignore
    /// let envelope = EventEnvelope::from_event(&event)
    ///     .with_correlation_id(metadata.correlation_id())
    ///     .with_user_id(metadata.user_id.to_string());
    /// publisher.publish(envelope).await?;
    /// ```
    pub fn from_event<T: DomainEvent>(event: &T) -> Self {
        Self {
            event_id: event.event_id(),
            event_type: T::EVENT_TYPE,
            aggregate_id: event.aggregate_id(),
            aggregate_type: event.aggregate_type().to_string(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event)
                .expect("Event serialization should never fail for well-formed events"),
            metadata: EventMetadata::default(),
        }
    }

    /// Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    /// Add causation ID (ID of event that caused this one).
    pub fn with_causation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.causation_id = Some(id.into());
        self
    }

    /// Add user ID for audit.
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.user_id = Some(id.into());
        self
    }

    /// Decodes the payload as `T`, refusing envelopes of another type.
    pub fn decode<T: DomainEvent>(&self) -> Result<T, DomainError> {
        if self.event_type != T::EVENT_TYPE {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!(
                    "Envelope of type {} cannot be decoded as {}",
                    self.event_type,
                    T::EVENT_TYPE
                ),
            ));
        }
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Malformed {} payload: {}", self.event_type, e),
            )
        })
    }
}

/// Shorthand used by handlers that publish typed events.
pub trait SerializableDomainEvent: DomainEvent {
    fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope::from_event(self)
    }
}

impl<T: DomainEvent> SerializableDomainEvent for T {}
