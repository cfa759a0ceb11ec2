//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations, plus the
//! fan-out handlers that turn domain events into client frames.

pub mod conversation;
pub mod fanout;
pub mod message;
pub mod notification;

#[cfg(test)]
pub(crate) mod test_support;

use crate::domain::foundation::EventEnvelope;
use crate::ports::EventPublisher;

/// Publishes after a committed write. The write stands even if publishing
/// fails, so the failure is only logged.
pub(crate) async fn publish_committed(publisher: &dyn EventPublisher, envelope: EventEnvelope) {
    let event_type = envelope.event_type;
    let aggregate_id = envelope.aggregate_id.clone();
    if let Err(e) = publisher.publish(envelope).await {
        tracing::error!(
            event_type = %event_type,
            aggregate_id = %aggregate_id,
            error = %e,
            "failed to publish event after commit"
        );
    }
}
