//! Fan-out handlers - turn domain events into client frames.
//!
//! Each handler recomputes what it sends (views, unread counts) from the
//! stores at the time the event arrives, then emits through the
//! `RealtimeFanout` port. Failures are logged and swallowed: a missing
//! profile or a dead connection must never affect the command that
//! published the event.

mod conversation_fanout;
mod message_fanout;
mod notification_fanout;

pub use conversation_fanout::ConversationFanout;
pub use message_fanout::MessageFanout;
pub use notification_fanout::NotificationFanout;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::domain::realtime::{RoomName, ServerEvent};
use crate::ports::RealtimeFanout;

/// Emits one frame, logging rather than returning a transport failure.
async fn emit(fanout: &dyn RealtimeFanout, room: &RoomName, event: ServerEvent) {
    let name = event.name();
    match fanout.emit_to_room(room, event).await {
        Ok(delivered) => {
            tracing::trace!(room = %room, event = name, delivered, "frame emitted");
        }
        Err(e) => {
            tracing::warn!(room = %room, event = name, error = %e, "fan-out emit failed");
        }
    }
}

/// Logs a failed dispatch and reports success to the bus.
fn settle(
    handler: &'static str,
    envelope: &EventEnvelope,
    result: Result<(), DomainError>,
) -> Result<(), DomainError> {
    if let Err(e) = result {
        tracing::warn!(
            handler,
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            error = %e,
            "fan-out dispatch failed"
        );
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::adapters::fanout::RecordingFanout;
    use crate::application::handlers::test_support::Fixture;

    use super::{ConversationFanout, MessageFanout, NotificationFanout};

    pub struct FanoutFixture {
        pub fx: Fixture,
        pub fanout: Arc<RecordingFanout>,
    }

    impl FanoutFixture {
        pub fn new() -> Self {
            Self {
                fx: Fixture::new(),
                fanout: Arc::new(RecordingFanout::new()),
            }
        }

        pub fn message_fanout(&self) -> MessageFanout {
            MessageFanout::new(
                self.fx.shaper.clone(),
                self.fx.ledger.clone(),
                self.fanout.clone(),
            )
        }

        pub fn conversation_fanout(&self) -> ConversationFanout {
            ConversationFanout::new(
                self.fx.conversations.clone(),
                self.fx.ledger.clone(),
                self.fx.shaper.clone(),
                self.fanout.clone(),
            )
        }

        pub fn notification_fanout(&self) -> NotificationFanout {
            NotificationFanout::new(
                self.fx.notifications.clone(),
                self.fx.shaper.clone(),
                self.fanout.clone(),
            )
        }
    }
}
