//! WebSocket frame types.
//!
//! - Client → Server: `{"type": "joinConversation", ...}` commands
//! - Server → Client: `{"event": "<name>", "data": {...}}` events and
//!   `{"event": "ack", "ackId": .., "data": {...}}` acknowledgements

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::realtime::ServerEvent;

// ============================================
// Client → Server
// ============================================

/// Commands a connected client may send.
///
/// Ids arrive as strings and are parsed by the gateway so that a bad id
/// can be reported back instead of dropping the frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    JoinConversation { conversation_id: String },

    #[serde(rename_all = "camelCase")]
    LeaveConversation { conversation_id: String },

    #[serde(rename_all = "camelCase")]
    MarkMessageRead {
        #[serde(default)]
        ack_id: Option<Value>,
        conversation_id: String,
        message_id: String,
    },
}

impl ClientCommand {
    /// Pulls `ackId` out of a raw frame, whether or not the rest parses.
    pub fn ack_id_of(raw: &Value) -> Option<Value> {
        raw.get("ackId").filter(|v| !v.is_null()).cloned()
    }
}

// ============================================
// Server → Client
// ============================================

/// Everything written to a client socket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    Event(ServerEvent),
    Ack(AckFrame),
}

impl OutboundFrame {
    pub fn ack_success(ack_id: Value) -> Self {
        OutboundFrame::Ack(AckFrame {
            ack_id,
            data: AckData {
                success: true,
                error: None,
            },
        })
    }

    pub fn ack_failure(ack_id: Value, error: impl Into<String>) -> Self {
        OutboundFrame::Ack(AckFrame {
            ack_id,
            data: AckData {
                success: false,
                error: Some(error.into()),
            },
        })
    }

    /// Event name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundFrame::Event(event) => event.name(),
            OutboundFrame::Ack(_) => "ack",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<ServerEvent> for OutboundFrame {
    fn from(event: ServerEvent) -> Self {
        OutboundFrame::Event(event)
    }
}

/// Reply to a command that carried an `ackId`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename = "ack", rename_all = "camelCase")]
pub struct AckFrame {
    pub ack_id: Value,
    pub data: AckData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AckData {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;
    use crate::domain::realtime::ConversationRef;
    use serde_json::json;

    #[test]
    fn parses_join_command() {
        let cmd: ClientCommand = serde_json::from_value(json!({
            "type": "joinConversation",
            "conversationId": "abc"
        }))
        .unwrap();

        assert_eq!(
            cmd,
            ClientCommand::JoinConversation {
                conversation_id: "abc".into()
            }
        );
    }

    #[test]
    fn parses_mark_read_with_numeric_ack_id() {
        let cmd: ClientCommand = serde_json::from_value(json!({
            "type": "markMessageRead",
            "ackId": 7,
            "conversationId": "c",
            "messageId": "m"
        }))
        .unwrap();

        let ClientCommand::MarkMessageRead { ack_id, .. } = cmd else {
            panic!("expected markMessageRead");
        };
        assert_eq!(ack_id, Some(json!(7)));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_value::<ClientCommand>(json!({"type": "dance"}));
        assert!(result.is_err());
    }

    #[test]
    fn ack_id_survives_malformed_frame() {
        let raw = json!({"type": "markMessageRead", "ackId": "a-1"});
        assert!(serde_json::from_value::<ClientCommand>(raw.clone()).is_err());
        assert_eq!(ClientCommand::ack_id_of(&raw), Some(json!("a-1")));
    }

    #[test]
    fn ack_frame_shape() {
        let success = serde_json::to_value(OutboundFrame::ack_success(json!(1))).unwrap();
        assert_eq!(
            success,
            json!({"event": "ack", "ackId": 1, "data": {"success": true}})
        );

        let failure =
            serde_json::to_value(OutboundFrame::ack_failure(json!("x"), "Permission denied"))
                .unwrap();
        assert_eq!(failure["data"]["success"], false);
        assert_eq!(failure["data"]["error"], "Permission denied");
    }

    #[test]
    fn event_frame_keeps_server_event_shape() {
        let id = ConversationId::new();
        let frame: OutboundFrame =
            ServerEvent::LeftConversationSuccess(ConversationRef { conversation_id: id }).into();

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["event"], "leftConversationSuccess");
        assert_eq!(json["data"]["conversationId"], id.to_string());
        assert_eq!(frame.name(), "leftConversationSuccess");
    }
}
