//! Real-time gateway - the transport-independent half of a connection.
//!
//! The axum handler owns the socket; everything it needs to decide (who is
//! connecting, what a frame means, what to reply) lives here so it can be
//! driven directly in tests.
//!
//! # Connection lifecycle
//!
//! ```text
//! Connecting ──authenticate──▶ Authenticated ──disconnect──▶ Disconnected
//!                                   │  joins user:<id>, gets `welcome`
//!                                   │  joinConversation / leaveConversation
//!                                   │  markMessageRead (acked)
//! ```

use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::application::handlers::message::MarkMessageReadCommand;
use crate::application::RealtimeCore;
use crate::domain::conversation::ConversationError;
use crate::domain::foundation::{
    AuthError, AuthenticatedUser, CommandMetadata, ConversationId, MessageId, UserId,
};
use crate::domain::realtime::{
    ConversationRef, JoinErrorData, RoomName, ServerEvent, WelcomeData,
};
use crate::ports::SessionValidator;

use super::messages::{ClientCommand, OutboundFrame};
use super::rooms::{ConnectionId, SessionRegistry};

/// Identity carried on the upgrade request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeParams {
    pub token: Option<String>,
    pub user_id: Option<String>,
}

impl HandshakeParams {
    /// `token` wins over `userId`; blanks count as absent.
    pub fn credential(&self) -> Option<&str> {
        [self.token.as_deref(), self.user_id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|c| !c.is_empty())
    }
}

pub struct RealtimeGateway {
    core: Arc<RealtimeCore>,
    registry: Arc<SessionRegistry>,
    validator: Arc<dyn SessionValidator>,
    welcome_message: String,
}

impl RealtimeGateway {
    pub fn new(
        core: Arc<RealtimeCore>,
        registry: Arc<SessionRegistry>,
        validator: Arc<dyn SessionValidator>,
        welcome_message: impl Into<String>,
    ) -> Self {
        Self {
            core,
            registry,
            validator,
            welcome_message: welcome_message.into(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Resolves the handshake identity. Runs before the upgrade.
    pub async fn authenticate(
        &self,
        params: &HandshakeParams,
    ) -> Result<AuthenticatedUser, AuthError> {
        let credential = params.credential().ok_or(AuthError::MissingCredential)?;
        self.validator.validate(credential).await
    }

    /// Registers the connection and greets it.
    pub fn connect(
        &self,
        user: &AuthenticatedUser,
        outbound: mpsc::Sender<OutboundFrame>,
    ) -> ConnectionId {
        let id = self.registry.register(&user.id, outbound);
        self.registry.send_to(
            id,
            ServerEvent::Welcome(WelcomeData {
                message: self.welcome_message.clone(),
                user_id: user.id.clone(),
            })
            .into(),
        );
        tracing::info!(connection_id = %id, user_id = %user.id, "client connected");
        id
    }

    pub fn disconnect(&self, id: ConnectionId) {
        if let Some(user) = self.registry.disconnect(id) {
            tracing::info!(connection_id = %id, user_id = %user, "client disconnected");
        }
    }

    /// Handles one text frame from the client.
    pub async fn handle_text(&self, id: ConnectionId, user: &UserId, text: &str) {
        let raw: Value = match serde_json::from_str(text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "ignoring non-JSON frame");
                return;
            }
        };

        match serde_json::from_value::<ClientCommand>(raw.clone()) {
            Ok(command) => self.handle_command(id, user, command).await,
            Err(e) => match ClientCommand::ack_id_of(&raw) {
                Some(ack_id) => {
                    self.reply(id, OutboundFrame::ack_failure(ack_id, "Malformed command"))
                        .await;
                }
                None => {
                    tracing::warn!(connection_id = %id, error = %e, "ignoring malformed command");
                }
            },
        }
    }

    pub async fn handle_command(&self, id: ConnectionId, user: &UserId, command: ClientCommand) {
        match command {
            ClientCommand::JoinConversation { conversation_id } => {
                self.join_conversation(id, user, conversation_id).await;
            }
            ClientCommand::LeaveConversation { conversation_id } => {
                self.leave_conversation(id, &conversation_id).await;
            }
            ClientCommand::MarkMessageRead {
                ack_id,
                conversation_id,
                message_id,
            } => {
                let result = self
                    .mark_message_read(user, &conversation_id, &message_id)
                    .await;
                match (ack_id, result) {
                    (Some(ack_id), Ok(())) => {
                        self.reply(id, OutboundFrame::ack_success(ack_id)).await;
                    }
                    (Some(ack_id), Err(error)) => {
                        self.reply(id, OutboundFrame::ack_failure(ack_id, error)).await;
                    }
                    (None, Err(error)) => {
                        tracing::debug!(connection_id = %id, error = %error, "unacknowledged read failed");
                    }
                    (None, Ok(())) => {}
                }
            }
        }
    }

    async fn join_conversation(&self, id: ConnectionId, user: &UserId, raw_id: String) {
        let result = match ConversationId::from_str(&raw_id) {
            Ok(conversation_id) => self
                .core
                .manager()
                .authorize_access(&conversation_id, user)
                .await
                .map(|_| conversation_id),
            Err(_) => Err(ConversationError::validation(
                "conversationId",
                "Invalid conversation id",
            )),
        };

        let reply = match result {
            Ok(conversation_id) => {
                self.registry
                    .join(id, RoomName::conversation(&conversation_id));
                ServerEvent::JoinedConversationSuccess(ConversationRef { conversation_id })
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, conversation_id = %raw_id, error = %e, "join refused");
                ServerEvent::JoinedConversationError(JoinErrorData {
                    conversation_id: raw_id,
                    error: e.message(),
                    code: e.code().to_string(),
                })
            }
        };
        self.reply(id, reply.into()).await;
    }

    async fn leave_conversation(&self, id: ConnectionId, raw_id: &str) {
        let Ok(conversation_id) = ConversationId::from_str(raw_id) else {
            tracing::debug!(connection_id = %id, conversation_id = raw_id, "leave with invalid id ignored");
            return;
        };
        self.registry
            .leave(id, &RoomName::conversation(&conversation_id));
        self.reply(
            id,
            ServerEvent::LeftConversationSuccess(ConversationRef { conversation_id }).into(),
        )
        .await;
    }

    async fn mark_message_read(
        &self,
        user: &UserId,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<(), String> {
        let conversation_id = ConversationId::from_str(conversation_id)
            .map_err(|_| "Invalid conversation id".to_string())?;
        let message_id =
            MessageId::from_str(message_id).map_err(|_| "Invalid message id".to_string())?;

        self.core
            .mark_message_read()
            .handle(
                MarkMessageReadCommand {
                    conversation_id,
                    message_id,
                },
                CommandMetadata::new(user.clone()).with_source("websocket"),
            )
            .await
            .map_err(|e| e.message())
    }

    /// Direct replies wait for queue space; only room fan-out is lossy.
    async fn reply(&self, id: ConnectionId, frame: OutboundFrame) {
        self.registry.deliver(id, frame).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::events::InMemoryEventBus;
    use crate::application::Stores;
    use crate::domain::message::{Message, MessageContent};
    use crate::ports::MessageRepository;
    use serde_json::json;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    struct Harness {
        gateway: RealtimeGateway,
        core: Arc<RealtimeCore>,
        stores: Stores,
    }

    fn harness() -> Harness {
        let registry = Arc::new(SessionRegistry::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let stores = Stores::in_memory();
        let core = Arc::new(RealtimeCore::new(stores.clone(), bus, registry.clone()));
        let validator = MockSessionValidator::new()
            .with_test_user("tok-alice", "alice")
            .with_test_user("tok-bob", "bob");
        Harness {
            gateway: RealtimeGateway::new(core.clone(), registry, Arc::new(validator), "hi"),
            core,
            stores,
        }
    }

    fn drain(rx: &mut mpsc::Receiver<OutboundFrame>) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::to_value(frame).unwrap());
        }
        frames
    }

    async fn connected(h: &Harness, token: &str) -> (ConnectionId, UserId, mpsc::Receiver<OutboundFrame>) {
        let params = HandshakeParams {
            token: Some(token.into()),
            user_id: None,
        };
        let authenticated = h.gateway.authenticate(&params).await.unwrap();
        let (tx, rx) = mpsc::channel(32);
        let id = h.gateway.connect(&authenticated, tx);
        (id, authenticated.id, rx)
    }

    #[test]
    fn credential_prefers_token_and_skips_blanks() {
        let both = HandshakeParams {
            token: Some("t".into()),
            user_id: Some("u".into()),
        };
        assert_eq!(both.credential(), Some("t"));

        let blank_token = HandshakeParams {
            token: Some("  ".into()),
            user_id: Some("u".into()),
        };
        assert_eq!(blank_token.credential(), Some("u"));
        assert_eq!(HandshakeParams::default().credential(), None);
    }

    #[tokio::test]
    async fn missing_identity_is_rejected() {
        let h = harness();
        let err = h
            .gateway
            .authenticate(&HandshakeParams::default())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[tokio::test]
    async fn connect_sends_welcome() {
        let h = harness();
        let (_id, _user, mut rx) = connected(&h, "tok-alice").await;

        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["event"], "welcome");
        assert_eq!(frames[0]["data"]["userId"], "alice");
        assert_eq!(frames[0]["data"]["message"], "hi");
    }

    #[tokio::test]
    async fn join_requires_membership() {
        let h = harness();
        let conv = h
            .core
            .manager()
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let frame = json!({"type": "joinConversation", "conversationId": conv.id().to_string()})
            .to_string();

        let (alice_conn, alice, mut alice_rx) = connected(&h, "tok-alice").await;
        drain(&mut alice_rx);
        h.gateway.handle_text(alice_conn, &alice, &frame).await;
        let frames = drain(&mut alice_rx);
        assert_eq!(frames[0]["event"], "joinedConversationSuccess");
        assert!(h
            .gateway
            .registry()
            .is_member(alice_conn, &RoomName::conversation(conv.id())));

        let validator_outsider = MockSessionValidator::new().with_test_user("tok-eve", "eve");
        let outsider_gateway = RealtimeGateway::new(
            h.core.clone(),
            h.gateway.registry().clone(),
            Arc::new(validator_outsider),
            "hi",
        );
        let eve = outsider_gateway
            .authenticate(&HandshakeParams {
                token: Some("tok-eve".into()),
                user_id: None,
            })
            .await
            .unwrap();
        let (tx, mut eve_rx) = mpsc::channel(8);
        let eve_conn = outsider_gateway.connect(&eve, tx);
        drain(&mut eve_rx);
        outsider_gateway.handle_text(eve_conn, &eve.id, &frame).await;

        let frames = drain(&mut eve_rx);
        assert_eq!(frames[0]["event"], "joinedConversationError");
        assert_eq!(frames[0]["data"]["code"], "FORBIDDEN");
        assert!(!h
            .gateway
            .registry()
            .is_member(eve_conn, &RoomName::conversation(conv.id())));
    }

    #[tokio::test]
    async fn join_with_bad_id_reports_validation_error() {
        let h = harness();
        let (conn, alice, mut rx) = connected(&h, "tok-alice").await;
        drain(&mut rx);

        h.gateway
            .handle_text(
                conn,
                &alice,
                r#"{"type":"joinConversation","conversationId":"nope"}"#,
            )
            .await;

        let frames = drain(&mut rx);
        assert_eq!(frames[0]["event"], "joinedConversationError");
        assert_eq!(frames[0]["data"]["conversationId"], "nope");
        assert_eq!(frames[0]["data"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn leave_is_unconditional() {
        let h = harness();
        let (conn, alice, mut rx) = connected(&h, "tok-alice").await;
        drain(&mut rx);
        let conversation_id = ConversationId::new();

        h.gateway
            .handle_command(
                conn,
                &alice,
                ClientCommand::LeaveConversation {
                    conversation_id: conversation_id.to_string(),
                },
            )
            .await;

        let frames = drain(&mut rx);
        assert_eq!(frames[0]["event"], "leftConversationSuccess");
        assert_eq!(frames[0]["data"]["conversationId"], conversation_id.to_string());
    }

    #[tokio::test]
    async fn mark_read_acks_once_and_pushes_count() {
        let h = harness();
        let conv = h
            .core
            .manager()
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let message = h
            .stores
            .messages
            .insert(Message::new(*conv.id(), user("alice"), MessageContent::text("yo").unwrap()))
            .await
            .unwrap();
        let (conn, bob, mut rx) = connected(&h, "tok-bob").await;
        drain(&mut rx);

        let frame = json!({
            "type": "markMessageRead",
            "ackId": 42,
            "conversationId": conv.id().to_string(),
            "messageId": message.id().to_string(),
        });
        h.gateway.handle_text(conn, &bob, &frame.to_string()).await;

        let frames = drain(&mut rx);
        let acks: Vec<_> = frames.iter().filter(|f| f["event"] == "ack").collect();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0]["ackId"], 42);
        assert_eq!(acks[0]["data"]["success"], true);
        assert!(frames.iter().any(|f| {
            f["event"] == "updatedUnreadMessagesCount" && f["data"]["count"] == 0
        }));
    }

    #[tokio::test]
    async fn ack_survives_a_full_outbound_queue() {
        let h = harness();
        let conv = h
            .core
            .manager()
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let message = h
            .stores
            .messages
            .insert(Message::new(*conv.id(), user("alice"), MessageContent::text("yo").unwrap()))
            .await
            .unwrap();
        let authenticated = h
            .gateway
            .authenticate(&HandshakeParams {
                token: Some("tok-bob".into()),
                user_id: None,
            })
            .await
            .unwrap();
        // Single slot, already taken by `welcome`.
        let (tx, mut rx) = mpsc::channel(1);
        let conn = h.gateway.connect(&authenticated, tx);

        let frame = json!({
            "type": "markMessageRead",
            "ackId": 7,
            "conversationId": conv.id().to_string(),
            "messageId": message.id().to_string(),
        });
        let reader = async {
            let mut names = Vec::new();
            while let Some(frame) = rx.recv().await {
                let name = frame.name().to_string();
                names.push(name.clone());
                if name == "ack" {
                    break;
                }
            }
            names
        };
        let frame_text = frame.to_string();
        let (_, names) = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            tokio::join!(
                h.gateway.handle_text(conn, &authenticated.id, &frame_text),
                reader
            )
        })
        .await
        .unwrap();

        assert_eq!(names.first().map(String::as_str), Some("welcome"));
        assert_eq!(names.iter().filter(|n| n.as_str() == "ack").count(), 1);
    }

    #[tokio::test]
    async fn mark_read_failure_is_acked_with_error() {
        let h = harness();
        let (conn, alice, mut rx) = connected(&h, "tok-alice").await;
        drain(&mut rx);

        let frame = json!({
            "type": "markMessageRead",
            "ackId": "a",
            "conversationId": ConversationId::new().to_string(),
            "messageId": MessageId::new().to_string(),
        });
        h.gateway.handle_text(conn, &alice, &frame.to_string()).await;

        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["event"], "ack");
        assert_eq!(frames[0]["data"]["success"], false);
        assert!(frames[0]["data"]["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn malformed_frames() {
        let h = harness();
        let (conn, alice, mut rx) = connected(&h, "tok-alice").await;
        drain(&mut rx);

        h.gateway.handle_text(conn, &alice, "not json").await;
        h.gateway
            .handle_text(conn, &alice, r#"{"type":"joinConversation"}"#)
            .await;
        assert!(drain(&mut rx).is_empty());

        h.gateway
            .handle_text(conn, &alice, r#"{"type":"markMessageRead","ackId":9}"#)
            .await;
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["ackId"], 9);
        assert_eq!(frames[0]["data"]["success"], false);
    }

    #[tokio::test]
    async fn disconnect_leaves_all_rooms() {
        let h = harness();
        let (conn, _alice, _rx) = connected(&h, "tok-alice").await;

        h.gateway.disconnect(conn);

        assert_eq!(h.gateway.registry().connection_count(), 0);
        assert_eq!(
            h.gateway
                .registry()
                .room_size(&RoomName::user(&user("alice"))),
            0
        );
    }
}
