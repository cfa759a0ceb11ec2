//! End-to-end flows through the gateway, core and in-memory stores.
//!
//! Connections are plain mpsc queues, so everything a socket would have
//! received can be drained and inspected synchronously.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use huddle::adapters::auth::TrustedIdentityValidator;
use huddle::adapters::events::InMemoryEventBus;
use huddle::adapters::websocket::{
    ConnectionId, HandshakeParams, OutboundFrame, RealtimeGateway, SessionRegistry,
};
use huddle::application::handlers::conversation::{
    CreateGroupConversationCommand, LeaveConversationCommand, StartDirectConversationCommand,
};
use huddle::application::handlers::message::{GetMessagesQuery, SendMessageCommand};
use huddle::application::handlers::notification::{
    CreateNotificationCommand, CreateNotificationOutcome,
};
use huddle::application::{GroupCreation, RealtimeCore, Stores};
use huddle::domain::conversation::RemovalOutcome;
use huddle::domain::foundation::{AuthError, CommandMetadata, ConversationId, UserId};
use huddle::domain::message::Message;
use huddle::domain::notification::NotificationKind;
use huddle::ports::ConversationRepository;

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn as_user(id: &str) -> CommandMetadata {
    CommandMetadata::new(user(id))
}

struct Client {
    id: ConnectionId,
    user: UserId,
    rx: mpsc::Receiver<OutboundFrame>,
}

impl Client {
    fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(serde_json::to_value(frame).unwrap());
        }
        frames
    }

    fn drain_names(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|f| f["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

struct Server {
    core: Arc<RealtimeCore>,
    gateway: RealtimeGateway,
}

impl Server {
    fn start() -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let registry = Arc::new(SessionRegistry::new());
        let core = Arc::new(RealtimeCore::new(
            Stores::in_memory(),
            bus,
            registry.clone(),
        ));
        let gateway = RealtimeGateway::new(
            core.clone(),
            registry,
            Arc::new(TrustedIdentityValidator::new()),
            "Welcome to the real-time server!",
        );
        Self { core, gateway }
    }

    async fn connect(&self, id: &str) -> Client {
        let params = HandshakeParams {
            token: None,
            user_id: Some(id.to_string()),
        };
        let authenticated = self.gateway.authenticate(&params).await.unwrap();
        let (tx, rx) = mpsc::channel(64);
        let connection = self.gateway.connect(&authenticated, tx);
        let mut client = Client {
            id: connection,
            user: authenticated.id,
            rx,
        };
        assert_eq!(client.drain_names(), vec!["welcome"]);
        client
    }

    async fn send(&self, from: &str, conversation_id: ConversationId, text: &str) -> Message {
        self.core
            .send_message()
            .handle(
                SendMessageCommand {
                    conversation_id,
                    text: Some(text.to_string()),
                    image_url: None,
                },
                as_user(from),
            )
            .await
            .unwrap()
    }

    async fn command(&self, client: &Client, frame: Value) {
        self.gateway
            .handle_text(client.id, &client.user, &frame.to_string())
            .await;
    }
}

#[tokio::test]
async fn handshake_without_identity_is_refused() {
    let server = Server::start();

    let result = server.gateway.authenticate(&HandshakeParams::default()).await;

    assert_eq!(result.unwrap_err(), AuthError::MissingCredential);
}

#[tokio::test]
async fn direct_conversation_stays_hidden_until_first_message() {
    let server = Server::start();
    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;

    let conversation = server
        .core
        .start_direct()
        .handle(
            StartDirectConversationCommand { other: user("bob") },
            as_user("alice"),
        )
        .await
        .unwrap();

    assert!(bob.drain().is_empty());
    let bobs_list = server.core.manager().list_visible_to(&user("bob")).await.unwrap();
    assert!(bobs_list.is_empty());

    server.send("alice", *conversation.id(), "hi bob").await;

    let frames = bob.drain();
    assert_eq!(frames[0]["event"], "updatedConversation");
    assert_eq!(frames[1]["event"], "updatedUnreadMessagesCount");
    assert_eq!(frames[1]["data"]["count"], 1);
    assert_eq!(alice.drain_names(), vec!["updatedConversation"]);

    let bobs_list = server.core.manager().list_visible_to(&user("bob")).await.unwrap();
    assert_eq!(bobs_list.len(), 1);
}

#[tokio::test]
async fn opening_a_conversation_reads_it_and_keeps_the_count_at_zero() {
    let server = Server::start();
    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;
    let conversation = server
        .core
        .start_direct()
        .handle(
            StartDirectConversationCommand { other: user("bob") },
            as_user("alice"),
        )
        .await
        .unwrap();
    let conversation_id = *conversation.id();
    server.send("alice", conversation_id, "hi").await;
    alice.drain();
    let before = bob.drain();
    assert_eq!(before[1]["data"]["count"], 1);

    for _ in 0..2 {
        let views = server
            .core
            .get_messages()
            .handle(GetMessagesQuery { conversation_id }, as_user("bob"))
            .await
            .unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].text.as_deref(), Some("hi"));
        assert_eq!(views[0].read_by.len(), 2);
        assert!(views[0].read_by.contains(&user("alice")));
        assert!(views[0].read_by.contains(&user("bob")));

        let frames = bob.drain();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["event"], "updatedUnreadMessagesCount");
        assert_eq!(frames[0]["data"]["conversationId"], conversation_id.to_string());
        assert_eq!(frames[0]["data"]["count"], 0);
    }
    assert!(alice.drain().is_empty());
}

#[tokio::test]
async fn joined_room_receives_messages_and_read_acks() {
    let server = Server::start();
    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;
    let conversation = server
        .core
        .manager()
        .find_or_create_direct(&user("alice"), &user("bob"))
        .await
        .unwrap();
    let conversation_id = *conversation.id();
    server.send("alice", conversation_id, "first").await;
    bob.drain();
    alice.drain();

    server
        .command(
            &bob,
            json!({"type": "joinConversation", "conversationId": conversation_id.to_string()}),
        )
        .await;
    assert_eq!(bob.drain_names(), vec!["joinedConversationSuccess"]);

    let second = server.send("alice", conversation_id, "second").await;
    let frames = bob.drain();
    let names: Vec<&str> = frames.iter().filter_map(|f| f["event"].as_str()).collect();
    assert_eq!(
        names,
        vec!["newMessage", "updatedConversation", "updatedUnreadMessagesCount"]
    );
    assert_eq!(frames[0]["data"]["text"], "second");
    assert_eq!(frames[2]["data"]["count"], 2);

    server
        .command(
            &bob,
            json!({
                "type": "markMessageRead",
                "ackId": 9,
                "conversationId": conversation_id.to_string(),
                "messageId": second.id().to_string(),
            }),
        )
        .await;

    let frames = bob.drain();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["event"], "updatedUnreadMessagesCount");
    assert_eq!(frames[0]["data"]["count"], 1);
    assert_eq!(frames[1], json!({"event": "ack", "ackId": 9, "data": {"success": true}}));
}

#[tokio::test]
async fn outsider_cannot_join_or_mark_read() {
    let server = Server::start();
    let mut mallory = server.connect("mallory").await;
    let conversation = server
        .core
        .manager()
        .find_or_create_direct(&user("alice"), &user("bob"))
        .await
        .unwrap();
    let message = server.send("alice", *conversation.id(), "private").await;

    server
        .command(
            &mallory,
            json!({"type": "joinConversation", "conversationId": conversation.id().to_string()}),
        )
        .await;
    let frames = mallory.drain();
    assert_eq!(frames[0]["event"], "joinedConversationError");
    assert_eq!(frames[0]["data"]["code"], "FORBIDDEN");

    server
        .command(
            &mallory,
            json!({
                "type": "markMessageRead",
                "ackId": "m-1",
                "conversationId": conversation.id().to_string(),
                "messageId": message.id().to_string(),
            }),
        )
        .await;
    let frames = mallory.drain();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["ackId"], "m-1");
    assert_eq!(frames[0]["data"]["success"], false);
}

#[tokio::test]
async fn unknown_conversation_join_reports_not_found() {
    let server = Server::start();
    let mut alice = server.connect("alice").await;

    server
        .command(
            &alice,
            json!({"type": "joinConversation", "conversationId": ConversationId::new().to_string()}),
        )
        .await;

    let frames = alice.drain();
    assert_eq!(frames[0]["event"], "joinedConversationError");
    assert_eq!(frames[0]["data"]["code"], "CONVERSATION_NOT_FOUND");
}

#[tokio::test]
async fn group_lifecycle_reaches_every_member() {
    let server = Server::start();
    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;
    let mut carol = server.connect("carol").await;

    let created = server
        .core
        .create_group()
        .handle(
            CreateGroupConversationCommand {
                members: vec![user("bob"), user("carol")],
                name: Some("weekend".into()),
            },
            as_user("alice"),
        )
        .await
        .unwrap();
    let GroupCreation::Group(group) = created else {
        panic!("three members should form a group");
    };
    for client in [&mut alice, &mut bob, &mut carol] {
        assert_eq!(client.drain_names(), vec!["newGroupConversation"]);
    }

    let outcome = server
        .core
        .leave_conversation()
        .handle(
            LeaveConversationCommand {
                conversation_id: *group.id(),
            },
            as_user("carol"),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, RemovalOutcome::GroupUpdated(_)));
    assert_eq!(carol.drain_names(), vec!["deletedConversation"]);
    assert!(alice.drain_names().contains(&"updatedConversation".to_string()));

    for leaver in ["bob", "alice"] {
        server
            .core
            .leave_conversation()
            .handle(
                LeaveConversationCommand {
                    conversation_id: *group.id(),
                },
                as_user(leaver),
            )
            .await
            .unwrap();
    }

    assert!(!server
        .core
        .stores()
        .conversations
        .exists(group.id())
        .await
        .unwrap());
    assert!(alice.drain_names().contains(&"deletedConversation".to_string()));
}

#[tokio::test]
async fn notifications_reach_every_connection_of_the_recipient() {
    let server = Server::start();
    let mut phone = server.connect("bob").await;
    let mut laptop = server.connect("bob").await;

    let outcome = server
        .core
        .create_notification()
        .handle(
            CreateNotificationCommand {
                recipient: user("bob"),
                kind: NotificationKind::Like,
                target: Some("post-7".into()),
            },
            as_user("alice"),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CreateNotificationOutcome::Created(_)));

    for client in [&mut phone, &mut laptop] {
        let frames = client.drain();
        assert_eq!(frames[0]["event"], "newNotification");
        assert_eq!(frames[1]["event"], "updatedNotificationCount");
        assert_eq!(frames[1]["data"]["count"], 1);
    }

    let suppressed = server
        .core
        .create_notification()
        .handle(
            CreateNotificationCommand {
                recipient: user("bob"),
                kind: NotificationKind::Follow,
                target: None,
            },
            as_user("bob"),
        )
        .await
        .unwrap();
    assert!(matches!(suppressed, CreateNotificationOutcome::Suppressed));
    assert!(phone.drain().is_empty());
}

#[tokio::test]
async fn disconnect_removes_connection_from_rooms() {
    let server = Server::start();
    let bob = server.connect("bob").await;
    assert_eq!(server.gateway.registry().connection_count(), 1);

    server.gateway.disconnect(bob.id);

    assert_eq!(server.gateway.registry().connection_count(), 0);
}
