//! StartDirectConversationHandler - open (or reopen) a one-to-one conversation.

use std::sync::Arc;

use crate::application::services::ConversationManager;
use crate::domain::conversation::{Conversation, ConversationError};
use crate::domain::foundation::{CommandMetadata, UserId};

#[derive(Debug, Clone)]
pub struct StartDirectConversationCommand {
    pub other: UserId,
}

/// Creation is silent: the other party only sees the conversation once a
/// message arrives.
pub struct StartDirectConversationHandler {
    manager: Arc<ConversationManager>,
}

impl StartDirectConversationHandler {
    pub fn new(manager: Arc<ConversationManager>) -> Self {
        Self { manager }
    }

    pub async fn handle(
        &self,
        cmd: StartDirectConversationCommand,
        metadata: CommandMetadata,
    ) -> Result<Conversation, ConversationError> {
        self.manager
            .find_or_create_direct(&metadata.user_id, &cmd.other)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, Fixture};

    #[tokio::test]
    async fn starting_twice_yields_same_conversation() {
        let fx = Fixture::new();
        let handler = StartDirectConversationHandler::new(fx.manager.clone());

        let a = handler
            .handle(
                StartDirectConversationCommand { other: user("bob") },
                CommandMetadata::test_fixture("alice"),
            )
            .await
            .unwrap();
        let b = handler
            .handle(
                StartDirectConversationCommand { other: user("bob") },
                CommandMetadata::test_fixture("alice"),
            )
            .await
            .unwrap();

        assert_eq!(a.id(), b.id());
        assert!(!b.is_visible_to(&user("bob")));
    }
}
