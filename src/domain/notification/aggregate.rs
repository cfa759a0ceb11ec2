//! Notification entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{NotificationId, Timestamp, UserId};

/// What happened. New kinds may be added without breaking callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
    Mention,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Mention => "mention",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "follow" => Some(NotificationKind::Follow),
            "like" => Some(NotificationKind::Like),
            "comment" => Some(NotificationKind::Comment),
            "mention" => Some(NotificationKind::Mention),
            _ => None,
        }
    }
}

/// A notification from one user to another. Never addressed to its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    from: UserId,
    to: UserId,
    kind: NotificationKind,
    target: Option<String>,
    read: bool,
    created_at: Timestamp,
}

impl Notification {
    /// Builds an unread notification, or `None` for a self-notification.
    pub fn new(
        from: UserId,
        to: UserId,
        kind: NotificationKind,
        target: Option<String>,
    ) -> Option<Self> {
        if from == to {
            return None;
        }
        Some(Self {
            id: NotificationId::new(),
            from,
            to,
            kind,
            target,
            read: false,
            created_at: Timestamp::now(),
        })
    }

    /// Reconstitute a notification from persistence (no validation).
    pub fn reconstitute(
        id: NotificationId,
        from: UserId,
        to: UserId,
        kind: NotificationKind,
        target: Option<String>,
        read: bool,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            from,
            to,
            kind,
            target,
            read,
            created_at,
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn sender(&self) -> &UserId {
        &self.from
    }

    pub fn recipient(&self) -> &UserId {
        &self.to
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn self_notification_is_never_built() {
        let n = Notification::new(user("alice"), user("alice"), NotificationKind::Like, None);
        assert!(n.is_none());
    }

    #[test]
    fn notification_starts_unread() {
        let n = Notification::new(
            user("alice"),
            user("bob"),
            NotificationKind::Comment,
            Some("post-1".into()),
        )
        .unwrap();
        assert!(!n.is_read());
        assert_eq!(n.target(), Some("post-1"));
    }

    #[test]
    fn kind_parses_its_own_name() {
        for kind in [
            NotificationKind::Follow,
            NotificationKind::Like,
            NotificationKind::Comment,
            NotificationKind::Mention,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("poke"), None);
    }
}
