//! Conversation aggregate.
//!
//! A conversation is either a Direct pair or a Group. Membership is
//! `participants`; `visible_to` is the subset that currently sees the
//! conversation in their list.
//!
//! # Invariants
//!
//! - `visible_to` is always a subset of `participants`
//! - Direct conversations have exactly two participants, forever
//! - A Direct conversation starts visible only to its creator and becomes
//!   visible to the other party on the first message
//! - `last_message` never moves backwards in time
//!
//! The mutators here are the single-writer semantics of each store update.
//! Stores apply them under their own atomicity guarantee (one lock, one SQL
//! statement), never as read-modify-write across two store calls.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};

use super::ConversationError;

/// Maximum length for a group name.
pub const MAX_GROUP_NAME_LENGTH: usize = 100;

/// Conversation kind, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::Direct => "direct",
            ConversationKind::Group => "group",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(ConversationKind::Direct),
            "group" => Some(ConversationKind::Group),
            _ => None,
        }
    }
}

/// Pointer to the newest message of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessageRef {
    pub message_id: MessageId,
    pub at: Timestamp,
}

/// Canonical key of a direct conversation: the two participants, sorted.
///
/// Stores keep this key under a uniqueness constraint so that concurrent
/// "start conversation" requests for the same pair converge on one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectPairKey {
    low: UserId,
    high: UserId,
}

impl DirectPairKey {
    /// Builds the key for two distinct users, in either order.
    pub fn new(a: UserId, b: UserId) -> Result<Self, ConversationError> {
        if a == b {
            return Err(ConversationError::validation(
                "participant",
                "cannot start a conversation with yourself",
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    pub fn members(&self) -> (&UserId, &UserId) {
        (&self.low, &self.high)
    }

    /// Length-prefixed encoding, unambiguous for arbitrary user id strings.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}|{}",
            self.low.as_str().len(),
            self.low.as_str(),
            self.high.as_str()
        )
    }
}

impl fmt::Display for DirectPairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// What the caller asked for when creating a group, after deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedMembers {
    /// Only one other person: the request collapses to a direct conversation.
    Pair(UserId),
    /// Three or more distinct members, creator included.
    Group(BTreeSet<UserId>),
}

impl RequestedMembers {
    /// Deduplicates `members ∪ {creator}` and classifies the result.
    pub fn resolve(
        creator: &UserId,
        members: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, ConversationError> {
        let mut all: BTreeSet<UserId> = members.into_iter().collect();
        all.insert(creator.clone());

        match all.len() {
            0 | 1 => Err(ConversationError::validation(
                "members",
                "a conversation needs at least one other member",
            )),
            2 => {
                let other = all
                    .into_iter()
                    .find(|m| m != creator)
                    .ok_or_else(|| ConversationError::validation("members", "missing member"))?;
                Ok(RequestedMembers::Pair(other))
            }
            _ => Ok(RequestedMembers::Group(all)),
        }
    }
}

/// Result of removing a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Direct conversation hidden for the caller; the other side is untouched.
    HiddenForSelf,
    /// Group lost a member and still has visible members.
    GroupUpdated(Conversation),
    /// Group lost its last visible member and was deleted.
    GroupDeleted,
}

/// Conversation aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    kind: ConversationKind,
    name: Option<String>,
    participants: BTreeSet<UserId>,
    visible_to: BTreeSet<UserId>,
    last_message: Option<LastMessageRef>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Conversation {
    /// Creates a direct conversation visible only to `creator`.
    pub fn new_direct(creator: UserId, other: UserId) -> Result<Self, ConversationError> {
        DirectPairKey::new(creator.clone(), other.clone())?;

        let now = Timestamp::now();
        let mut visible_to = BTreeSet::new();
        visible_to.insert(creator.clone());
        Ok(Self {
            id: ConversationId::new(),
            kind: ConversationKind::Direct,
            name: None,
            participants: [creator, other].into_iter().collect(),
            visible_to,
            last_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a group conversation visible to all of its members.
    pub fn new_group(
        members: BTreeSet<UserId>,
        name: Option<String>,
    ) -> Result<Self, ConversationError> {
        if members.len() < 3 {
            return Err(ConversationError::validation(
                "members",
                "a group needs at least three distinct members",
            ));
        }
        let name = Self::normalize_name(name)?;

        let now = Timestamp::now();
        Ok(Self {
            id: ConversationId::new(),
            kind: ConversationKind::Group,
            name,
            visible_to: members.clone(),
            participants: members,
            last_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a conversation from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ConversationId,
        kind: ConversationKind,
        name: Option<String>,
        participants: BTreeSet<UserId>,
        visible_to: BTreeSet<UserId>,
        last_message: Option<LastMessageRef>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            name,
            participants,
            visible_to,
            last_message,
            created_at,
            updated_at,
        }
    }

    fn normalize_name(name: Option<String>) -> Result<Option<String>, ConversationError> {
        match name.map(|n| n.trim().to_string()) {
            Some(n) if n.is_empty() => Ok(None),
            Some(n) if n.chars().count() > MAX_GROUP_NAME_LENGTH => Err(
                ConversationError::validation("name", "group name is too long"),
            ),
            other => Ok(other),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Accessors
    // ════════════════════════════════════════════════════════════════════════

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn kind(&self) -> ConversationKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn participants(&self) -> &BTreeSet<UserId> {
        &self.participants
    }

    pub fn visible_to(&self) -> &BTreeSet<UserId> {
        &self.visible_to
    }

    pub fn last_message(&self) -> Option<&LastMessageRef> {
        self.last_message.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    pub fn is_visible_to(&self, user: &UserId) -> bool {
        self.visible_to.contains(user)
    }

    /// Pair key for direct conversations.
    pub fn pair_key(&self) -> Option<DirectPairKey> {
        match self.kind {
            ConversationKind::Direct => {
                let mut it = self.participants.iter().cloned();
                match (it.next(), it.next()) {
                    (Some(a), Some(b)) => DirectPairKey::new(a, b).ok(),
                    _ => None,
                }
            }
            ConversationKind::Group => None,
        }
    }

    /// A group with nobody left seeing it.
    pub fn is_abandoned(&self) -> bool {
        self.kind == ConversationKind::Group && self.visible_to.is_empty()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Store-level mutations
    // ════════════════════════════════════════════════════════════════════════

    /// Set-union `user` into `visible_to`. Only participants can be revealed.
    pub fn reveal_to(&mut self, user: &UserId) -> bool {
        if !self.participants.contains(user) {
            return false;
        }
        self.visible_to.insert(user.clone())
    }

    /// Advances the last-message pointer and, for direct conversations,
    /// reveals the conversation to both parties.
    ///
    /// A pointer older than the current one is ignored.
    pub fn record_message(&mut self, latest: LastMessageRef) {
        let advances = match &self.last_message {
            Some(current) => !latest.at.is_before(&current.at),
            None => true,
        };
        if advances {
            self.last_message = Some(latest);
            if latest.at.is_after(&self.updated_at) {
                self.updated_at = latest.at;
            }
        }
        if self.kind == ConversationKind::Direct {
            self.visible_to.extend(self.participants.iter().cloned());
        }
    }

    /// Replaces the pointer unconditionally (used after a message delete).
    pub fn repoint_last_message(&mut self, latest: Option<LastMessageRef>) {
        self.last_message = latest;
        self.updated_at = Timestamp::now();
    }

    /// Applies the removal rules for `user` and reports what happened.
    ///
    /// Direct: pull from `visible_to` only. Group: pull from both sets.
    pub fn remove_participant(&mut self, user: &UserId) -> RemovalOutcome {
        match self.kind {
            ConversationKind::Direct => {
                self.visible_to.remove(user);
                RemovalOutcome::HiddenForSelf
            }
            ConversationKind::Group => {
                self.visible_to.remove(user);
                self.participants.remove(user);
                self.updated_at = Timestamp::now();
                if self.is_abandoned() {
                    RemovalOutcome::GroupDeleted
                } else {
                    RemovalOutcome::GroupUpdated(self.clone())
                }
            }
        }
    }
}
