//! In-memory profile directory.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::realtime::UserSummary;
use crate::ports::ProfileReader;

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<UserId, UserSummary>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, summary: UserSummary) -> Self {
        self.upsert(summary);
        self
    }

    pub fn upsert(&self, summary: UserSummary) {
        self.profiles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(summary.id.clone(), summary);
    }
}

#[async_trait]
impl ProfileReader for InMemoryProfileStore {
    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, UserSummary>, DomainError> {
        let profiles = self.profiles.read().unwrap_or_else(|e| e.into_inner());
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_users_are_absent() {
        let alice = UserId::new("alice").unwrap();
        let store = InMemoryProfileStore::new().with_profile(UserSummary {
            username: Some("alice".into()),
            ..UserSummary::bare(alice.clone())
        });

        let found = store
            .find_summaries(&[alice.clone(), UserId::new("ghost").unwrap()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[&alice].username.as_deref(), Some("alice"));
    }
}
