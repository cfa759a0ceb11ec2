//! Profile reader port - public profile fields used to populate payloads.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::realtime::UserSummary;

#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// Summaries for the requested users. Unknown users are simply absent.
    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, UserSummary>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ProfileReader) {}
}
