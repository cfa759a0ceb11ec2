//! Session validation port.
//!
//! Resolves the credential presented with a real-time handshake into an
//! `AuthenticatedUser`. Implementations exist for signed JWTs, trusted
//! identity claims (development), and a mock for tests.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates connection credentials and extracts user identity.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed or badly signed credentials
/// - `AuthError::TokenExpired` for expired credentials
/// - `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, credential: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::collections::HashMap;

    struct TestSessionValidator {
        tokens: HashMap<String, AuthenticatedUser>,
    }

    #[async_trait]
    impl SessionValidator for TestSessionValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn session_validator_resolves_known_tokens() {
        let user = AuthenticatedUser::new(UserId::new("user-123").unwrap(), None);
        let validator = TestSessionValidator {
            tokens: HashMap::from([("tok".to_string(), user.clone())]),
        };

        assert_eq!(validator.validate("tok").await, Ok(user));
        assert_eq!(
            validator.validate("other").await,
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn session_validator_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SessionValidator>();
    }
}
