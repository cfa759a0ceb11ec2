//! Authentication types for the domain layer.
//!
//! `AuthenticatedUser` is what every `SessionValidator` adapter produces once
//! a connection credential has been checked. It carries only the identity the
//! real-time core needs.

use super::UserId;
use thiserror::Error;

/// Identity resolved from a connection credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier.
    pub id: UserId,

    /// Display name if the credential carried one.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, display_name: Option<String>) -> Self {
        Self { id, display_name }
    }
}

/// Authentication errors that can occur during credential validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was supplied with the handshake.
    #[error("Identity required")]
    MissingCredential,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication backend is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if the client should reconnect with a fresh credential.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCredential | AuthError::InvalidToken | AuthError::TokenExpired
        )
    }
}
