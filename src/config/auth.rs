//! Authentication configuration
//!
//! With a `jwt_secret`, handshakes must carry an HS256 token. Without one,
//! the `userId` query parameter is trusted as-is, which is only allowed
//! outside production.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Minimum HS256 key length, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing key shared with the identity service
    pub jwt_secret: Option<Secret<String>>,

    /// Expected `iss` claim, if any
    pub jwt_issuer: Option<String>,
}

impl AuthConfig {
    /// True when identity claims are accepted without a token.
    pub fn is_trusted_mode(&self) -> bool {
        self.jwt_secret.is_none()
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        match &self.jwt_secret {
            Some(secret) if secret.expose_secret().len() < MIN_JWT_SECRET_LEN => {
                Err(ValidationError::JwtSecretTooShort(MIN_JWT_SECRET_LEN))
            }
            Some(_) => Ok(()),
            None if *environment == Environment::Production => {
                Err(ValidationError::TrustedIdentityInProduction)
            }
            None => Ok(()),
        }
    }
}
