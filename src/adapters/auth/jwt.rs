//! HS256 JWT session validator.
//!
//! The token subject is the user id. An optional `name` claim becomes the
//! display name.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

pub struct JwtSessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(secret: &Secret<String>, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(credential, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "rejected session token");
                    AuthError::InvalidToken
                }
            },
        )?;

        let id = UserId::new(data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser::new(id, data.claims.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-with-enough-length";

    fn token(sub: &str, exp_offset_secs: i64, iss: Option<&str>, secret: &str) -> String {
        let claims = SessionClaims {
            sub: sub.to_string(),
            name: Some("Alice".to_string()),
            exp: Utc::now().timestamp() + exp_offset_secs,
            iat: Some(Utc::now().timestamp()),
            iss: iss.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator(issuer: Option<&str>) -> JwtSessionValidator {
        JwtSessionValidator::new(&Secret::new(SECRET.to_string()), issuer)
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let user = validator(None)
            .validate(&token("alice", 3600, None, SECRET))
            .await
            .unwrap();

        assert_eq!(user.id.as_str(), "alice");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let result = validator(None)
            .validate(&token("alice", -3600, None, SECRET))
            .await;
        assert_eq!(result, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn wrong_signature_is_invalid() {
        let result = validator(None)
            .validate(&token("alice", 3600, None, "another-secret-entirely"))
            .await;
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn issuer_is_enforced_when_configured() {
        let v = validator(Some("huddle"));
        assert!(v
            .validate(&token("alice", 3600, Some("huddle"), SECRET))
            .await
            .is_ok());
        assert_eq!(
            v.validate(&token("alice", 3600, Some("elsewhere"), SECRET))
                .await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(
            validator(None).validate("not-a-jwt").await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn blank_subject_is_invalid() {
        assert_eq!(
            validator(None)
                .validate(&token("  ", 3600, None, SECRET))
                .await,
            Err(AuthError::InvalidToken)
        );
    }
}
