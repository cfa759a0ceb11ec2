//! Authentication adapters implementing the `SessionValidator` port.
//!
//! - `jwt` - HS256 signed session tokens
//! - `trusted` - raw identity claims, development only
//! - `mock` - fixed token table for tests

mod jwt;
mod mock;
mod trusted;

pub use jwt::{JwtSessionValidator, SessionClaims};
pub use mock::MockSessionValidator;
pub use trusted::TrustedIdentityValidator;
