//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, events)
//! - `conversation` - Direct and group conversation aggregate
//! - `message` - Messages and read state
//! - `notification` - User notifications
//! - `realtime` - Rooms and the server → client event vocabulary

pub mod conversation;
pub mod foundation;
pub mod message;
pub mod notification;
pub mod realtime;
