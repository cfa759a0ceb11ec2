//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - session validators (JWT, trusted claims, mock)
//! - `events` - in-process event bus
//! - `fanout` - recording fan-out for tests and tooling
//! - `memory` - in-memory stores
//! - `postgres` - PostgreSQL stores and migrations
//! - `websocket` - session registry and the real-time gateway

pub mod auth;
pub mod events;
pub mod fanout;
pub mod memory;
pub mod postgres;
pub mod websocket;

pub use events::InMemoryEventBus;
pub use fanout::RecordingFanout;
pub use websocket::{RealtimeGateway, SessionRegistry};
