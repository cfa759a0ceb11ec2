//! WebSocket adapters for real-time conversation and notification updates.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Event Bus                                    │
//! │   InMemoryEventBus: message / conversation / notification events     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ fan-out handlers (application)
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    SessionRegistry (RealtimeFanout)                  │
//! │   Room: user:alice     Room: user:bob      Room: conversation:42     │
//! │   ├── conn-a           └── conn-c          ├── conn-a                │
//! │   └── conn-b                               └── conn-c                │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ bounded per-connection queues
//!                                     ▼
//!                      handler (axum socket tasks) ◀── gateway
//! ```
//!
//! - [`messages`] - client commands and outbound frames
//! - [`rooms`] - connection and room bookkeeping
//! - [`gateway`] - handshake and command handling, transport independent
//! - [`handler`] - axum WebSocket upgrade and socket tasks

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod rooms;

pub use gateway::{HandshakeParams, RealtimeGateway};
pub use handler::{realtime_router, realtime_ws_handler, RealtimeState};
pub use messages::{AckData, AckFrame, ClientCommand, OutboundFrame};
pub use rooms::{ConnectionId, SessionRegistry};
