//! Application layer - services, command/query handlers and fan-out.
//!
//! Command handlers (write) and query handlers (read) orchestrate the domain
//! through ports; fan-out handlers react to the events they publish.

mod realtime_core;
pub mod handlers;
pub mod services;

pub use realtime_core::{RealtimeCore, Stores};
pub use services::{ConversationManager, GroupCreation, PayloadShaper, ReadLedger};
