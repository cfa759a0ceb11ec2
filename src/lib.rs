//! Huddle - real-time conversations and notification fan-out.
//!
//! Direct and group conversations with lazy visibility, per-user read
//! state, notifications, and a WebSocket gateway that pushes every change
//! to the rooms that care about it.
//!
//! Layout:
//! - [`domain`] - aggregates, events and value types
//! - [`ports`] - interfaces the application depends on
//! - [`application`] - command/query handlers, services and fan-out wiring
//! - [`adapters`] - stores, event bus, auth and the WebSocket gateway
//! - [`config`] - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
