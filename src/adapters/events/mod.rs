//! Event bus adapters.
//!
//! - `InMemoryEventBus` - in-process bus with failure isolation per handler

mod in_memory;

pub use in_memory::InMemoryEventBus;
