//! Application services shared by several handlers.

mod conversation_manager;
mod payload_shaper;
mod read_ledger;

pub use conversation_manager::{ConversationManager, GroupCreation};
pub use payload_shaper::PayloadShaper;
pub use read_ledger::ReadLedger;
