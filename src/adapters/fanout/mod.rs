//! Fan-out adapters other than the live WebSocket registry.

mod recording;

pub use recording::RecordingFanout;
