//! Real-time gateway configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Upper bound for a connection's outbound queue.
pub const MAX_OUTBOUND_BUFFER: usize = 4096;

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Frames queued per connection before new ones are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Text of the `welcome` event sent after the handshake
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

impl RealtimeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_buffer == 0 || self.outbound_buffer > MAX_OUTBOUND_BUFFER {
            return Err(ValidationError::InvalidOutboundBuffer(MAX_OUTBOUND_BUFFER));
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            welcome_message: default_welcome_message(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_welcome_message() -> String {
    "Welcome to the real-time server!".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RealtimeConfig::default();
        assert_eq!(config.outbound_buffer, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_buffer_bounds() {
        for outbound_buffer in [0, MAX_OUTBOUND_BUFFER + 1] {
            let config = RealtimeConfig {
                outbound_buffer,
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }
}
