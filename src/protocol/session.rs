use crate::framing::{PrefixPolicy, TransportFramer};
use crate::protocol::protocol_error::ProtocolError;

pub const MIN_OUTPUT_LENGTH: usize = 32;
pub const MAX_OUTPUT_LENGTH: usize = 252;

/// Mutable per-connection framing parameters.
///
/// Owned by the protocol instance and passed explicitly into every framing
/// call; only the `CONFIG` command path writes it. Changes take effect for
/// subsequently framed messages only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_packet_size: usize,
    pub logging_enabled: bool,
    pub timestamp_enabled: bool,
    pub chunking_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_OUTPUT_LENGTH,
            logging_enabled: true,
            timestamp_enabled: true,
            chunking_enabled: true,
        }
    }
}

impl SessionConfig {
    /// Applies `OUTPUT_LENGTH`; out-of-range values are rejected and the
    /// previous value retained.
    pub fn set_output_length(&mut self, length: usize) -> Result<(), ProtocolError> {
        if !(MIN_OUTPUT_LENGTH..=MAX_OUTPUT_LENGTH).contains(&length) {
            return Err(ProtocolError::InvalidArgument(format!(
                "OUTPUT_LENGTH {length} outside [{MIN_OUTPUT_LENGTH},{MAX_OUTPUT_LENGTH}]"
            )));
        }
        self.max_packet_size = length;
        Ok(())
    }

    #[must_use]
    pub fn prefix_policy(&self) -> PrefixPolicy {
        if !self.chunking_enabled {
            PrefixPolicy::None
        } else if self.timestamp_enabled {
            PrefixPolicy::Timestamped
        } else {
            PrefixPolicy::Indexed
        }
    }

    /// Framer honoring the session's current settings.
    #[must_use]
    pub fn framer(&self) -> TransportFramer {
        TransportFramer::new(self.max_packet_size, self.prefix_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_length_bounds_are_enforced() {
        let mut s = SessionConfig::default();
        assert!(s.set_output_length(31).is_err());
        assert_eq!(s.max_packet_size, MAX_OUTPUT_LENGTH, "previous value retained");
        assert!(s.set_output_length(253).is_err());
        assert!(s.set_output_length(32).is_ok());
        assert_eq!(s.max_packet_size, 32);
        assert!(s.set_output_length(252).is_ok());
        assert_eq!(s.max_packet_size, 252);
    }

    #[test]
    fn prefix_policy_follows_flags() {
        let mut s = SessionConfig::default();
        assert_eq!(s.prefix_policy(), PrefixPolicy::Timestamped);
        s.timestamp_enabled = false;
        assert_eq!(s.prefix_policy(), PrefixPolicy::Indexed);
        s.chunking_enabled = false;
        assert_eq!(s.prefix_policy(), PrefixPolicy::None);
    }
}
