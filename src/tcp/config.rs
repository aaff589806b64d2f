use crate::tcp::errors::TcpError;
use crate::tcp::wrap32::Wrap32;

/// Default capacity of each direction's byte stream
pub const DEFAULT_CAPACITY: u64 = 64_000;

/// Largest payload the sender packs into one segment
pub const MAX_PAYLOAD_SIZE: usize = 1000;

/// Default initial retransmission timeout, in milliseconds
pub const TIMEOUT_DFLT: u64 = 1000;

/// Consecutive retransmissions after which a caller should give up on the peer
pub const MAX_RETX_ATTEMPTS: u64 = 8;

/// Per-connection tunables
#[derive(Debug, Clone, PartialEq)]
pub struct TcpConfig {
    pub capacity: u64,             // Byte stream capacity, each direction
    pub initial_rto_ms: u64,       // Initial retransmission timeout
    pub max_payload_size: usize,   // Max payload bytes per segment
    pub fixed_isn: Option<Wrap32>, // Fixed ISN for deterministic tests; random if None
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            capacity: DEFAULT_CAPACITY,
            initial_rto_ms: TIMEOUT_DFLT,
            max_payload_size: MAX_PAYLOAD_SIZE,
            fixed_isn: None,
        }
    }
}

impl TcpConfig {
    /// Check that every tunable is usable
    pub fn validate(&self) -> Result<(), TcpError> {
        if self.capacity == 0 {
            return Err(TcpError::InvalidConfig("capacity must be nonzero".to_string()));
        }
        if self.initial_rto_ms == 0 {
            return Err(TcpError::InvalidConfig("initial RTO must be nonzero".to_string()));
        }
        if self.max_payload_size == 0 {
            return Err(TcpError::InvalidConfig("max payload size must be nonzero".to_string()));
        }
        Ok(())
    }
}
