use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum HeaderError {
    #[error("Invalid buffer: expected {expected} bytes, found {found} bytes")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("Bad checksum: {0:#06x}")]
    BadChecksum(u16),

    #[error("Bad data offset: {0}")]
    BadDataOffset(u8),
}

#[derive(Error, Debug)]
pub enum TcpError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
