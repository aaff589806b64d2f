pub mod byte_stream;
pub mod config;
pub mod errors;
pub mod message;
pub mod reassembler;
pub mod receiver;
pub mod sender;
pub mod tcp_flags;
pub mod tcp_segment;
pub mod wrap32;

// -- Re-export structs for more concise usage

pub use byte_stream::{ByteStream, Reader, Writer};
pub use config::TcpConfig;
pub use errors::{HeaderError, TcpError};
pub use message::{ReceiverMessage, SenderMessage};
pub use reassembler::Reassembler;
pub use receiver::TcpReceiver;
pub use sender::TcpSender;
pub use tcp_segment::TcpSegment;
pub use wrap32::Wrap32;
