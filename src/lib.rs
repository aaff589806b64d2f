//! The reliable byte-stream half of a TCP/IP stack.
//!
//! A [`tcp::TcpSender`] slices an outbound [`tcp::ByteStream`] into segments and retransmits
//! them until acknowledged. A [`tcp::TcpReceiver`] positions arriving segments by unwrapping
//! their 32-bit sequence numbers, and a [`tcp::Reassembler`] writes them back in order into an
//! inbound `ByteStream`. Everything is synchronous and driven by the caller's own event loop.

pub mod tcp;
