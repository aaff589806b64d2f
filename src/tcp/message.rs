use crate::tcp::wrap32::Wrap32;

/// A segment produced by the `TcpSender`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderMessage {
    pub seqno: Wrap32,
    pub syn: bool,
    pub payload: Vec<u8>,
    pub fin: bool,
}

impl SenderMessage {
    /// How many sequence numbers this segment occupies (SYN and FIN count as one each)
    pub fn sequence_length(&self) -> u64 {
        self.payload.len() as u64 + self.syn as u64 + self.fin as u64
    }
}

/// An acknowledgment produced by the `TcpReceiver`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiverMessage {
    pub ackno: Option<Wrap32>, // None until a SYN has been seen
    pub window_size: u16,
}
