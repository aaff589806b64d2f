use crate::tcp::byte_stream::Writer;
use crate::tcp::message::{ReceiverMessage, SenderMessage};
use crate::tcp::reassembler::Reassembler;
use crate::tcp::wrap32::Wrap32;
use tracing::{debug, trace};

/// The receiver end of a TCP connection
#[derive(Debug, Default)]
pub struct TcpReceiver {
    zero_point: Option<Wrap32>, // The peer's ISN, once its SYN arrives
    fin_seen: bool,
}

impl TcpReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zero_point(&self) -> Option<Wrap32> {
        self.zero_point
    }

    /// Place a segment from the peer's sender into `inbound` by way of the `reassembler`
    pub fn receive(&mut self, msg: &SenderMessage, reassembler: &mut Reassembler, inbound: &mut impl Writer) {
        let mut seqno = msg.seqno;
        if msg.syn {
            if self.zero_point.is_none() {
                debug!(isn = %msg.seqno, "SYN received");
            }
            self.zero_point = Some(msg.seqno);
            seqno = seqno + 1u32; // SYN occupies the first sequence number
        }

        let Some(zero_point) = self.zero_point else {
            trace!(seqno = %msg.seqno, "ignoring segment before SYN");
            return;
        };

        if msg.payload.is_empty() && !msg.fin {
            return;
        }

        // Index 0 of the byte stream is absolute seq number 1, just after the SYN
        let abs_seqno = seqno.unwrap(zero_point, inbound.bytes_pushed());
        let Some(first_index) = abs_seqno.checked_sub(1) else {
            trace!(seqno = %msg.seqno, "ignoring segment on the SYN slot");
            return;
        };

        if msg.fin && !self.fin_seen {
            debug!(first_index, len = msg.payload.len(), "FIN received");
            self.fin_seen = true;
        }

        reassembler.insert(first_index, &msg.payload, msg.fin, inbound);
    }

    /// The ack and window to advertise back to the peer's sender
    pub fn send(&self, inbound: &impl Writer) -> ReceiverMessage {
        let window_size = inbound.available_capacity().min(u16::MAX as u64) as u16;

        let ackno = self.zero_point.map(|zero_point| {
            // SYN, then FIN once the stream has actually ended
            let mut offset = 1;
            if self.fin_seen && inbound.is_closed() {
                offset += 1;
            }
            Wrap32::wrap(inbound.bytes_pushed() + offset, zero_point)
        });

        ReceiverMessage { ackno, window_size }
    }
}

// -- Unit tests --
