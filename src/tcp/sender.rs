use crate::tcp::byte_stream::Reader;
use crate::tcp::config::{TcpConfig, MAX_PAYLOAD_SIZE};
use crate::tcp::message::{ReceiverMessage, SenderMessage};
use crate::tcp::wrap32::Wrap32;
use rand::Rng;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Retransmission timer, driven by `tick`
#[derive(Debug)]
struct RetxTimer {
    initial_rto_ms: u64,
    rto_ms: u64,     // Current timeout, doubled on each backoff
    elapsed_ms: u64, // Time since the timer was (re)started
    running: bool,
}

impl RetxTimer {
    fn new(initial_rto_ms: u64) -> Self {
        RetxTimer {
            initial_rto_ms,
            rto_ms: initial_rto_ms,
            elapsed_ms: 0,
            running: false,
        }
    }

    fn reset(&mut self) {
        self.elapsed_ms = 0;
        self.rto_ms = self.initial_rto_ms;
    }

    fn expired(&self) -> bool {
        self.elapsed_ms >= self.rto_ms
    }
}

/// The sender end of a TCP connection
#[derive(Debug)]
pub struct TcpSender {
    isn: Wrap32,                            // Initial seq number
    next_seqno: u64,                        // Absolute seq number of the next byte to send
    acked_seqno: u64,                       // Absolute seq number of the first un'acked byte
    window_size: u16,                       // Advertised window from receiver
    max_payload_size: usize,                // Max payload bytes per segment
    syn_sent: bool,                         // Has the SYN been queued?
    fin_sent: bool,                         // Has the FIN been queued?
    ready: VecDeque<SenderMessage>,         // New segments waiting for `maybe_send`
    retransmits: VecDeque<SenderMessage>,   // Timed-out segments waiting for `maybe_send`
    outstanding: VecDeque<SenderMessage>,   // Sent but un'acked segments, in seq order
    consecutive_retx: u64,                  // Retransmissions since the last useful ack
    timer: RetxTimer,
}

impl TcpSender {
    pub fn new(initial_rto_ms: u64, isn: Wrap32) -> Self {
        TcpSender {
            isn,
            next_seqno: 0,
            acked_seqno: 0,
            window_size: 1, // Enough to send the SYN before hearing from the peer
            max_payload_size: MAX_PAYLOAD_SIZE,
            syn_sent: false,
            fin_sent: false,
            ready: VecDeque::new(),
            retransmits: VecDeque::new(),
            outstanding: VecDeque::new(),
            consecutive_retx: 0,
            timer: RetxTimer::new(initial_rto_ms),
        }
    }

    /// Build a sender from `config`, drawing the ISN from `rng` unless the config fixes one
    pub fn from_config<R: Rng + ?Sized>(config: &TcpConfig, rng: &mut R) -> Self {
        let isn = config.fixed_isn.unwrap_or_else(|| Wrap32::random(rng));
        let mut sender = TcpSender::new(config.initial_rto_ms, isn);
        sender.max_payload_size = config.max_payload_size;
        sender
    }

    pub fn isn(&self) -> Wrap32 {
        self.isn
    }

    /// How many sequence numbers are outstanding?
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.next_seqno - self.acked_seqno
    }

    /// How many consecutive *re*transmissions have happened?
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retx
    }

    pub fn current_rto_ms(&self) -> u64 {
        self.timer.rto_ms
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.running
    }

    /// Fill the receiver's window with segments built from `outbound`
    pub fn push(&mut self, outbound: &mut impl Reader) {
        if self.fin_sent {
            return;
        }

        // A zero window still gets probed with one sequence number
        let window = u64::from(self.window_size.max(1));

        while window > self.sequence_numbers_in_flight() {
            let room = window - self.sequence_numbers_in_flight();
            let mut msg = SenderMessage {
                seqno: Wrap32::wrap(self.next_seqno, self.isn),
                ..Default::default()
            };

            if !self.syn_sent {
                self.syn_sent = true;
                msg.syn = true;
            }

            let len = (self.max_payload_size as u64)
                .min(outbound.bytes_buffered())
                .min(room - msg.syn as u64);
            outbound.read_into(len, &mut msg.payload);

            if outbound.is_finished() && msg.sequence_length() < room {
                self.fin_sent = true;
                msg.fin = true;
            }

            if msg.sequence_length() == 0 {
                break;
            }

            trace!(
                seqno = %msg.seqno,
                len = msg.payload.len(),
                syn = msg.syn,
                fin = msg.fin,
                "queueing segment"
            );
            self.next_seqno += msg.sequence_length();
            let done = msg.fin || outbound.bytes_buffered() == 0;
            self.ready.push_back(msg);
            if done {
                break;
            }
        }
    }

    /// The next segment to put on the wire, if any
    pub fn maybe_send(&mut self) -> Option<SenderMessage> {
        // Resent segments are already tracked as outstanding
        if let Some(msg) = self.retransmits.pop_front() {
            return Some(msg);
        }

        let msg = self.ready.pop_front()?;
        self.outstanding.push_back(msg.clone());
        if !self.timer.running {
            self.timer.running = true;
            self.timer.elapsed_ms = 0;
        }
        Some(msg)
    }

    /// A zero-length segment carrying the current seq number
    pub fn send_empty_message(&self) -> SenderMessage {
        SenderMessage {
            seqno: Wrap32::wrap(self.next_seqno, self.isn),
            ..Default::default()
        }
    }

    /// Take in an ack and window update from the peer's receiver
    pub fn receive(&mut self, msg: &ReceiverMessage) {
        if let Some(ackno) = msg.ackno {
            let abs_ackno = ackno.unwrap(self.isn, self.next_seqno);
            if abs_ackno > self.next_seqno || abs_ackno < self.acked_seqno {
                trace!(
                    %ackno,
                    abs_ackno,
                    next_seqno = self.next_seqno,
                    acked_seqno = self.acked_seqno,
                    "ignoring unusable ack"
                );
                self.window_size = msg.window_size;
                return;
            }
            self.acked_seqno = abs_ackno;
        }

        self.window_size = msg.window_size;

        while let Some(front) = self.outstanding.front() {
            let seg_end = front.seqno.unwrap(self.isn, self.next_seqno) + front.sequence_length();
            if seg_end > self.acked_seqno {
                break;
            }
            self.outstanding.pop_front();

            // A peer with a closed window hasn't proven it is healthy again
            if self.window_size != 0 {
                self.timer.reset();
                self.consecutive_retx = 0;
            }
        }

        let acked_seqno = self.acked_seqno;
        let (isn, checkpoint) = (self.isn, self.next_seqno);
        self.retransmits
            .retain(|seg| seg.seqno.unwrap(isn, checkpoint) + seg.sequence_length() > acked_seqno);

        self.timer.running = !self.outstanding.is_empty();
    }

    /// Advance the retransmission timer by `ms_since_last_tick`
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        if !self.timer.running {
            return;
        }

        self.timer.elapsed_ms = self.timer.elapsed_ms.saturating_add(ms_since_last_tick);
        if !self.timer.expired() {
            return;
        }

        if let Some(oldest) = self.outstanding.front() {
            debug!(
                seqno = %oldest.seqno,
                rto_ms = self.timer.rto_ms,
                attempt = self.consecutive_retx + 1,
                "retransmitting oldest outstanding segment"
            );

            // At most one copy waits for `maybe_send`
            if !self.retransmits.iter().any(|seg| seg.seqno == oldest.seqno) {
                self.retransmits.push_back(oldest.clone());
            }

            // Probing a zero window does not count against the peer
            if self.window_size != 0 {
                self.consecutive_retx += 1;
                self.timer.rto_ms = self.timer.rto_ms.saturating_mul(2);
            }
        }
        self.timer.elapsed_ms = 0;
    }
}

// -- Unit tests --
