use crate::tcp::errors::HeaderError;
use crate::tcp::message::{ReceiverMessage, SenderMessage};
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::wrap32::Wrap32;
use std::net::Ipv4Addr;

const HEADER_LEN: usize = 20;
const PROTOCOL_TCP: u8 = 6;

/// A full TCP segment: one direction's sender half plus the other direction's ack.
///
/// This is the unit handed to (and received from) the IP layer. Options are never written, and
/// are skipped when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TcpSegment {
    pub src_port: u16,
    pub dst_port: u16,
    pub sender: SenderMessage,
    pub receiver: ReceiverMessage,
}

impl TcpSegment {
    fn flags(&self) -> TcpFlags {
        let mut flags = TcpFlags::empty();
        flags.set(TcpFlags::SYN, self.sender.syn);
        flags.set(TcpFlags::FIN, self.sender.fin);
        flags.set(TcpFlags::ACK, self.receiver.ackno.is_some());
        flags
    }

    /// Convert a `TcpSegment` into wire bytes, checksummed for the given addresses
    pub fn serialize(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Vec<u8> {
        let total_len = HEADER_LEN + self.sender.payload.len();
        let mut buf = vec![0u8; total_len];

        let ack_no = self.receiver.ackno.unwrap_or_default();

        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        buf[4..8].copy_from_slice(&self.sender.seqno.value().to_be_bytes());
        buf[8..12].copy_from_slice(&ack_no.value().to_be_bytes());
        buf[12] = ((HEADER_LEN / 4) as u8) << 4;
        buf[13] = self.flags().bits();
        buf[14..16].copy_from_slice(&self.receiver.window_size.to_be_bytes());
        // 16..18 checksum, 18..20 urgent pointer; both zero for now
        buf[HEADER_LEN..].copy_from_slice(&self.sender.payload);

        let checksum = Self::checksum(&buf, src_ip, dst_ip);
        buf[16..18].copy_from_slice(&checksum.to_be_bytes());

        buf
    }

    /// Convert wire bytes into a `TcpSegment`, verifying the checksum
    pub fn parse(buf: &[u8], src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<Self, HeaderError> {
        if buf.len() < HEADER_LEN {
            return Err(HeaderError::BufferTooSmall { expected: HEADER_LEN, found: buf.len() });
        }

        let data_offset = buf[12] >> 4;
        if data_offset < 5 {
            return Err(HeaderError::BadDataOffset(data_offset));
        }
        let header_len = data_offset as usize * 4;
        if buf.len() < header_len {
            return Err(HeaderError::BufferTooSmall { expected: header_len, found: buf.len() });
        }

        if Self::checksum(buf, src_ip, dst_ip) != 0 {
            let checksum = u16::from_be_bytes([buf[16], buf[17]]);
            return Err(HeaderError::BadChecksum(checksum));
        }

        let src_port = u16::from_be_bytes([buf[0], buf[1]]);
        let dst_port = u16::from_be_bytes([buf[2], buf[3]]);
        let seq_no = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let ack_no = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let flags = TcpFlags::from_bits_truncate(buf[13]);
        let window = u16::from_be_bytes([buf[14], buf[15]]);

        Ok(TcpSegment {
            src_port,
            dst_port,
            sender: SenderMessage {
                seqno: Wrap32::new(seq_no),
                syn: flags.contains(TcpFlags::SYN),
                payload: buf[header_len..].to_vec(),
                fin: flags.contains(TcpFlags::FIN),
            },
            receiver: ReceiverMessage {
                ackno: flags.contains(TcpFlags::ACK).then(|| Wrap32::new(ack_no)),
                window_size: window,
            },
        })
    }

    /// Internet checksum over the IPv4 pseudo-header and `data`
    pub fn checksum(data: &[u8], src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> u16 {
        let mut sum: u32 = 0;

        // Pseudo-header
        let (src, dst) = (src_ip.octets(), dst_ip.octets());
        for pair in src.chunks(2).chain(dst.chunks(2)) {
            sum += u16::from_be_bytes([pair[0], pair[1]]) as u32;
        }
        sum += PROTOCOL_TCP as u32;
        sum += data.len() as u32;

        // Sum the TCP header and payload; an odd last byte is padded with zero
        for chunk in data.chunks(2) {
            let word = match chunk {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                [hi] => u16::from_be_bytes([*hi, 0]),
                _ => 0,
            };
            sum += word as u32;
        }

        // Fold the carry bits
        while sum >> 16 != 0 {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !(sum as u16)
    }
}

// -- Unit tests --
