use std::collections::VecDeque;
use std::io;
use std::io::{Read, Write};

/// The write side of a flow-controlled byte stream
pub trait Writer {
    /// Push as many leading bytes of `data` as fit; the rest is dropped
    fn push(&mut self, data: &[u8]);

    /// Signal that no more bytes will ever be pushed
    fn close(&mut self);

    /// Mark the stream as permanently failed
    fn set_error(&mut self);

    fn is_closed(&self) -> bool;

    /// How many bytes can be pushed right now
    fn available_capacity(&self) -> u64;

    /// Total bytes ever pushed
    fn bytes_pushed(&self) -> u64;
}

/// The read side of a flow-controlled byte stream
pub trait Reader {
    /// A view of the next buffered byte(s), empty when finished or errored
    fn peek(&self) -> &[u8];

    /// Remove up to `len` bytes from the front
    fn pop(&mut self, len: u64);

    /// Closed and fully drained
    fn is_finished(&self) -> bool;

    fn has_error(&self) -> bool;

    /// Bytes pushed but not yet popped
    fn bytes_buffered(&self) -> u64;

    /// Total bytes ever popped
    fn bytes_popped(&self) -> u64;

    /// Move up to `len` bytes from the front of the stream into `out`
    fn read_into(&mut self, len: u64, out: &mut Vec<u8>) {
        let mut remaining = len.min(self.bytes_buffered());
        while remaining > 0 {
            let chunk = self.peek();
            if chunk.is_empty() {
                break;
            }
            let n = chunk.len().min(remaining as usize);
            out.extend_from_slice(&chunk[..n]);
            self.pop(n as u64);
            remaining -= n as u64;
        }
    }
}

/// A capacity-bounded in-memory byte queue
#[derive(Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: u64,
    closed: bool,
    error: bool,
    pushed: u64,
    popped: u64,
}

impl ByteStream {
    pub fn new(capacity: u64) -> Self {
        ByteStream {
            buffer: VecDeque::with_capacity(capacity.min(1 << 20) as usize),
            capacity,
            closed: false,
            error: false,
            pushed: 0,
            popped: 0,
        }
    }
}

impl Writer for ByteStream {
    fn push(&mut self, data: &[u8]) {
        if self.closed || self.error {
            return;
        }
        let to_write = (data.len() as u64).min(self.available_capacity()) as usize;
        if to_write == 0 {
            return;
        }
        self.buffer.extend(&data[..to_write]);
        self.pushed += to_write as u64;
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn set_error(&mut self) {
        self.error = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn available_capacity(&self) -> u64 {
        self.capacity - self.buffer.len() as u64
    }

    fn bytes_pushed(&self) -> u64 {
        self.pushed
    }
}

impl Reader for ByteStream {
    fn peek(&self) -> &[u8] {
        if self.error || self.is_finished() {
            return &[];
        }
        // The front slice is non-empty whenever anything is buffered
        self.buffer.as_slices().0
    }

    fn pop(&mut self, len: u64) {
        let to_pop = len.min(self.bytes_buffered()) as usize;
        self.buffer.drain(..to_pop);
        self.popped += to_pop as u64;
    }

    fn is_finished(&self) -> bool {
        self.closed && self.pushed == self.popped
    }

    fn has_error(&self) -> bool {
        self.error
    }

    fn bytes_buffered(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn bytes_popped(&self) -> u64 {
        self.popped
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.error {
            return Err(io::Error::new(io::ErrorKind::Other, "stream errored"));
        }
        let to_read = buf.len().min(self.buffer.len());
        for (dst, src) in buf.iter_mut().zip(self.buffer.drain(..to_read)) {
            *dst = src;
        }
        self.popped += to_read as u64;
        Ok(to_read)
    }
}

impl Write for ByteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed || self.error {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"));
        }
        let before = self.pushed;
        self.push(buf);
        Ok((self.pushed - before) as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// -- Unit tests --
