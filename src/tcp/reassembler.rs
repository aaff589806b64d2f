use crate::tcp::byte_stream::Writer;
use std::collections::BTreeMap;
use tracing::trace;

/// Puts out-of-order spans of the byte stream back in order
#[derive(Debug, Default)]
pub struct Reassembler {
    segments: BTreeMap<u64, Vec<u8>>, // Out-of-order spans, disjoint and non-adjacent. key = start index
    last_byte_idx: Option<u64>,       // One past the final byte, if known
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a span of bytes starting at absolute index `first_index`.
    ///
    /// Bytes contiguous with what `output` already holds are pushed right away, along with any
    /// pending spans they connect to. Bytes ahead of that are held until the gap fills, as long as
    /// they fall within the output's available capacity. Everything else is dropped.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool, output: &mut impl Writer) {
        let last_idx = first_index.saturating_add(data.len() as u64);

        // Where the stream ends is worth knowing even if these bytes can't be used yet
        if is_last {
            self.last_byte_idx = Some(last_idx);
        }

        let next_idx = output.bytes_pushed();
        let window_end = next_idx + output.available_capacity();

        if data.is_empty() {
            // Nothing to place
        } else if first_index >= window_end || last_idx <= next_idx {
            trace!(first_index, len = data.len(), next_idx, window_end, "discarding unusable span");
        } else if first_index > next_idx {
            let end = last_idx.min(window_end);
            self.insert_buffer(first_index, &data[..(end - first_index) as usize]);
        } else {
            output.push(&data[(next_idx - first_index) as usize..]);
            self.write_output(output);
        }

        if self.is_done(output) {
            self.segments.clear();
            output.close();
        }
    }

    /// The total number of bytes pending reassembly in the buffer
    pub fn bytes_pending(&self) -> u64 {
        self.segments.values().map(|segment| segment.len() as u64).sum()
    }

    /// Buffer a span that lies ahead of the output, merging it with any span it touches
    fn insert_buffer(&mut self, seq_num: u64, data: &[u8]) {
        let mut m_start = seq_num;
        let mut m_end = seq_num + data.len() as u64;
        let mut merged = data.to_vec();

        let touching: Vec<u64> = self
            .segments
            .range(..=m_end)
            .filter(|(&seg_start, seg_data)| seg_start + seg_data.len() as u64 >= m_start)
            .map(|(&seg_start, _)| seg_start)
            .collect();

        for seg_start in touching {
            let Some(seg_data) = self.segments.remove(&seg_start) else {
                continue;
            };
            let seg_end = seg_start + seg_data.len() as u64;

            // Keep the part of the existing span hanging off the front
            if seg_start < m_start {
                let mut front = seg_data[..(m_start - seg_start) as usize].to_vec();
                front.extend_from_slice(&merged);
                merged = front;
                m_start = seg_start;
            }

            // ...and the part hanging off the back
            if seg_end > m_end {
                merged.extend_from_slice(&seg_data[(m_end - seg_start) as usize..]);
                m_end = seg_end;
            }
        }

        self.segments.insert(m_start, merged);
    }

    /// Write pending spans to the output for as long as they are contiguous with it
    fn write_output(&mut self, output: &mut impl Writer) {
        while let Some(entry) = self.segments.first_entry() {
            let next_idx = output.bytes_pushed();
            let seg_start = *entry.key();
            if seg_start > next_idx {
                break;
            }

            let data = entry.remove();
            let seg_end = seg_start + data.len() as u64;
            if seg_end > next_idx {
                output.push(&data[(next_idx - seg_start) as usize..]);
            }
        }
    }

    /// Check if all the data up to the final byte has been written out
    fn is_done(&self, output: &impl Writer) -> bool {
        match self.last_byte_idx {
            Some(last_idx) => output.bytes_pushed() >= last_idx,
            None => false,
        }
    }
}
