use crate::tcp::byte_stream::{ByteStream, Reader, StreamError, Writer};
use std::collections::BTreeMap;
use std::io;
use std::io::Read;

/// Reorders indexed substrings into a contiguous `ByteStream`
#[derive(Debug)]
pub struct Reassembler {
    segments: BTreeMap<u64, Vec<u8>>, // Out-of-order segments, disjoint. key = start index
    output: ByteStream,               // The assembled ByteStream, ready to be read
    next_index: u64,                  // The next byte index expected to write
    end_index: Option<u64>,           // One past the last byte, once the last substring is seen
}

impl Reassembler {
    /// New `Reassembler` with the provided `ByteStream` as output
    pub fn new(output: ByteStream) -> Self {
        Reassembler {
            segments: BTreeMap::new(),
            output,
            next_index: 0,
            end_index: None,
        }
    }

    /// Insert a substring that starts at absolute `first_index`.
    ///
    /// Bytes already written, or beyond what the output can eventually hold, are dropped.
    /// The output is closed once every byte up to the end of the last substring is written.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last_substring: bool) {
        if self.output.is_closed() || self.output.has_error() {
            log::trace!("Dropping substring at {first_index}: output no longer accepts data");
            return;
        }

        if is_last_substring {
            self.end_index = Some(first_index.saturating_add(data.len() as u64));
        }

        match self.clip(first_index, data) {
            Some((start, window)) => {
                self.store(start, window);
                self.write_output();
            }
            None if !data.is_empty() => {
                log::trace!(
                    "Dropping substring [{}, {}): outside [{}, {})",
                    first_index,
                    first_index.saturating_add(data.len() as u64),
                    self.next_index,
                    self.first_unacceptable_index()
                );
            }
            None => {}
        }

        if self.end_index == Some(self.next_index) {
            self.output.close();
        }
    }

    /// The total number of bytes pending reassembly in the buffer
    pub fn count_bytes_pending(&self) -> u64 {
        self.segments.values().map(|segment| segment.len() as u64).sum()
    }

    /// The index of the next byte expected
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    /// The reading end of the output; only the reassembler writes to it
    pub fn output_mut(&mut self) -> &mut (impl Reader + Read) {
        &mut self.output
    }

    fn first_unacceptable_index(&self) -> u64 {
        self.next_index + self.output.available_capacity()
    }

    /// Trim `data` to the part in `[next_index, first_unacceptable_index)`
    fn clip<'a>(&self, first_index: u64, data: &'a [u8]) -> Option<(u64, &'a [u8])> {
        let last_index = first_index.saturating_add(data.len() as u64);
        if last_index <= self.next_index {
            return None;
        }

        let start = first_index.max(self.next_index);
        let end = last_index.min(self.first_unacceptable_index());
        if start >= end {
            return None;
        }

        let window = &data[(start - first_index) as usize..(end - first_index) as usize];
        Some((start, window))
    }

    /// Store the parts of `data` not already covered by a pending segment
    fn store(&mut self, first_index: u64, data: &[u8]) {
        let end = first_index.saturating_add(data.len() as u64);
        let mut pos = first_index;

        while pos < end {
            // Skip past a segment that covers `pos`
            if let Some((&seg_start, seg)) = self.segments.range(..=pos).next_back() {
                let seg_end = seg_start + seg.len() as u64;
                if pos < seg_end {
                    pos = seg_end;
                    continue;
                }
            }

            // Fill the gap up to the next segment, or to the end of `data`
            let stop = self
                .segments
                .range(pos..end)
                .next()
                .map_or(end, |(&seg_start, _)| seg_start);
            let chunk = &data[(pos - first_index) as usize..(stop - first_index) as usize];
            self.segments.insert(pos, chunk.to_vec());
            pos = stop;
        }
    }

    /// Write contiguous data from the buffer to the output `ByteStream`
    fn write_output(&mut self) {
        while let Some(mut data) = self.segments.remove(&self.next_index) {
            let n = data.len().min(self.output.available_capacity() as usize);
            let rest = data.split_off(n);

            self.output.push(&data);
            self.next_index += n as u64;

            if !rest.is_empty() {
                // Output is full; keep the remainder for later
                self.segments.insert(self.next_index, rest);
                break;
            }
        }
    }
}

impl Read for Reassembler {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.output.read(buf)
    }
}
