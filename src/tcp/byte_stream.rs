use std::collections::VecDeque;
use std::io;
use std::io::{Read, Write};

/// A bounded, closable FIFO byte buffer shared by one writer and one reader.
///
/// The two ends are the [`Writer`] and [`Reader`] traits; code that only needs one side
/// should take, or hand out, `&mut impl Writer` or `&mut impl Reader`. Either end can
/// abort the stream through [`StreamError`].
#[derive(Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: u64,
    bytes_pushed: u64,
    bytes_popped: u64,
    closed: bool,
    error: bool,
}

/// The error flag, visible from both ends of a [`ByteStream`]
pub trait StreamError {
    /// Abort the stream. There is no way to clear the flag.
    fn set_error(&mut self);

    fn has_error(&self) -> bool;
}

/// The writing end of a [`ByteStream`]
pub trait Writer: StreamError {
    /// Push as many leading bytes of `data` as fit; the rest is dropped
    fn push(&mut self, data: &[u8]);

    /// Signal that no more bytes will be pushed
    fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// How many bytes can be pushed right now
    fn available_capacity(&self) -> u64;

    /// Total number of bytes cumulatively pushed
    fn bytes_pushed(&self) -> u64;
}

/// The reading end of a [`ByteStream`]
pub trait Reader: StreamError {
    /// Peek at the buffered bytes. May return only a prefix of them.
    fn peek(&self) -> &[u8];

    /// Remove `len` bytes from the front of the buffer
    fn pop(&mut self, len: u64);

    /// Closed and fully popped
    fn is_finished(&self) -> bool;

    /// Number of bytes pushed and not yet popped
    fn bytes_buffered(&self) -> u64;

    /// Total number of bytes cumulatively popped
    fn bytes_popped(&self) -> u64;
}

impl ByteStream {
    pub fn new(capacity: u64) -> Self {
        ByteStream {
            buffer: VecDeque::new(),
            capacity,
            bytes_pushed: 0,
            bytes_popped: 0,
            closed: false,
            error: false,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl StreamError for ByteStream {
    fn set_error(&mut self) {
        self.error = true;
    }

    fn has_error(&self) -> bool {
        self.error
    }
}

impl Writer for ByteStream {
    fn push(&mut self, data: &[u8]) {
        let to_write = data.len().min(self.available_capacity() as usize);
        self.buffer.extend(&data[..to_write]);
        self.bytes_pushed += to_write as u64;
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn available_capacity(&self) -> u64 {
        self.capacity - self.buffer.len() as u64
    }

    fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }
}

impl Reader for ByteStream {
    fn peek(&self) -> &[u8] {
        self.buffer.as_slices().0
    }

    fn pop(&mut self, len: u64) {
        let to_pop = (len as usize).min(self.buffer.len());
        self.buffer.drain(..to_pop);
        self.bytes_popped += to_pop as u64;
    }

    fn is_finished(&self) -> bool {
        self.closed && self.buffer.is_empty()
    }

    fn bytes_buffered(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn bytes_popped(&self) -> u64 {
        self.bytes_popped
    }
}

/// Pop up to `len` bytes from `reader` into `out`, replacing its contents
pub fn read(reader: &mut impl Reader, len: u64, out: &mut Vec<u8>) {
    out.clear();
    while (out.len() as u64) < len && reader.bytes_buffered() > 0 {
        let view = reader.peek();
        let take = view.len().min((len - out.len() as u64) as usize);
        out.extend_from_slice(&view[..take]);
        reader.pop(take as u64);
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let to_read = buf.len().min(self.buffer.len());
        for (dst, src) in buf.iter_mut().zip(self.buffer.drain(..to_read)) {
            *dst = src;
        }
        self.bytes_popped += to_read as u64;
        Ok(to_read)
    }
}

impl Write for ByteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed || self.error {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"));
        }
        let before = self.bytes_pushed;
        self.push(buf);
        Ok((self.bytes_pushed - before) as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// -- Unit tests --
