//! Fixed-capacity read buffer over a byte stream.
//!
//! The buffer keeps explicit read/write cursors and compacts unread bytes to
//! the front when a request would run off the end. `bytes_processed` is the
//! logical position inside the current message and is independent of refill
//! boundaries, so a declared content length can bound decoding.

use crate::error::{DecodeError, Result};
use std::io::{self, ErrorKind, Read};

/// 64 KiB; also the hard upper bound for any single contiguous field.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1 << 16;

#[derive(Debug)]
pub struct BufferedSource<R> {
    inner: R,
    buf: Box<[u8]>,
    read_pos: usize,
    write_pos: usize,
    bytes_processed: usize,
    content_length: Option<usize>,
    // Bytes we may still pull from `inner` for the current message.
    fetch_budget: usize,
    eof: bool,
}

impl<R: Read> BufferedSource<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            buf: vec![0u8; capacity.max(16)].into_boxed_slice(),
            read_pos: 0,
            write_pos: 0,
            bytes_processed: 0,
            content_length: None,
            fetch_budget: usize::MAX,
            eof: false,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Unread bytes currently resident in the buffer.
    #[inline]
    pub fn available(&self) -> usize {
        self.write_pos - self.read_pos
    }

    #[inline]
    pub fn bytes_processed(&self) -> usize {
        self.bytes_processed
    }

    #[inline]
    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Bytes of the current message not yet consumed, if a length was declared.
    #[inline]
    pub fn remaining_in_message(&self) -> Option<usize> {
        self.content_length
            .map(|len| len.saturating_sub(self.bytes_processed))
    }

    /// Start a message of `len` bytes at the current read position.
    ///
    /// Bytes that are already buffered count towards the message, so at most
    /// `len - available()` further bytes are pulled from the stream.
    pub fn begin_message(&mut self, len: usize) {
        self.bytes_processed = 0;
        self.content_length = Some(len);
        self.fetch_budget = len.saturating_sub(self.available());
        self.eof = false;
    }

    /// Drop the message bound; subsequent reads pull from the stream freely.
    pub fn end_message(&mut self) {
        self.bytes_processed = 0;
        self.content_length = None;
        self.fetch_budget = usize::MAX;
    }

    /// True once the declared message is consumed, or the stream is drained
    /// when no length was declared.
    pub fn at_message_end(&mut self) -> Result<bool> {
        match self.content_length {
            Some(len) => Ok(self.bytes_processed >= len),
            None => Ok(self.available() == 0 && self.fill_more()? == 0),
        }
    }

    /// Forget all buffered state, e.g. after the underlying stream was replaced.
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.bytes_processed = 0;
        self.content_length = None;
        self.fetch_budget = usize::MAX;
        self.eof = false;
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    fn compact(&mut self) {
        if self.read_pos == 0 {
            return;
        }
        self.buf.copy_within(self.read_pos..self.write_pos, 0);
        self.write_pos -= self.read_pos;
        self.read_pos = 0;
    }

    /// Issue a single read against the stream. Returns the byte count, `0` at
    /// end of stream or once the message's content length is fully buffered.
    pub fn fill_more(&mut self) -> io::Result<usize> {
        if self.fetch_budget == 0 || self.eof {
            return Ok(0);
        }
        if self.write_pos == self.buf.len() {
            self.compact();
            if self.write_pos == self.buf.len() {
                return Err(io::Error::new(ErrorKind::Other, "read buffer full"));
            }
        }

        let room = (self.buf.len() - self.write_pos).min(self.fetch_budget);
        let dst = &mut self.buf[self.write_pos..self.write_pos + room];
        let n = loop {
            match self.inner.read(dst) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if n == 0 {
            self.eof = true;
        } else {
            self.write_pos += n;
            if self.fetch_budget != usize::MAX {
                self.fetch_budget -= n;
            }
        }
        Ok(n)
    }

    /// Make sure at least `n` unread bytes are resident.
    pub fn ensure(&mut self, n: usize) -> Result<()> {
        if self.available() >= n {
            return Ok(());
        }
        if n > self.buf.len() {
            return Err(DecodeError::RequestedSizeTooLarge {
                requested: n,
                capacity: self.buf.len(),
            });
        }
        if self.read_pos + n > self.buf.len() {
            self.compact();
        }
        while self.available() < n {
            if self.fill_more()? == 0 {
                return Err(DecodeError::UnexpectedEof {
                    needed: n,
                    available: self.available(),
                });
            }
        }
        Ok(())
    }

    /// Unread resident bytes.
    #[inline]
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.read_pos..self.write_pos]
    }

    #[inline]
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.available());
        self.read_pos += n;
        self.bytes_processed += n;
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let b = self.buf[self.read_pos];
        self.consume(1);
        Ok(b)
    }

    /// Borrow the next `n` bytes; `n` must fit in the buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;
        let start = self.read_pos;
        self.consume(n);
        Ok(&self.buf[start..start + n])
    }

    /// Discard `n` bytes. Unlike [`read_bytes`](Self::read_bytes), `n` may
    /// exceed the buffer capacity.
    pub fn skip(&mut self, mut n: usize) -> Result<()> {
        while n > 0 {
            if self.available() == 0 && self.fill_more()? == 0 {
                return Err(DecodeError::UnexpectedEof {
                    needed: n,
                    available: 0,
                });
            }
            let step = n.min(self.available());
            self.consume(step);
            n -= step;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `chunk` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
        reads: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            self.reads += 1;
            Ok(n)
        }
    }

    #[test]
    fn ensure_refills_across_short_reads() {
        let data: Vec<u8> = (0..40u8).collect();
        let mut src = BufferedSource::with_capacity(
            Trickle { data: &data, chunk: 3, reads: 0 },
            16,
        );

        src.ensure(10).unwrap();
        assert!(src.available() >= 10);
        assert_eq!(src.read_bytes(10).unwrap(), &data[..10]);

        // Needs compaction: read_pos is 10 and the buffer only holds 16.
        assert_eq!(src.read_bytes(12).unwrap(), &data[10..22]);
        assert_eq!(src.bytes_processed(), 22);
        assert!(src.get_ref().reads >= 8);
    }

    #[test]
    fn ensure_rejects_requests_larger_than_the_buffer() {
        let mut src = BufferedSource::with_capacity(&[0u8; 64][..], 16);
        match src.ensure(17) {
            Err(DecodeError::RequestedSizeTooLarge { requested, capacity }) => {
                assert_eq!((requested, capacity), (17, 16));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn content_length_bounds_stream_reads() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut src = BufferedSource::new(Trickle { data: &data, chunk: 8, reads: 0 });
        src.begin_message(3);

        assert!(matches!(
            src.ensure(4),
            Err(DecodeError::UnexpectedEof { needed: 4, available: 3 })
        ));
        assert_eq!(src.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert!(src.at_message_end().unwrap());

        // The rest of the stream was never pulled.
        assert_eq!(src.get_ref().data, &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn buffered_bytes_count_towards_the_next_message() {
        let data = b"headbody";
        let mut src = BufferedSource::new(&data[..]);
        src.ensure(8).unwrap();
        src.consume(4);

        src.begin_message(4);
        assert_eq!(src.bytes_processed(), 0);
        assert_eq!(src.read_bytes(4).unwrap(), b"body");
        assert_eq!(src.remaining_in_message(), Some(0));
    }

    #[test]
    fn skip_can_span_more_than_the_capacity() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut src = BufferedSource::with_capacity(
            Trickle { data: &data, chunk: 7, reads: 0 },
            16,
        );
        src.skip(90).unwrap();
        assert_eq!(src.read_u8().unwrap(), 90);
        assert!(matches!(
            src.skip(20),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
