//! Batched terminal output.
//!
//! A frame is assembled in memory and handed to the sink in one write, so the
//! terminal never shows a half-applied diff.

use std::io::{self, Write};

/// Byte buffer that accumulates one frame's worth of output.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(4096),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Drop everything buffered.
    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    /// Write everything to `sink` and flush it, leaving the buffer empty.
    ///
    /// The buffer is emptied even when the write fails, so a failed frame is
    /// never replayed in front of the next one. Returns the number of bytes
    /// written.
    pub fn flush_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<usize> {
        let written = self.data.len();
        if written == 0 {
            return Ok(0);
        }
        let result = sink.write_all(&self.data).and_then(|()| sink.flush());
        self.data.clear();
        result.map(|()| written)
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_drains_into_sink() {
        let mut out = OutputBuffer::new();
        out.write_str("abc");
        write!(out, "{}", 42).expect("buffer write");
        assert_eq!(out.len(), 5);

        let mut sink = Vec::new();
        assert_eq!(out.flush_to(&mut sink).expect("flush"), 5);
        assert_eq!(sink, b"abc42");
        assert!(out.is_empty());
        assert_eq!(out.flush_to(&mut sink).expect("flush"), 0);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_flush_discards_pending_bytes() {
        let mut out = OutputBuffer::new();
        out.write_str("stale");
        assert!(out.flush_to(&mut BrokenPipe).is_err());
        assert!(out.is_empty());

        out.write_str("next");
        let mut sink = Vec::new();
        out.flush_to(&mut sink).expect("flush");
        assert_eq!(sink, b"next");
    }
}
