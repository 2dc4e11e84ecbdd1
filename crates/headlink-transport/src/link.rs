use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};
use headlink_frame::{FLAG, MIN_FRAME_LEN};
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::Link;

const INITIAL_BUFFER_CAPACITY: usize = 256;
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Frame link over any byte port (`Read + Write`).
///
/// Reads one byte at a time so that nothing past the closing flag is ever
/// consumed from the port; the next exchange starts on a clean line.
pub struct SerialLink<P> {
    port: Option<P>,
    name: String,
    buf: BytesMut,
}

impl<P: Read + Write> SerialLink<P> {
    /// Wrap an already-configured port.
    pub fn new(port: P) -> Self {
        Self::with_name(port, "serial")
    }

    /// Wrap a port and label it for diagnostics.
    pub fn with_name(port: P, name: impl Into<String>) -> Self {
        Self {
            port: Some(port),
            name: name.into(),
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read bytes until the buffer holds at least two bytes ending in a flag.
    ///
    /// `WouldBlock`, `TimedOut`, `Interrupted` and zero-length reads mean no
    /// byte is available yet; the loop keeps polling until `timeout`. Bytes
    /// gathered before a timeout are discarded.
    pub fn read_frame(&mut self, timeout: Duration) -> Result<Bytes> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        self.buf.clear();
        let start = Instant::now();

        loop {
            if self.buf.len() >= MIN_FRAME_LEN && self.buf.last() == Some(&FLAG) {
                let frame = self.buf.split().freeze();
                trace!(port = %self.name, len = frame.len(), "frame received");
                return Ok(frame);
            }

            if start.elapsed() > timeout {
                debug!(
                    port = %self.name,
                    partial = self.buf.len(),
                    ?timeout,
                    "read timed out"
                );
                self.buf.clear();
                return Err(TransportError::Timeout(timeout));
            }

            let mut byte = [0u8; 1];
            match port.read(&mut byte) {
                Ok(0) => std::thread::sleep(IDLE_BACKOFF),
                Ok(_) => self.buf.put_u8(byte[0]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(IDLE_BACKOFF)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Write the whole frame and flush.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;

        let mut offset = 0usize;
        while offset < frame.len() {
            match port.write(&frame[offset..]) {
                Ok(0) => {
                    return Err(TransportError::Io(std::io::Error::from(
                        ErrorKind::WriteZero,
                    )))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match port.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        trace!(port = %self.name, len = frame.len(), "frame written");
        Ok(())
    }

    /// Drop the port. Idempotent.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.name, "closed");
        }
    }

    /// Port label used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the underlying port, if still open.
    pub fn get_ref(&self) -> Option<&P> {
        self.port.as_ref()
    }

    /// Mutably borrow the underlying port, if still open.
    pub fn get_mut(&mut self) -> Option<&mut P> {
        self.port.as_mut()
    }

    /// Consume the link and return the port, if still open.
    pub fn into_inner(self) -> Option<P> {
        self.port
    }
}

impl<P: Read + Write> Link for SerialLink<P> {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.write_frame(frame)
    }

    fn recv(&mut self, timeout: Duration) -> Result<Bytes> {
        self.read_frame(timeout)
    }

    fn close(&mut self) {
        SerialLink::close(self)
    }

    fn is_closed(&self) -> bool {
        self.port.is_none()
    }
}

impl<P> std::fmt::Debug for SerialLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::memory::MemoryPort;

    const SHORT: Duration = Duration::from_millis(50);

    #[test]
    fn reads_single_frame() {
        let port = MemoryPort::new();
        port.push_incoming(b"~\x04\x83\x06\x01`\xf7~");
        let mut link = SerialLink::new(port);

        let frame = link.read_frame(SHORT).unwrap();
        assert_eq!(frame.as_ref(), b"~\x04\x83\x06\x01`\xf7~");
    }

    #[test]
    fn stops_at_first_closing_flag() {
        let port = MemoryPort::new();
        port.push_incoming(b"~ab~~cd~");
        let mut link = SerialLink::new(port.clone());

        assert_eq!(link.read_frame(SHORT).unwrap().as_ref(), b"~ab~");
        assert_eq!(link.read_frame(SHORT).unwrap().as_ref(), b"~cd~");
        assert_eq!(port.pending_incoming(), 0);
    }

    #[test]
    fn frame_without_leading_flag() {
        let port = MemoryPort::new();
        port.push_incoming(b"\x04\x83\x06\x01`\xf7~");
        let mut link = SerialLink::new(port);
        assert_eq!(
            link.read_frame(SHORT).unwrap().as_ref(),
            b"\x04\x83\x06\x01`\xf7~"
        );
    }

    #[test]
    fn lone_flag_is_not_a_frame() {
        let port = MemoryPort::new();
        port.push_incoming(b"~");
        let mut link = SerialLink::new(port);
        let err = link.read_frame(SHORT).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn silence_times_out() {
        let mut link = SerialLink::new(MemoryPort::new());
        let start = Instant::now();
        let err = link.read_frame(SHORT).unwrap_err();
        assert!(matches!(err, TransportError::Timeout(t) if t == SHORT));
        assert!(start.elapsed() >= SHORT);
    }

    #[test]
    fn empty_frame_is_distinct_from_timeout() {
        let port = MemoryPort::new();
        port.push_incoming(&[FLAG, FLAG]);
        let mut link = SerialLink::new(port);
        let frame = link.read_frame(SHORT).unwrap();
        assert_eq!(frame.as_ref(), &[FLAG, FLAG]);
    }

    #[test]
    fn unterminated_data_times_out() {
        let port = MemoryPort::new();
        port.push_incoming(b"~\x04\x83");
        let mut link = SerialLink::new(port);
        assert!(link.read_frame(SHORT).unwrap_err().is_timeout());
    }

    #[test]
    fn eof_reader_is_polled_until_timeout() {
        let mut link = SerialLink::new(Cursor::new(Vec::<u8>::new()));
        assert!(link.read_frame(SHORT).unwrap_err().is_timeout());
    }

    #[test]
    fn would_block_and_interrupted_are_retried() {
        let port = FlakyPort {
            script: vec![
                Err(ErrorKind::WouldBlock),
                Ok(b'~'),
                Err(ErrorKind::Interrupted),
                Ok(b'x'),
                Err(ErrorKind::TimedOut),
                Ok(b'~'),
            ],
        };
        let mut link = SerialLink::new(port);
        assert_eq!(link.read_frame(SHORT).unwrap().as_ref(), b"~x~");
    }

    #[test]
    fn hard_io_error_propagates() {
        let port = FlakyPort {
            script: vec![Ok(b'~'), Err(ErrorKind::BrokenPipe)],
        };
        let mut link = SerialLink::new(port);
        let err = link.read_frame(SHORT).unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn write_frame_writes_everything() {
        let port = MemoryPort::new();
        let mut link = SerialLink::new(port.clone());
        link.write_frame(b"~\x04\x84\x08\x01fenable\x80\x80~").unwrap();
        assert_eq!(port.written(), b"~\x04\x84\x08\x01fenable\x80\x80~");
    }

    #[test]
    fn short_writes_are_completed() {
        let mut link = SerialLink::new(TrickleWriter::default());
        link.write_frame(b"~hello~").unwrap();
        assert_eq!(link.get_ref().unwrap().data, b"~hello~");
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let mut link = SerialLink::new(MemoryPort::new());
        Link::close(&mut link);
        Link::close(&mut link);
        assert!(link.is_closed());
        assert!(matches!(
            link.read_frame(SHORT),
            Err(TransportError::Closed)
        ));
        assert!(matches!(
            link.write_frame(b"~~"),
            Err(TransportError::Closed)
        ));
    }

    struct FlakyPort {
        script: Vec<std::result::Result<u8, ErrorKind>>,
    }

    impl Read for FlakyPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.script.is_empty() {
                return Ok(0);
            }
            match self.script.remove(0) {
                Ok(byte) => {
                    buf[0] = byte;
                    Ok(1)
                }
                Err(kind) => Err(std::io::Error::from(kind)),
            }
        }
    }

    impl Write for FlakyPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct TrickleWriter {
        data: Vec<u8>,
        calls: usize,
    }

    impl Read for TrickleWriter {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
