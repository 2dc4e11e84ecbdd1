//! In-memory port for tests and dry runs.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use headlink_frame::{FLAG, MIN_FRAME_LEN};

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

/// A cloneable byte port backed by shared buffers.
///
/// Clones share state, so a test can hand one clone to a link and keep
/// another to feed input and inspect output. An optional responder is
/// invoked with every complete outgoing frame and its return value is
/// queued as incoming bytes, which makes it easy to simulate a device.
#[derive(Clone, Default)]
pub struct MemoryPort {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    outgoing_frame: Vec<u8>,
    frames_written: usize,
    responder: Option<Responder>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every outgoing frame with the bytes returned by `responder`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let port = Self::new();
        port.lock().responder = Some(Box::new(responder));
        port
    }

    /// Queue bytes to be returned by subsequent reads.
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.lock().incoming.extend(bytes.iter().copied());
    }

    /// Number of queued bytes not read yet.
    pub fn pending_incoming(&self) -> usize {
        self.lock().incoming.len()
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Number of complete flag-terminated frames written so far.
    pub fn frames_written(&self) -> usize {
        self.lock().frames_written
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking responder only poisons test state; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Read for MemoryPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut inner = self.lock();
        let mut n = 0;
        while n < buf.len() {
            match inner.incoming.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for MemoryPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.written.extend_from_slice(buf);
        for &byte in buf {
            inner.outgoing_frame.push(byte);
            if inner.outgoing_frame.len() >= MIN_FRAME_LEN && byte == FLAG {
                let frame = std::mem::take(&mut inner.outgoing_frame);
                inner.frames_written += 1;
                if let Some(responder) = inner.responder.as_mut() {
                    let reply = responder(&frame);
                    inner.incoming.extend(reply);
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for MemoryPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryPort")
            .field("incoming", &inner.incoming.len())
            .field("written", &inner.written.len())
            .field("responder", &inner.responder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responder_answers_complete_frames_only() {
        let mut port = MemoryPort::with_responder(|frame| {
            let mut reply = frame.to_vec();
            reply.reverse();
            reply
        });
        port.write_all(b"~ab").unwrap();
        assert_eq!(port.pending_incoming(), 0);
        port.write_all(b"~").unwrap();
        assert_eq!(port.frames_written(), 1);

        let mut buf = [0u8; 8];
        let n = port.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"~ba~");
    }

    #[test]
    fn clones_share_buffers() {
        let port = MemoryPort::new();
        let mut writer = port.clone();
        writer.write_all(b"xyz").unwrap();
        assert_eq!(port.written(), b"xyz");
    }
}
