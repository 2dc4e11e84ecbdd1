use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// A frame-oriented, half-duplex byte link to one device.
///
/// Implementations are owned by exactly one protocol client; nothing here is
/// meant to be shared across threads concurrently.
pub trait Link {
    /// Write a complete frame. Either the whole buffer is written or an error
    /// is returned.
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Block until a flag-terminated frame has been received or `timeout`
    /// has elapsed. Expiry is reported as `TransportError::Timeout`.
    fn recv(&mut self, timeout: Duration) -> Result<Bytes>;

    /// Release the underlying device. Calling this more than once is a no-op.
    fn close(&mut self);

    /// Whether [`Link::close`] has been called.
    fn is_closed(&self) -> bool;
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn recv(&mut self, timeout: Duration) -> Result<Bytes> {
        (**self).recv(timeout)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
