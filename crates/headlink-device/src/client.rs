use std::time::Duration;

use headlink_itmp::{from_frame, to_frame, Message};
use headlink_transport::{Link, TransportError};
use tracing::trace;

use crate::error::{DeviceError, Result};
use crate::events::RpcState;

/// One request, one reply, over a [`Link`].
///
/// Frames the request with the address byte, writes it, then waits for a
/// single reply frame. There are no retries; the first failure is
/// returned. The send and receive halves are also exposed separately so a
/// caller can let time pass between them.
#[derive(Debug)]
pub struct ProtocolClient<L> {
    link: L,
    state: RpcState,
}

impl<L: Link> ProtocolClient<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: RpcState::Idle,
        }
    }

    /// Send `message` to `address` and wait up to `timeout` for the reply.
    pub fn request(&mut self, message: &Message, address: u8, timeout: Duration) -> Result<Message> {
        self.send(message, address)?;
        self.receive(timeout)
    }

    /// Encode and write the request. Returns the frame length on the wire.
    pub fn send(&mut self, message: &Message, address: u8) -> Result<usize> {
        let frame = to_frame(message, address)?;
        self.link.send(&frame)?;
        self.state = RpcState::Sent(message.id());
        trace!(address, id = message.id(), len = frame.len(), "request written");
        Ok(frame.len())
    }

    /// Read and decode one reply frame.
    ///
    /// A read window expiring is reported as [`DeviceError::NoResponse`].
    /// The reply address is not checked against the request; the bus has a
    /// single responder.
    pub fn receive(&mut self, timeout: Duration) -> Result<Message> {
        let outcome = self.read_reply(timeout);
        self.state = match &outcome {
            Ok(_) => RpcState::Received,
            Err(DeviceError::NoResponse(_)) => RpcState::TimedOut,
            Err(err) if err.is_checksum() => RpcState::ChecksumFailed,
            Err(DeviceError::Message(_)) => RpcState::Malformed,
            Err(_) => RpcState::Idle,
        };
        outcome
    }

    fn read_reply(&mut self, timeout: Duration) -> Result<Message> {
        let frame = match self.link.recv(timeout) {
            Ok(frame) => frame,
            Err(TransportError::Timeout(_)) => return Err(DeviceError::NoResponse(timeout)),
            Err(err) => return Err(err.into()),
        };
        let (address, message) = from_frame(&frame)?;
        trace!(address, id = message.id(), kind = %message.kind(), "reply decoded");
        Ok(message)
    }

    /// Where the last exchange stands.
    pub fn state(&self) -> RpcState {
        self.state
    }

    /// Close the link. Later requests fail with a closed-transport error.
    pub fn close(&mut self) {
        self.link.close();
        self.state = RpcState::Idle;
    }

    pub fn is_closed(&self) -> bool {
        self.link.is_closed()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_inner(self) -> L {
        self.link
    }
}

#[cfg(test)]
mod tests {
    use headlink_itmp::{MessageType, Value};
    use headlink_transport::{MemoryPort, SerialLink};

    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    fn client_with(port: &MemoryPort) -> ProtocolClient<SerialLink<MemoryPort>> {
        ProtocolClient::new(SerialLink::new(port.clone()))
    }

    #[test]
    fn request_writes_exact_frame_and_decodes_reply() {
        let port = MemoryPort::new();
        port.push_incoming(&to_frame(&Message::description(1, vec![]), 4).unwrap());
        let mut client = client_with(&port);

        let reply = client
            .request(&Message::describe(1, ""), 4, SHORT)
            .unwrap();
        assert_eq!(port.written(), b"~\x04\x83\x06\x01`\xf7~");
        assert_eq!(reply, Message::description(1, vec![]));
        assert_eq!(client.state(), RpcState::Received);
    }

    #[test]
    fn end_to_end_call_at_address_0x11() {
        let port = MemoryPort::with_responder(|frame| {
            let (address, request) = from_frame(frame).unwrap();
            assert_eq!(address, 0x11);
            let reply = Message::result(request.id(), vec![Value::Integer(7)]);
            to_frame(&reply, address).unwrap().to_vec()
        });
        let mut client = client_with(&port);
        let request = Message::call(
            42,
            "do_something",
            vec![Value::Integer(123), Value::from("abc")],
        );

        let reply = client.request(&request, 0x11, SHORT).unwrap();
        assert_eq!(
            port.written(),
            b"~\x11\x84\x08\x18\x2a\x6cdo_something\x82\x18\x7b\x63abc\x09~"
        );
        assert_eq!(reply, Message::result(42, vec![Value::Integer(7)]));
    }

    #[test]
    fn silence_is_no_response() {
        let port = MemoryPort::new();
        let mut client = client_with(&port);
        let err = client
            .request(&Message::describe(1, ""), 4, SHORT)
            .unwrap_err();
        assert!(matches!(err, DeviceError::NoResponse(t) if t == SHORT));
        assert_eq!(client.state(), RpcState::TimedOut);
    }

    #[test]
    fn empty_frame_is_not_a_timeout() {
        let port = MemoryPort::new();
        port.push_incoming(b"~~");
        let mut client = client_with(&port);
        let err = client
            .request(&Message::describe(1, ""), 4, SHORT)
            .unwrap_err();
        assert!(matches!(err, DeviceError::Message(_)));
        assert_eq!(client.state(), RpcState::Malformed);
    }

    #[test]
    fn corrupted_reply_is_checksum_failure() {
        let port = MemoryPort::new();
        let mut frame = to_frame(&Message::result(1, vec![]), 4).unwrap().to_vec();
        frame[2] ^= 0x01;
        port.push_incoming(&frame);
        let mut client = client_with(&port);

        let err = client
            .request(&Message::call(1, "enable", vec![]), 4, SHORT)
            .unwrap_err();
        assert!(err.is_checksum(), "{err:?}");
        assert_eq!(client.state(), RpcState::ChecksumFailed);
    }

    #[test]
    fn state_is_sent_between_halves() {
        let port = MemoryPort::new();
        let mut client = client_with(&port);
        client.send(&Message::call(9, "enable", vec![]), 4).unwrap();
        assert_eq!(client.state(), RpcState::Sent(9));

        port.push_incoming(&to_frame(&Message::result(9, vec![]), 4).unwrap());
        let reply = client.receive(SHORT).unwrap();
        assert_eq!(reply.kind(), MessageType::Result);
    }

    #[test]
    fn closed_link_fails() {
        let mut client = client_with(&MemoryPort::new());
        client.close();
        assert!(client.is_closed());
        let err = client
            .request(&Message::describe(1, ""), 4, SHORT)
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Transport(TransportError::Closed)
        ));
    }
}
