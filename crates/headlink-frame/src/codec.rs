use bytes::{BufMut, Bytes, BytesMut};

use crate::crc::crc8;
use crate::error::{FrameError, Result};
use crate::stuffing::{stuff_into, unwrap_frame, FLAG};

/// Address byte + CRC byte framing the body of every packet.
pub const PACKET_OVERHEAD: usize = 2;

/// An addressed packet: the unstuffed content of one wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Device/node address byte.
    pub address: u8,
    /// The packet body (CBOR-encoded message fields for ITMP).
    pub body: Bytes,
}

impl Packet {
    /// Create a new packet.
    pub fn new(address: u8, body: impl Into<Bytes>) -> Self {
        Self {
            address,
            body: body.into(),
        }
    }

    /// Encode this packet into a complete wire frame.
    pub fn to_frame(&self) -> Bytes {
        let mut dst = BytesMut::new();
        encode_packet(self.address, &self.body, &mut dst);
        dst.freeze()
    }
}

/// Encode an addressed packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬──────────────────────────────────────────────┬──────┐
/// │ 0x7E │ stuffed( address(1) ++ body ++ crc8(1) )      │ 0x7E │
/// └──────┴──────────────────────────────────────────────┴──────┘
/// ```
/// The CRC covers the address and body bytes before stuffing.
pub fn encode_packet(address: u8, body: &[u8], dst: &mut BytesMut) {
    let mut sealed = BytesMut::with_capacity(body.len() + PACKET_OVERHEAD);
    sealed.put_u8(address);
    sealed.put_slice(body);
    let crc = crc8(&sealed);
    sealed.put_u8(crc);

    dst.reserve(sealed.len() + 2);
    dst.put_u8(FLAG);
    stuff_into(&sealed, dst);
    dst.put_u8(FLAG);
}

/// Decode a wire frame into an addressed packet.
///
/// This is the integrity gate: a frame whose CRC does not match is rejected
/// in full and its body is never handed out.
pub fn decode_packet(frame: &[u8]) -> Result<Packet> {
    let payload = unwrap_frame(frame)?;
    if payload.len() < PACKET_OVERHEAD {
        return Err(FrameError::TooShort {
            len: payload.len(),
            min: PACKET_OVERHEAD,
        });
    }

    let crc_at = payload.len() - 1;
    let actual = payload[crc_at];
    let expected = crc8(&payload[..crc_at]);
    if actual != expected {
        return Err(FrameError::Checksum { expected, actual });
    }

    let address = payload[0];
    let body = payload.slice(1..crc_at);
    Ok(Packet { address, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stuffing::ESCAPE;

    #[test]
    fn encode_matches_captured_describe_frame() {
        let mut buf = BytesMut::new();
        encode_packet(0x04, &[0x83, 0x06, 0x01, 0x60], &mut buf);
        assert_eq!(buf.as_ref(), b"~\x04\x83\x06\x01`\xf7~");
    }

    #[test]
    fn decode_captured_describe_frame() {
        let packet = decode_packet(b"~\x04\x83\x06\x01`\xf7~").unwrap();
        assert_eq!(packet.address, 0x04);
        assert_eq!(packet.body.as_ref(), &[0x83, 0x06, 0x01, 0x60]);
    }

    #[test]
    fn decode_without_leading_flag() {
        let packet = decode_packet(b"\x04\x83\x06\x01`\xf7~").unwrap();
        assert_eq!(packet.address, 0x04);
    }

    #[test]
    fn roundtrip_with_special_bytes() {
        let packet = Packet::new(FLAG, vec![ESCAPE, FLAG, 0x00, 0xFF]);
        let frame = packet.to_frame();
        assert_eq!(frame.iter().filter(|&&b| b == FLAG).count(), 2);
        assert_eq!(decode_packet(&frame).unwrap(), packet);
    }

    #[test]
    fn empty_body_roundtrip() {
        let packet = Packet::new(0x01, Bytes::new());
        assert_eq!(decode_packet(&packet.to_frame()).unwrap(), packet);
    }

    #[test]
    fn corrupted_body_fails_checksum() {
        let mut frame = Packet::new(0x04, vec![0x83, 0x06, 0x01, 0x60]).to_frame().to_vec();
        frame[3] ^= 0x01;
        let err = decode_packet(&frame).unwrap_err();
        assert!(err.is_checksum());
    }

    #[test]
    fn payload_without_crc_is_too_short() {
        let err = decode_packet(&[FLAG, 0x04, FLAG]).unwrap_err();
        assert!(matches!(err, FrameError::TooShort { len: 1, min: 2 }));
    }

    #[test]
    fn empty_frame_is_too_short() {
        let err = decode_packet(&[FLAG, FLAG]).unwrap_err();
        assert!(matches!(err, FrameError::TooShort { len: 0, .. }));
    }

    #[test]
    fn every_single_bit_flip_is_rejected() {
        let frame = Packet::new(0x04, b"\x84\x08\x01fenable\x80".to_vec()).to_frame();
        for index in 1..frame.len() - 1 {
            for bit in 0..8 {
                let mut corrupted = frame.to_vec();
                corrupted[index] ^= 1 << bit;
                assert!(
                    decode_packet(&corrupted).is_err(),
                    "flip of bit {bit} in byte {index} went undetected"
                );
            }
        }
    }
}
