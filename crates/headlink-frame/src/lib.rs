//! HDLC-style framing for the head serial link.
//!
//! Every packet on the wire is:
//! - delimited by a flag byte (0x7E) at both ends,
//! - byte-stuffed so the flag never appears inside the frame,
//! - sealed with an address byte in front and a CRC8 byte at the end.
//!
//! Pure functions only. Nothing here performs I/O or logs.

pub mod codec;
pub mod crc;
pub mod error;
pub mod stuffing;

pub use codec::{decode_packet, encode_packet, Packet, PACKET_OVERHEAD};
pub use crc::{crc8, crc8_update, CRC8_INIT};
pub use error::{FrameError, Result};
pub use stuffing::{
    byte_stuff, byte_unstuff, stuff_into, unwrap_frame, wrap_frame, ESCAPE, ESCAPE_XOR, FLAG,
    MIN_FRAME_LEN,
};
