/// Errors that can occur while wrapping or unwrapping HDLC-style frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The buffer does not end with the closing flag byte (0x7E).
    #[error("frame is not terminated by flag byte 0x7E")]
    MissingFlag,

    /// The frame (or its unstuffed payload) is shorter than the protocol allows.
    #[error("frame too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },

    /// An escape byte was the last byte of the stuffed interior.
    #[error("escape byte 0x7D at end of frame (nothing to unescape)")]
    TrailingEscape,

    /// A bare flag byte appeared inside the stuffed interior.
    #[error("unescaped flag byte inside frame at offset {offset}")]
    UnescapedFlag { offset: usize },

    /// The trailing CRC8 byte does not match the payload.
    #[error("crc8 mismatch (frame carries {actual:#04x}, computed {expected:#04x})")]
    Checksum { expected: u8, actual: u8 },
}

impl FrameError {
    /// True for the integrity failure, false for structural framing failures.
    pub fn is_checksum(&self) -> bool {
        matches!(self, FrameError::Checksum { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
