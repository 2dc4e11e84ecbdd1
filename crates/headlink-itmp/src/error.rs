use headlink_frame::FrameError;

use crate::kind::MessageType;

/// Errors that can occur while building or decoding ITMP messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The frame failed delimiting, unstuffing or its CRC check.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The type code is not one of the assigned ITMP message types.
    #[error("unknown message type code {0}")]
    UnknownMessageType(i64),

    /// The field list does not have the shape required by its type.
    #[error("malformed {kind} message: {reason}")]
    Malformed { kind: MessageType, reason: String },

    /// The field list itself could not be read (missing or non-integer type tag).
    #[error("malformed message: {0}")]
    MalformedList(String),

    /// The body is not valid CBOR, or a value cannot be represented.
    #[error("cbor error: {0}")]
    Cbor(String),
}

impl MessageError {
    pub(crate) fn malformed(kind: MessageType, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            reason: reason.into(),
        }
    }

    /// True when the underlying frame failed its CRC check.
    pub fn is_checksum(&self) -> bool {
        matches!(self, MessageError::Frame(err) if err.is_checksum())
    }
}

pub type Result<T> = std::result::Result<T, MessageError>;
