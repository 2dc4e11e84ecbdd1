use std::time::Duration;

use headlink_itmp::{MessageError, MessageType};
use headlink_transport::TransportError;

/// Errors that can occur while talking to the device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error (open, I/O, closed link).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The reply frame or message could not be decoded.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// No reply frame arrived within the response window.
    #[error("no response within {0:?}")]
    NoResponse(Duration),

    /// The reply carries a different id than the request.
    #[error("reply id {actual} does not match request id {expected}")]
    IdMismatch { expected: u64, actual: u64 },

    /// The reply is a valid message of the wrong kind.
    #[error("expected {expected} reply, got {actual}")]
    UnexpectedResponse {
        expected: MessageType,
        actual: MessageType,
    },

    /// A caller-supplied argument was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The device answered with an ERROR message.
    #[error("device error {code}: {reason}")]
    Remote { code: i64, reason: String },

    /// The device does not list the procedure.
    #[error("procedure {0:?} not provided by device")]
    UnknownProcedure(String),

    /// A script could not be read or parsed.
    #[error("script error: {0}")]
    Script(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeviceError {
    /// True when the device stayed silent for the whole response window.
    pub fn is_no_response(&self) -> bool {
        matches!(self, DeviceError::NoResponse(_))
    }

    /// True when the reply frame failed its CRC check.
    pub fn is_checksum(&self) -> bool {
        matches!(self, DeviceError::Message(err) if err.is_checksum())
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
