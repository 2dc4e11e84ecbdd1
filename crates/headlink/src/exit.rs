use std::fmt;
use std::io;

use headlink_device::DeviceError;
use headlink_itmp::MessageError;
use headlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(err.kind()), format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Timeout(_) => TIMEOUT,
        TransportError::Closed => FAILURE,
        TransportError::Io(source) => io_code(source.kind()),
        other => match other.io_kind() {
            Some(io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
            _ => TRANSPORT_ERROR,
        },
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Transport(err) => transport_error(context, err),
        DeviceError::Message(err) => message_error(context, err),
        DeviceError::NoResponse(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        DeviceError::IdMismatch { .. }
        | DeviceError::UnexpectedResponse { .. }
        | DeviceError::Script(_)
        | DeviceError::Json(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        DeviceError::InvalidArgument(_) | DeviceError::UnknownProcedure(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        DeviceError::Remote { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
