use std::time::Duration;

/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The serial device could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// The port opened but could not be configured.
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: String,
        source: serialport::Error,
    },

    /// Serial ports could not be enumerated.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred on the port.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No complete frame arrived within the read window.
    #[error("no complete frame within {0:?}")]
    Timeout(Duration),

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// True for the read-window expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }

    /// The operating-system error kind behind this failure, if any.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Open { source, .. }
            | TransportError::Configure { source, .. }
            | TransportError::Enumerate(source) => match source.kind() {
                serialport::ErrorKind::Io(kind) => Some(kind),
                _ => None,
            },
            TransportError::Io(err) => Some(err.kind()),
            TransportError::Timeout(_) | TransportError::Closed => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
