//! Structured diagnostics emitted by the controller.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use headlink_itmp::MessageType;
use tracing::debug;

/// Where the single in-flight request currently stands.
///
/// `Sent` lasts from the moment the request frame is written until a reply
/// is read or the read fails; the other non-idle states describe how the
/// last exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcState {
    Idle,
    Sent(u64),
    Received,
    TimedOut,
    ChecksumFailed,
    Malformed,
}

impl fmt::Display for RpcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcState::Idle => f.write_str("idle"),
            RpcState::Sent(id) => write!(f, "sent({id})"),
            RpcState::Received => f.write_str("received"),
            RpcState::TimedOut => f.write_str("timed out"),
            RpcState::ChecksumFailed => f.write_str("checksum failed"),
            RpcState::Malformed => f.write_str("malformed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    RequestSent {
        address: u8,
        id: u64,
        kind: MessageType,
        frame_len: usize,
    },
    ResponseReceived {
        address: u8,
        id: u64,
        kind: MessageType,
    },
    RequestFailed {
        id: u64,
        state: RpcState,
        reason: String,
    },
    MoveScheduled {
        target: i64,
        velocity: i64,
        acceleration: i64,
        duration: Duration,
    },
    /// Target equals the current position; nothing was sent.
    MoveSkipped {
        target: i64,
    },
    /// `confirmed` is true when the value came from a `mot1/pos` reply
    /// rather than the commanded target.
    PositionUpdated {
        position: i64,
        confirmed: bool,
    },
    /// The `mot1/pos` query after a completed move failed; the commanded
    /// target stays in effect.
    PositionQueryFailed {
        position: i64,
        reason: String,
    },
}

/// Receiver for controller diagnostics.
pub trait EventSink {
    fn record(&self, event: &DeviceEvent);
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &DeviceEvent) {
        match event {
            DeviceEvent::RequestSent {
                address,
                id,
                kind,
                frame_len,
            } => debug!(address, id, %kind, frame_len, "request sent"),
            DeviceEvent::ResponseReceived { address, id, kind } => {
                debug!(address, id, %kind, "response received")
            }
            DeviceEvent::RequestFailed { id, state, reason } => {
                debug!(id, %state, reason = %reason, "request failed")
            }
            DeviceEvent::MoveScheduled {
                target,
                velocity,
                acceleration,
                duration,
            } => debug!(
                target,
                velocity,
                acceleration,
                ?duration,
                "move scheduled"
            ),
            DeviceEvent::MoveSkipped { target } => debug!(target, "already at target"),
            DeviceEvent::PositionUpdated {
                position,
                confirmed,
            } => debug!(position, confirmed, "position updated"),
            DeviceEvent::PositionQueryFailed { position, reason } => {
                debug!(position, reason = %reason, "position query failed")
            }
        }
    }
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<DeviceEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeviceEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &DeviceEvent) {
        self.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_events() {
        let sink = MemorySink::new();
        let observer = sink.clone();
        sink.record(&DeviceEvent::MoveSkipped { target: 5 });
        assert_eq!(
            observer.events(),
            vec![DeviceEvent::MoveSkipped { target: 5 }]
        );
        observer.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn state_display() {
        assert_eq!(RpcState::Sent(7).to_string(), "sent(7)");
        assert_eq!(RpcState::ChecksumFailed.to_string(), "checksum failed");
    }
}
