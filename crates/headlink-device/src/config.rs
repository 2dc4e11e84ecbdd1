use std::time::Duration;

/// Bus address of the head controller.
pub const DEFAULT_ADDRESS: u8 = 4;

/// Controller behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Address byte put on every request frame. Default: 4.
    pub address: u8,
    /// How long to wait for a reply frame. Default: 1 s.
    pub response_timeout: Duration,
    /// Added to the computed move duration before reading the move reply.
    /// Default: 80 ms.
    pub settle_margin: Duration,
    /// Ask the device for `mot1/pos` after every completed move.
    pub requery_position: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            response_timeout: Duration::from_secs(1),
            settle_margin: Duration::from_millis(80),
            requery_position: true,
        }
    }
}
