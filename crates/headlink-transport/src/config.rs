use std::time::Duration;

/// Default line speed of the head controller.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial port configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed. Default: 115200.
    pub baud_rate: u32,
    /// Upper bound on a single byte read when the line is idle. The frame
    /// read loop, not this value, enforces the overall timeout.
    pub poll_interval: Duration,
    /// Delay after opening before the port is handed out. The controller
    /// resets on open and drops anything written during boot.
    pub settle_delay: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval: Duration::from_millis(10),
            settle_delay: Duration::from_secs(2),
        }
    }
}
