//! Serial transport for the head link.
//!
//! This is the lowest I/O layer: it knows nothing about addresses,
//! checksums or messages, only that a frame ends with the 0x7E flag byte.
//! Everything above builds on the [`Link`] trait.

pub mod config;
pub mod error;
pub mod link;
pub mod memory;
pub mod serial;
pub mod traits;

pub use config::{SerialConfig, DEFAULT_BAUD_RATE};
pub use error::{Result, TransportError};
pub use link::SerialLink;
pub use memory::MemoryPort;
pub use serial::{available_ports, PortInfo, SerialTransport};
pub use traits::Link;
