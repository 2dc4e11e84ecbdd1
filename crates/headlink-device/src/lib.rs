//! Talking to the head device.
//!
//! [`ProtocolClient`] does one framed request/reply exchange over a
//! [`headlink_transport::Link`]. [`DeviceController`] builds on it with id
//! allocation, typed procedures, and paced motor moves whose wait time comes
//! from [`motion::move_duration`].

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod motion;
pub mod script;

pub use client::ProtocolClient;
pub use config::{ControllerConfig, DEFAULT_ADDRESS};
pub use controller::{DeviceController, PendingMove};
pub use error::{DeviceError, Result};
pub use events::{DeviceEvent, EventSink, MemorySink, RpcState, TracingSink};
pub use motion::move_duration;
pub use script::{Script, Step, StepOutcome};
