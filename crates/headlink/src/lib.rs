//! Serial RPC link to the head controller.
//!
//! # Crate Structure
//!
//! - [`frame`]: HDLC-style byte stuffing, CRC-8 and address/body packets
//! - [`itmp`]: ITMP message model and CBOR field-list encoding
//! - [`transport`]: the [`transport::Link`] trait and the serial port link
//! - [`device`]: request/reply client, device controller, move timing, scripts

/// Re-export frame types.
pub mod frame {
    pub use headlink_frame::*;
}

/// Re-export message types.
pub mod itmp {
    pub use headlink_itmp::*;
}

/// Re-export transport types.
pub mod transport {
    pub use headlink_transport::*;
}

/// Re-export device types.
pub mod device {
    pub use headlink_device::*;
}

use headlink_device::{ControllerConfig, DeviceController, Result};
use headlink_transport::{SerialConfig, SerialTransport};

/// Open `path` and wrap it in a controller.
///
/// Blocks for the configured settle delay while the device boots.
pub fn connect(
    path: &str,
    serial: &SerialConfig,
    controller: ControllerConfig,
) -> Result<DeviceController<SerialTransport>> {
    let link = SerialTransport::open(path, serial)?;
    Ok(DeviceController::with_config(link, controller))
}

