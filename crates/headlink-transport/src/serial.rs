use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::link::SerialLink;

/// A link over a real serial device.
pub type SerialTransport = SerialLink<Box<dyn SerialPort>>;

impl SerialTransport {
    /// Open and configure a serial device for the head protocol.
    ///
    /// The port is set to 8N1 with RTS and DTR asserted. Single-byte reads
    /// return after at most `poll_interval`, so the frame read loop can apply
    /// its own overall timeout. The call blocks for `settle_delay` before
    /// returning so the controller has finished booting.
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self> {
        let mut port = serialport::new(path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.poll_interval)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.to_string(),
                source,
            })?;

        let configure = |source| TransportError::Configure {
            path: path.to_string(),
            source,
        };
        port.write_request_to_send(true).map_err(configure)?;
        port.write_data_terminal_ready(true).map_err(configure)?;

        info!(path, baud = config.baud_rate, "opened serial port");

        if !config.settle_delay.is_zero() {
            debug!(path, delay = ?config.settle_delay, "waiting for device to settle");
            std::thread::sleep(config.settle_delay);
        }

        Ok(SerialLink::with_name(port, path))
    }
}

/// A serial port found on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// `usb`, `pci`, `bluetooth` or `unknown`.
    pub kind: &'static str,
    pub description: Option<String>,
    pub serial_number: Option<String>,
}

/// Enumerate serial ports.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, description, serial_number) = match port.port_type {
                SerialPortType::UsbPort(usb) => {
                    let description = usb.product.or(usb.manufacturer).or_else(|| {
                        Some(format!("{:04x}:{:04x}", usb.vid, usb.pid))
                    });
                    ("usb", description, usb.serial_number)
                }
                SerialPortType::PciPort => ("pci", None, None),
                SerialPortType::BluetoothPort => ("bluetooth", None, None),
                SerialPortType::Unknown => ("unknown", None, None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                description,
                serial_number,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_is_connection_error() {
        let config = SerialConfig {
            settle_delay: std::time::Duration::ZERO,
            ..SerialConfig::default()
        };
        let err = SerialTransport::open("/dev/headlink-does-not-exist", &config).unwrap_err();
        match err {
            TransportError::Open { path, .. } => assert_eq!(path, "/dev/headlink-does-not-exist"),
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
