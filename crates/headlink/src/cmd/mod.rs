use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use headlink_device::{ControllerConfig, DeviceController, DEFAULT_ADDRESS};
use headlink_itmp::Value;
use headlink_transport::{SerialConfig, SerialTransport, DEFAULT_BAUD_RATE};
use tracing::info;

use crate::exit::{device_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod call;
pub mod codec;
pub mod demo;
pub mod describe;
pub mod motion;
pub mod ports;
pub mod rpc;
pub mod script;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports.
    Ports,
    /// Print the device capability listing.
    Describe(DescribeArgs),
    /// Call a procedure and print its result.
    Call(CallArgs),
    /// Enable the head.
    Enable(DeviceArgs),
    /// Read the motor position.
    Position(DeviceArgs),
    /// Read the ADC channels.
    Adc(DeviceArgs),
    /// Move the motor and wait for it to arrive.
    Move(MoveArgs),
    /// Run a JSON script.
    Run(RunArgs),
    /// Run the built-in motion demo.
    Demo(DeviceArgs),
    /// Encode a request frame without sending it.
    Encode(EncodeArgs),
    /// Decode a frame given as hex.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports => ports::run(format),
        Command::Describe(args) => describe::run(args, format),
        Command::Call(args) => call::run(args, format),
        Command::Enable(args) => rpc::enable(args, format),
        Command::Position(args) => rpc::position(args, format),
        Command::Adc(args) => rpc::adc(args, format),
        Command::Move(args) => motion::run(args, format),
        Command::Run(args) => script::run(args, format),
        Command::Demo(args) => demo::run(args, format),
        Command::Encode(args) => codec::encode(args, format),
        Command::Decode(args) => codec::decode(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Connection options shared by every command that talks to the device.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, short = 'p', env = "HEADLINK_PORT")]
    pub port: String,
    /// Line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Device address byte.
    #[arg(long, default_value_t = DEFAULT_ADDRESS)]
    pub addr: u8,
    /// Reply timeout (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    /// Wait after opening the port before the first request.
    #[arg(long, default_value = "2s")]
    pub settle: String,
}

impl DeviceArgs {
    /// Open the port and build a controller from these options.
    pub fn connect(&self) -> CliResult<DeviceController<SerialTransport>> {
        let serial = SerialConfig {
            baud_rate: self.baud,
            settle_delay: parse_duration_allow_zero(&self.settle)?,
            ..SerialConfig::default()
        };
        let controller = ControllerConfig {
            address: self.addr,
            response_timeout: parse_duration(&self.timeout)?,
            ..ControllerConfig::default()
        };
        info!(port = %self.port, baud = self.baud, addr = self.addr, "connecting");
        headlink::connect(&self.port, &serial, controller)
            .map_err(|err| device_error(&format!("failed to open {}", self.port), err))
    }
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Topic to describe. Empty lists everything.
    #[arg(long, default_value = "")]
    pub topic: String,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Procedure path (e.g. mot1/pos).
    pub procedure: String,
    /// Arguments as a JSON array (e.g. '[1000, 700, 0]').
    #[arg(long, default_value = "[]")]
    pub args: String,
    /// Check the device capability listing before calling.
    #[arg(long)]
    pub check: bool,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Target position in steps.
    #[arg(long, allow_hyphen_values = true)]
    pub target: i64,
    /// Maximum velocity in steps/s.
    #[arg(long)]
    pub velocity: i64,
    /// Acceleration in steps/s². 0 jumps straight to velocity.
    #[arg(long, default_value_t = 0)]
    pub accel: i64,
    /// Assume the motor is here instead of asking the device.
    #[arg(long, allow_hyphen_values = true)]
    pub from: Option<i64>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Script file.
    pub script: PathBuf,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Address byte.
    #[arg(long, default_value_t = DEFAULT_ADDRESS)]
    pub addr: u8,
    /// Message id.
    #[arg(long, default_value_t = 1)]
    pub id: u64,
    /// Procedure path, or the topic with --describe.
    pub procedure: String,
    /// Arguments as a JSON array.
    #[arg(long, default_value = "[]", conflicts_with = "describe")]
    pub args: String,
    /// Encode a DESCRIBE instead of a CALL.
    #[arg(long)]
    pub describe: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex. Spaces and colons are ignored.
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `--args`: a JSON array, converted element by element.
pub fn parse_arguments(input: &str) -> CliResult<Vec<Value>> {
    let json: serde_json::Value = serde_json::from_str(input)
        .map_err(|err| CliError::usage(format!("--args is not valid JSON: {err}")))?;
    match json {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(Value::from).collect()),
        other => Err(CliError::usage(format!(
            "--args must be a JSON array, got {other}"
        ))),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let duration = parse_duration_allow_zero(input)?;
    if duration.is_zero() {
        return Err(CliError::usage("duration must be greater than zero"));
    }
    Ok(duration)
}

fn parse_duration_allow_zero(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn settle_may_be_zero() {
        assert_eq!(parse_duration_allow_zero("0ms").unwrap(), Duration::ZERO);
    }

    #[test]
    fn arguments_must_be_an_array() {
        assert_eq!(
            parse_arguments("[1000, -3, \"x\"]").unwrap(),
            vec![Value::Integer(1000), Value::Integer(-3), Value::from("x")]
        );
        assert_eq!(parse_arguments("[]").unwrap(), vec![]);
        assert!(parse_arguments("{\"a\": 1}").is_err());
        assert!(parse_arguments("not json").is_err());
    }
}
