//! Single fixed-procedure commands.

use headlink_device::controller::{PROC_ADC, PROC_ENABLE, PROC_MOTOR_POSITION};
use headlink_device::DeviceController;
use headlink_itmp::Value;
use headlink_transport::SerialTransport;

use crate::cmd::DeviceArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

type Rpc = fn(&mut DeviceController<SerialTransport>) -> headlink_device::Result<Vec<Value>>;

fn invoke(args: DeviceArgs, procedure: &str, rpc: Rpc, format: OutputFormat) -> CliResult<i32> {
    let mut controller = args.connect()?;
    let result =
        rpc(&mut controller).map_err(|err| device_error(&format!("{procedure} failed"), err))?;
    print_reply(procedure, &result, format);
    Ok(SUCCESS)
}

pub fn enable(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    invoke(args, PROC_ENABLE, DeviceController::enable, format)
}

pub fn position(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    invoke(
        args,
        PROC_MOTOR_POSITION,
        DeviceController::read_motor_position,
        format,
    )
}

pub fn adc(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    invoke(args, PROC_ADC, DeviceController::read_adc, format)
}
