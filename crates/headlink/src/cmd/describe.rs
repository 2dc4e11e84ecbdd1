use headlink_itmp::parse_capabilities;

use crate::cmd::DescribeArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_capabilities, OutputFormat};

pub fn run(args: DescribeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut controller = args.device.connect()?;
    let description = controller
        .describe(&args.topic)
        .map_err(|err| device_error("describe failed", err))?;
    print_capabilities(&parse_capabilities(&description), format);
    Ok(SUCCESS)
}
