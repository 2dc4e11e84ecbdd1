use headlink_device::Script;

use crate::cmd::RunArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_steps, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    // Parse before opening the port so a bad script costs no settle delay.
    let script = Script::load(&args.script).map_err(|err| {
        device_error(&format!("failed to load {}", args.script.display()), err)
    })?;

    let mut controller = args.device.connect()?;
    let outcomes = script
        .run(&mut controller)
        .map_err(|err| device_error("script failed", err))?;
    print_steps(&outcomes, format);
    Ok(SUCCESS)
}
