use crate::cmd::{parse_arguments, CallArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let arguments = parse_arguments(&args.args)?;
    let mut controller = args.device.connect()?;

    if args.check {
        controller
            .ensure_procedure(&args.procedure)
            .map_err(|err| device_error("capability check failed", err))?;
    }

    let result = controller
        .call(&args.procedure, arguments)
        .map_err(|err| device_error(&format!("{} failed", args.procedure), err))?;
    print_reply(&args.procedure, &result, format);
    Ok(SUCCESS)
}
