use headlink_device::move_duration;

use crate::cmd::MoveArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_move, OutputFormat};

pub fn run(args: MoveArgs, format: OutputFormat) -> CliResult<i32> {
    let mut controller = args.device.connect()?;

    match args.from {
        Some(position) => controller.set_current_position(position),
        None => {
            controller
                .refresh_position()
                .map_err(|err| device_error("position query failed", err))?;
        }
    }

    let start = controller.current_position();
    let travel = move_duration(
        args.target.abs_diff(start),
        args.velocity.max(0).unsigned_abs(),
        args.accel.max(0).unsigned_abs(),
    );

    let result = controller
        .move_motor(args.target, args.velocity, args.accel)
        .map_err(|err| device_error("move failed", err))?;

    print_move(
        args.target,
        controller.current_position(),
        travel,
        result.as_deref(),
        format,
    );
    Ok(SUCCESS)
}
