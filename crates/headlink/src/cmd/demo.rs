use headlink_device::controller::{PROC_ENABLE, PROC_MOTOR_GO};
use headlink_device::{Step, StepOutcome};
use headlink_itmp::Value;
use tracing::info;

use crate::cmd::DeviceArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_steps, OutputFormat};

/// `(target, velocity, acceleration)` moves run after enabling the head.
pub const DEMO_MOVES: [(i64, i64, i64); 6] = [
    (1000, 700, 0),
    (800, 2000, 0),
    (1000, 2000, 0),
    (800, 2000, 0),
    (1000, 2000, 0),
    (0, 2000, 0),
];

pub fn run(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let mut controller = args.connect()?;
    let mut outcomes = Vec::with_capacity(DEMO_MOVES.len() + 1);

    let reply = controller
        .enable()
        .map_err(|err| device_error("enable failed", err))?;
    outcomes.push(StepOutcome {
        index: 0,
        step: Step::Call {
            procedure: PROC_ENABLE.to_string(),
            arguments: Vec::new(),
        },
        reply: Some(reply),
    });

    for (i, &(target, velocity, accel)) in DEMO_MOVES.iter().enumerate() {
        info!(target, velocity, accel, "demo move");
        let reply = controller
            .move_motor(target, velocity, accel)
            .map_err(|err| device_error(&format!("move to {target} failed"), err))?;
        outcomes.push(StepOutcome {
            index: i + 1,
            step: Step::Call {
                procedure: PROC_MOTOR_GO.to_string(),
                arguments: vec![
                    Value::Integer(target),
                    Value::Integer(velocity),
                    Value::Integer(accel),
                ],
            },
            reply,
        });
    }

    print_steps(&outcomes, format);
    Ok(SUCCESS)
}
