//! Move timing for the stepper axis.
//!
//! The firmware drives `mot1/go` with a symmetric trapezoidal velocity
//! profile: accelerate at `a` up to `v`, cruise, decelerate at `a`. Short
//! moves never reach `v` and become triangular.

use std::time::Duration;

/// Time for a move of `delta` steps at `max_velocity` steps/s with
/// `acceleration` steps/s². An acceleration of zero means the axis jumps
/// straight to `max_velocity`.
///
/// A zero `delta` takes no time. A zero `max_velocity` never finishes and
/// yields [`Duration::MAX`].
pub fn move_duration(delta: u64, max_velocity: u64, acceleration: u64) -> Duration {
    if delta == 0 {
        return Duration::ZERO;
    }
    if max_velocity == 0 {
        return Duration::MAX;
    }

    let d = delta as f64;
    let v = max_velocity as f64;
    let secs = if acceleration == 0 {
        d / v
    } else {
        let a = acceleration as f64;
        // Distance spent ramping up to v and back down to zero.
        let ramps = v * v / a;
        if d <= ramps {
            2.0 * (d / a).sqrt()
        } else {
            2.0 * v / a + (d - ramps) / v
        }
    };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
