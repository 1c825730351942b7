use super::phase::PHASE_COUNT;
use crate::axis::{parameters::Setpoint, AXES_PER_BOARD};

const fn sp(velocity: i32, acceleration: i32, position: i32) -> Setpoint {
    Setpoint::new(velocity, acceleration, position)
}

/// Unscaled per-phase setpoints, one row per board-local servo.
pub const BASE_SETPOINTS: [[Setpoint; PHASE_COUNT]; AXES_PER_BOARD] = [
    // Primary rotation
    [
        sp(10, 8000, 2000),
        sp(10, 8000, 2000),
        sp(10, 8000, 1500),
        sp(10, 8000, 1000),
        sp(10, 8000, 500),
        sp(10, 8000, 0),
        sp(100, 8000, 500),
        sp(100, 8000, 1000),
        sp(100, 8000, 2000),
        sp(100, 8000, 2500),
        sp(100, 8000, 4000),
    ],
    // Secondary rotation
    [
        sp(12, 8000, 2000),
        sp(12, 8000, 2000),
        sp(12, 8000, 2000),
        sp(12, 8000, 2000),
        sp(12, 8000, 0),
        sp(12, 8000, 0),
        sp(102, 8000, 0),
        sp(102, 8000, 500),
        sp(102, 8000, 2000),
        sp(102, 8000, 3000),
        sp(102, 8000, 4000),
    ],
    // Tertiary lift
    [
        sp(1003, 8000, 0),
        sp(2003, 8000, 900),
        sp(2003, 8000, 800),
        sp(2003, 8000, 700),
        sp(2003, 8000, 600),
        sp(2003, 8000, 500),
        sp(2003, 8000, 600),
        sp(2003, 8000, 700),
        sp(2003, 8000, 800),
        sp(2003, 8000, 900),
        sp(2003, 8000, 1000),
    ],
    // Tertiary rotation
    [
        sp(500, 2000, 0),
        sp(500, 5000, 400),
        sp(500, 5000, 400),
        sp(500, 5000, 270),
        sp(500, 5000, 125),
        sp(500, 5000, 0),
        sp(500, 5000, 300),
        sp(500, 5000, 356),
        sp(500, 5000, 390),
        sp(500, 5000, 415),
        sp(500, 5000, 623),
    ],
];

/// Base setpoint of `servo` (1-based) in `step`; `None` when either is out of range.
pub fn base_setpoint(servo: usize, step: i32) -> Option<Setpoint> {
    let step = usize::try_from(step).ok()?;
    BASE_SETPOINTS
        .get(servo.checked_sub(1)?)
        .and_then(|row| row.get(step))
        .copied()
}
