use std::time::Instant;

use tracing::debug;

use super::{alerts::AlertRegister, MotorAxis};

#[derive(Debug, Clone, Copy)]
struct SimulatedMove {
    from: i32,
    to: i32,
    velocity: i32,
    started: Instant,
}

impl SimulatedMove {
    fn position_at(&self, now: Instant) -> i32 {
        let travelled = now.duration_since(self.started).as_secs_f64() * self.velocity as f64;
        let (from, to) = (i64::from(self.from), i64::from(self.to));
        let step = travelled.min((to - from).abs() as f64) as i64;
        let position = if to >= from { from + step } else { from - step };
        // Stays between from and to, both of which are i32.
        position as i32
    }
}

/// Constant-velocity stand-in for a servo connector, used when the controller
/// runs without drive hardware.
#[derive(Debug)]
pub struct SimulatedAxis {
    name: String,
    enable_input: bool,
    enable_requested: bool,
    velocity_max: i32,
    acceleration_max: i32,
    position: i32,
    active_move: Option<SimulatedMove>,
    alerts: AlertRegister,
}

impl SimulatedAxis {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enable_input: true,
            enable_requested: false,
            velocity_max: 0,
            acceleration_max: 0,
            position: 0,
            active_move: None,
            alerts: AlertRegister::clear(),
        }
    }

    fn current_position(&self) -> i32 {
        self.active_move
            .map_or(self.position, |m| m.position_at(Instant::now()))
    }

    fn in_motion(&self) -> bool {
        self.active_move
            .is_some_and(|m| m.position_at(Instant::now()) != m.to)
    }
}

impl MotorAxis for SimulatedAxis {
    fn enable_input(&self) -> bool {
        self.enable_input
    }

    fn enable_requested(&self) -> bool {
        self.enable_requested
    }

    fn set_enable_request(&mut self, enabled: bool) {
        self.enable_requested = enabled;
    }

    fn set_velocity_max(&mut self, velocity: i32) {
        self.velocity_max = velocity;
    }

    fn set_acceleration_max(&mut self, acceleration: i32) {
        self.acceleration_max = acceleration;
    }

    fn move_absolute(&mut self, position: i32) {
        let from = self.current_position();
        debug!(
            "{}: moving {} -> {} at {} steps/s (accel {})",
            self.name, from, position, self.velocity_max, self.acceleration_max
        );
        self.position = from;
        self.active_move = Some(SimulatedMove {
            from,
            to: position,
            velocity: self.velocity_max,
            started: Instant::now(),
        });
    }

    fn steps_complete(&self) -> bool {
        !self.in_motion()
    }

    fn hlfb_asserted(&self) -> bool {
        self.enable_requested && !self.in_motion()
    }

    fn velocity_commanded(&self) -> i32 {
        match self.active_move {
            Some(m) if self.in_motion() => {
                if m.to >= m.from {
                    m.velocity
                } else {
                    -m.velocity
                }
            }
            _ => 0,
        }
    }

    fn position_commanded(&self) -> i32 {
        self.current_position()
    }

    fn set_position_reference(&mut self, position: i32) {
        self.active_move = None;
        self.position = position;
    }

    fn alerts(&self) -> AlertRegister {
        self.alerts
    }

    fn clear_alerts(&mut self) {
        self.alerts = AlertRegister::clear();
    }
}
