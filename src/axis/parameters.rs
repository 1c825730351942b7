use serde::{Deserialize, Serialize};

/// Velocity / acceleration / position triple, in steps, steps/s and steps/s².
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setpoint {
    pub velocity: i32,
    pub acceleration: i32,
    pub position: i32,
}

impl Setpoint {
    pub const fn new(velocity: i32, acceleration: i32, position: i32) -> Self {
        Self {
            velocity,
            acceleration,
            position,
        }
    }

    pub fn with_velocity(mut self, velocity: i32) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Safety ceilings, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub velocity: i32,
    pub acceleration: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            velocity: 1000,
            acceleration: 100_000,
        }
    }
}

impl Limits {
    pub fn clamp_velocity(&self, velocity: i32) -> i32 {
        velocity.clamp(0, self.velocity)
    }

    pub fn clamp_acceleration(&self, acceleration: i32) -> i32 {
        acceleration.clamp(1, self.acceleration)
    }
}

/// Per-axis scale factors applied to the sequencer's base setpoint tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub kv: f32,
    pub ka: f32,
    pub kp: f32,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            kv: 1.0,
            ka: 1.0,
            kp: 1.0,
        }
    }
}

impl Gains {
    pub fn scale(&self, base: Setpoint) -> Setpoint {
        Setpoint {
            velocity: (base.velocity as f32 * self.kv) as i32,
            acceleration: (base.acceleration as f32 * self.ka) as i32,
            position: (base.position as f32 * self.kp) as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    pub limits: Limits,
    pub setpoint: Setpoint,
    pub gains: Gains,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            setpoint: Setpoint::new(250, 2000, 0),
            gains: Gains::default(),
        }
    }
}

impl AxisConfig {
    /// Power-on configuration of board-local servo `servo` (1..=4).
    pub fn for_servo(servo: usize) -> Self {
        let base = Self::default();
        match servo {
            1 | 2 => Self {
                gains: Gains {
                    kv: 100.0,
                    ..Gains::default()
                },
                ..base
            },
            4 => Self {
                setpoint: Setpoint::new(500, 250, 0),
                ..base
            },
            _ => base,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    UnknownServo(usize),
    VelocityOutOfRange { value: i32, limit: i32 },
    AccelerationOutOfRange { value: i32, limit: i32 },
}

impl std::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterError::UnknownServo(servo) => write!(f, "unknown servo: {}", servo),
            ParameterError::VelocityOutOfRange { value, limit } => {
                write!(f, "velocity {} outside 0..={}", value, limit)
            }
            ParameterError::AccelerationOutOfRange { value, limit } => {
                write!(f, "acceleration {} outside 1..={}", value, limit)
            }
        }
    }
}

impl std::error::Error for ParameterError {}

pub fn validate_parameters(limits: &Limits, setpoint: &Setpoint) -> Result<(), ParameterError> {
    if !(0..=limits.velocity).contains(&setpoint.velocity) {
        return Err(ParameterError::VelocityOutOfRange {
            value: setpoint.velocity,
            limit: limits.velocity,
        });
    }
    if !(1..=limits.acceleration).contains(&setpoint.acceleration) {
        return Err(ParameterError::AccelerationOutOfRange {
            value: setpoint.acceleration,
            limit: limits.acceleration,
        });
    }
    Ok(())
}
