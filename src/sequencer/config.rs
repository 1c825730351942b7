use serde::{Deserialize, Serialize};

use super::phase::TargetKind;

/// Absolute move targets of one tracked axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackTargets {
    pub address: i32,
    pub top_of_swing: i32,
    pub finish: i32,
    /// Velocity setpoint held while waiting in the idle phase.
    pub hold_velocity: i32,
}

impl Default for TrackTargets {
    fn default() -> Self {
        Self {
            address: 2000,
            top_of_swing: 0,
            finish: 4000,
            hold_velocity: 500,
        }
    }
}

impl TrackTargets {
    pub fn target(&self, kind: TargetKind) -> i32 {
        match kind {
            TargetKind::Address => self.address,
            TargetKind::TopOfSwing => self.top_of_swing,
            TargetKind::Finish => self.finish,
        }
    }
}

/// Servos 1 and 2 perform the swing; servos 3 and 4 only receive setpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    pub primary: TrackTargets,
    pub secondary: TrackTargets,
}
