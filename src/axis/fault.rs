use std::time::Duration;

use chrono::{DateTime, Utc};
use super::alerts::AlertRegister;

/// Fault-class events local to one axis. None of them stop the other axes.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisFault {
    Alert(AlertRegister),
    MoveTimeout { target: i32, elapsed: Duration },
}

impl std::fmt::Display for AxisFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisFault::Alert(reg) => write!(f, "alerts present: {}", reg),
            AxisFault::MoveTimeout { target, elapsed } => write!(
                f,
                "move to {} timed out after {} ms",
                target,
                elapsed.as_millis()
            ),
        }
    }
}

impl std::error::Error for AxisFault {}

/// Most recent fault of an axis, stamped with wall-clock time for the
/// status log.
#[derive(Debug, Clone)]
pub struct FaultEvent {
    pub fault: AxisFault,
    pub at: DateTime<Utc>,
}

impl FaultEvent {
    pub fn new(fault: AxisFault) -> Self {
        Self {
            fault,
            at: Utc::now(),
        }
    }
}

impl std::fmt::Display for FaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.fault, self.at.format("%Y-%m-%d %H:%M:%S%.3f UTC"))
    }
}
