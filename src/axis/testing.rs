use std::sync::{Arc, Mutex};

use super::{alerts::AlertRegister, MotorAxis};

/// Observable hardware state behind a [`FakeAxis`].
#[derive(Debug, Clone)]
pub struct FakeAxisState {
    pub enable_input: bool,
    pub enable_requested: bool,
    pub velocity_max: i32,
    pub acceleration_max: i32,
    pub moves: Vec<i32>,
    pub steps_complete: bool,
    pub hlfb_asserted: bool,
    pub velocity: i32,
    pub position: i32,
    pub alerts: AlertRegister,
    pub alerts_cleared: usize,
    pub enable_writes: Vec<bool>,
}

impl Default for FakeAxisState {
    fn default() -> Self {
        Self {
            enable_input: true,
            enable_requested: true,
            velocity_max: 0,
            acceleration_max: 0,
            moves: Vec::new(),
            steps_complete: true,
            hlfb_asserted: true,
            velocity: 0,
            position: 0,
            alerts: AlertRegister::clear(),
            alerts_cleared: 0,
            enable_writes: Vec::new(),
        }
    }
}

/// Scripted hardware double. Clones share state, so a test keeps one handle
/// while the controller owns the other.
#[derive(Debug, Clone, Default)]
pub struct FakeAxis {
    state: Arc<Mutex<FakeAxisState>>,
}

impl FakeAxis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeAxisState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn snapshot(&self) -> FakeAxisState {
        self.with(|s| s.clone())
    }

    /// Report the last commanded move as finished at its target.
    pub fn finish_move(&self) {
        self.with(|s| {
            if let Some(target) = s.moves.last() {
                s.position = *target;
            }
            s.steps_complete = true;
            s.hlfb_asserted = true;
        });
    }
}

impl MotorAxis for FakeAxis {
    fn enable_input(&self) -> bool {
        self.with(|s| s.enable_input)
    }

    fn enable_requested(&self) -> bool {
        self.with(|s| s.enable_requested)
    }

    fn set_enable_request(&mut self, enabled: bool) {
        self.with(|s| {
            s.enable_requested = enabled;
            s.enable_writes.push(enabled);
        })
    }

    fn set_velocity_max(&mut self, velocity: i32) {
        self.with(|s| s.velocity_max = velocity)
    }

    fn set_acceleration_max(&mut self, acceleration: i32) {
        self.with(|s| s.acceleration_max = acceleration)
    }

    fn move_absolute(&mut self, position: i32) {
        self.with(|s| {
            s.moves.push(position);
            s.steps_complete = false;
            s.hlfb_asserted = false;
        })
    }

    fn steps_complete(&self) -> bool {
        self.with(|s| s.steps_complete)
    }

    fn hlfb_asserted(&self) -> bool {
        self.with(|s| s.hlfb_asserted)
    }

    fn velocity_commanded(&self) -> i32 {
        self.with(|s| s.velocity)
    }

    fn position_commanded(&self) -> i32 {
        self.with(|s| s.position)
    }

    fn set_position_reference(&mut self, position: i32) {
        self.with(|s| s.position = position)
    }

    fn alerts(&self) -> AlertRegister {
        self.with(|s| s.alerts)
    }

    fn clear_alerts(&mut self) {
        self.with(|s| {
            s.alerts = AlertRegister::clear();
            s.alerts_cleared += 1;
        })
    }
}
