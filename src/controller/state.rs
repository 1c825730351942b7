use serde::{Deserialize, Serialize};

use crate::{
    axis::{move_machine::MoveMachine, store::ParameterStore, AXES_PER_BOARD},
    protocol::telemetry::ButtonStates,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Manual,
    Automatic,
}

/// Operator buttons of one servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorFlags {
    /// B1: gates whether the sequencer issues moves to this servo.
    pub enabled: bool,
    /// B2: run/stop. Toggled and published only; no motion path consults it.
    pub run: bool,
}

impl Default for OperatorFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            run: false,
        }
    }
}

/// Everything the control loop mutates, owned by the control task.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub mode: Mode,
    pub repeat: bool,
    pub start: bool,
    pub operators: [OperatorFlags; AXES_PER_BOARD],
    pub store: ParameterStore,
    pub movers: Vec<MoveMachine>,
}

impl ControllerState {
    pub fn new(store: ParameterStore, movers: Vec<MoveMachine>) -> Self {
        Self {
            mode: Mode::Manual,
            repeat: false,
            start: false,
            operators: [OperatorFlags::default(); AXES_PER_BOARD],
            store,
            movers,
        }
    }

    pub fn button_states(&self) -> ButtonStates {
        ButtonStates {
            automatic: self.mode == Mode::Automatic,
            repeat: self.repeat,
            start: self.start,
            servos: self.operators.map(|op| (op.enabled, op.run)),
        }
    }
}
